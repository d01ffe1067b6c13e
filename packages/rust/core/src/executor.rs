//! The per-item generation pipeline.
//!
//! Drives each queue item through `pending -> analyzing -> generating ->
//! completed`, retrying transient failures with a fixed delay and a bounded
//! attempt budget. A retry restarts the item from the analysis stage. Failed
//! items land in the error state with the reason recorded; the run itself
//! never aborts on a per-item failure.

use std::sync::Arc;
use std::time::Duration;

use contentforge_adapters::{GenerationError, GenerationRequest, Generator, Stage};
use contentforge_linking::LinkPlan;
use contentforge_shared::config::DefaultsConfig;
use contentforge_shared::{
    ContentForgeError, ContentScope, CostMetrics, GeneratedContent, ItemStatus, Result, WorkItem,
};

use crate::pause::PauseToken;
use crate::progress::ProgressReporter;
use crate::queue::WorkQueue;

/// Knobs for one run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Which content fields the run produces.
    pub scope: ContentScope,
    /// Maximum attempts per item, counting the first.
    pub max_attempts: u32,
    /// Fixed delay before a retry.
    pub retry_delay: Duration,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            scope: ContentScope::default(),
            max_attempts: 3,
            retry_delay: Duration::from_secs(3),
        }
    }
}

impl RunSettings {
    /// Derive run settings from the `[defaults]` config section.
    pub fn from_config(defaults: &DefaultsConfig) -> Self {
        Self {
            scope: defaults.scope,
            max_attempts: defaults.max_attempts.max(1),
            retry_delay: Duration::from_secs(defaults.retry_delay_secs),
        }
    }
}

/// Aggregate result of a run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub completed: usize,
    pub failed: usize,
    pub totals: CostMetrics,
    pub elapsed: Duration,
}

/// Drives generation over a [`WorkQueue`].
pub struct PipelineExecutor {
    generator: Arc<dyn Generator>,
    settings: RunSettings,
}

/// Terminal result of one item's attempt budget.
enum ItemOutcome {
    Completed(GeneratedContent),
    Failed(String),
}

impl PipelineExecutor {
    pub fn new(generator: Arc<dyn Generator>, settings: RunSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    /// Run every pending item in the queue to a terminal state.
    ///
    /// `plans` must line up one-to-one with the queue. Items already in a
    /// terminal state are skipped, so a paused-and-resumed run picks up where
    /// it left off.
    #[tracing::instrument(skip_all, fields(items = queue.len()))]
    pub async fn run(
        &self,
        queue: &mut WorkQueue,
        plans: &[LinkPlan],
        pause: &PauseToken,
        progress: &dyn ProgressReporter,
    ) -> Result<RunSummary> {
        if queue.is_empty() {
            return Err(ContentForgeError::config("run queue is empty"));
        }
        if plans.len() != queue.len() {
            return Err(ContentForgeError::config(format!(
                "link plan covers {} items but the queue holds {}",
                plans.len(),
                queue.len()
            )));
        }

        let started = std::time::Instant::now();
        let total = queue.len();
        let mut totals = CostMetrics::default();

        progress.phase("generating");

        for index in 0..total {
            if queue.items()[index].status != ItemStatus::Pending {
                continue;
            }

            pause.wait_while_paused().await;

            match self.run_item(queue, index, &plans[index], pause, progress).await? {
                ItemOutcome::Completed(content) => {
                    totals.absorb(&content.costs);
                    queue.update(index, |item| {
                        item.status = ItemStatus::Completed;
                        item.result = Some(content);
                        item.last_error = None;
                    })?;
                }
                ItemOutcome::Failed(message) => {
                    queue.update(index, |item| {
                        item.status = ItemStatus::Error;
                        item.last_error = Some(message.clone());
                    })?;
                    tracing::warn!(index, %message, "item failed");
                }
            }

            progress.item_update(&queue.items()[index], index + 1, total);
            progress.totals(&totals);
        }

        let summary = RunSummary {
            completed: queue.completed().len(),
            failed: queue.failed().len(),
            totals,
            elapsed: started.elapsed(),
        };
        tracing::info!(
            completed = summary.completed,
            failed = summary.failed,
            cost = summary.totals.total_cost(),
            "run finished"
        );
        Ok(summary)
    }

    /// Drive one item through its attempt budget.
    async fn run_item(
        &self,
        queue: &mut WorkQueue,
        index: usize,
        plan: &LinkPlan,
        pause: &PauseToken,
        progress: &dyn ProgressReporter,
    ) -> Result<ItemOutcome> {
        let total = queue.len();

        for attempt in 1..=self.settings.max_attempts {
            queue.update(index, |item| {
                item.attempts = attempt;
                item.status = ItemStatus::Analyzing;
                item.last_error = None;
            })?;
            progress.item_update(&queue.items()[index], index + 1, total);

            let item = queue.items()[index].clone();

            let analysis = match self.generator.generate(&analysis_request(&item, self.settings.scope)).await {
                Ok(output) => output,
                Err(e) => {
                    match self.handle_failure(queue, index, attempt, &e, pause).await? {
                        FailureAction::RetryAttempt => continue,
                        FailureAction::GiveUp => return Ok(ItemOutcome::Failed(e.to_string())),
                    }
                }
            };

            pause.wait_while_paused().await;
            queue.update(index, |item| item.status = ItemStatus::Generating)?;
            progress.item_update(&queue.items()[index], index + 1, total);

            let request = writing_request(&item, self.settings.scope, plan, &analysis.content);
            let writing = match self.generator.generate(&request).await {
                Ok(output) => output,
                Err(e) => {
                    match self.handle_failure(queue, index, attempt, &e, pause).await? {
                        FailureAction::RetryAttempt => continue,
                        FailureAction::GiveUp => return Ok(ItemOutcome::Failed(e.to_string())),
                    }
                }
            };

            let costs = CostMetrics {
                analysis_cost: analysis.cost,
                generation_cost: writing.cost,
                tokens_in: analysis.tokens_in + writing.tokens_in,
                tokens_out: analysis.tokens_out + writing.tokens_out,
            };

            return Ok(ItemOutcome::Completed(GeneratedContent {
                title: self
                    .settings
                    .scope
                    .wants_title()
                    .then(|| writing.title.clone())
                    .flatten(),
                body_html: self
                    .settings
                    .scope
                    .wants_description()
                    .then_some(writing.content),
                analysis: Some(analysis.content),
                costs,
            }));
        }

        // Unreachable while max_attempts >= 1; handle_failure returns GiveUp
        // on the final attempt.
        Ok(ItemOutcome::Failed("attempt budget exhausted".into()))
    }

    /// Decide whether a failed stage consumes another attempt.
    ///
    /// A retryable failure below the budget resets the item to pending and
    /// sleeps out the retry delay; anything else ends the item.
    async fn handle_failure(
        &self,
        queue: &mut WorkQueue,
        index: usize,
        attempt: u32,
        error: &GenerationError,
        pause: &PauseToken,
    ) -> Result<FailureAction> {
        if error.is_retryable() && attempt < self.settings.max_attempts {
            tracing::debug!(index, attempt, %error, "retrying after delay");
            queue.update(index, |item| {
                item.status = ItemStatus::Pending;
                item.last_error = Some(error.to_string());
            })?;
            tokio::time::sleep(self.settings.retry_delay).await;
            pause.wait_while_paused().await;
            Ok(FailureAction::RetryAttempt)
        } else {
            Ok(FailureAction::GiveUp)
        }
    }
}

enum FailureAction {
    RetryAttempt,
    GiveUp,
}

fn analysis_request(item: &WorkItem, scope: ContentScope) -> GenerationRequest {
    GenerationRequest {
        stage: Stage::Analysis,
        subject: item.subject.clone(),
        image_url: item.image_url.clone(),
        locale: item.locale.clone(),
        scope,
        link_context: None,
        analysis: None,
    }
}

fn writing_request(
    item: &WorkItem,
    scope: ContentScope,
    plan: &LinkPlan,
    analysis: &str,
) -> GenerationRequest {
    GenerationRequest {
        stage: Stage::Writing,
        subject: item.subject.clone(),
        image_url: item.image_url.clone(),
        locale: item.locale.clone(),
        scope,
        link_context: Some(plan.clone()),
        analysis: Some(analysis.to_string()),
    }
}
