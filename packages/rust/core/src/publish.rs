//! Publication of completed items.
//!
//! Feeds the completed slice of a run through the chunked dispatcher. Each
//! item publishes independently; a failure is recorded in its slot and the
//! batch keeps going.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;

use contentforge_adapters::{PublishOutcome, PublishRequest, Publisher};
use contentforge_dispatch::{DispatchReport, Outcome, dispatch};
use contentforge_shared::{PublishMode, ScheduleEntry, WorkItem};

use crate::progress::ProgressReporter;

/// Knobs for the publication phase.
#[derive(Debug, Clone)]
pub struct PublishSettings {
    /// Visibility mode for items without a schedule entry.
    pub mode: PublishMode,
    /// Items published concurrently per chunk.
    pub chunk_size: usize,
    /// Delay between consecutive chunks.
    pub inter_chunk_delay: Duration,
}

impl Default for PublishSettings {
    fn default() -> Self {
        Self {
            mode: PublishMode::Draft,
            chunk_size: 10,
            inter_chunk_delay: Duration::from_secs(1),
        }
    }
}

/// Publish every completed item, in queue order.
///
/// When a schedule is supplied its entries apply positionally to the
/// completed items: an immediate entry publishes the item as visible right
/// away, a day entry publishes it hidden with a future visibility instant.
/// Without a schedule every item uses the settings' mode.
pub async fn publish_completed(
    items: &[WorkItem],
    schedule: Option<&[ScheduleEntry]>,
    publisher: Arc<dyn Publisher>,
    settings: &PublishSettings,
    progress: &dyn ProgressReporter,
) -> DispatchReport {
    progress.phase("publishing");

    let completed: Vec<&WorkItem> = items
        .iter()
        .filter(|i| i.status == contentforge_shared::ItemStatus::Completed)
        .collect();

    let mut ops = Vec::with_capacity(completed.len());
    for (position, item) in completed.iter().enumerate() {
        let entry = schedule.and_then(|s| s.get(position)).copied();
        let request = build_request(item, entry, settings.mode);
        let publisher = Arc::clone(&publisher);
        ops.push(move || async move {
            match publisher.publish(&request).await {
                PublishOutcome::Created { resource_id } => {
                    tracing::debug!(%resource_id, "published");
                    Outcome::Success
                }
                PublishOutcome::AlreadySatisfied => Outcome::AlreadySatisfied,
                PublishOutcome::Failed { message } => Outcome::Failure(message),
            }
        });
    }

    let report = dispatch(ops, settings.chunk_size, settings.inter_chunk_delay).await;
    tracing::info!(
        published = report.success_count(),
        already = report.already_count(),
        failed = report.failure_count(),
        "publication finished"
    );
    report
}

fn build_request(
    item: &WorkItem,
    entry: Option<ScheduleEntry>,
    fallback_mode: PublishMode,
) -> PublishRequest {
    let result = item.result.clone().unwrap_or_default();
    let body_html = result.body_html.unwrap_or_default();
    let title = result.title.unwrap_or_else(|| item.subject.clone());

    let (mode, scheduled_at) = match entry {
        Some(entry) if entry.immediate => (PublishMode::Active, None),
        Some(entry) => (PublishMode::Scheduled, Some(entry.publish_at)),
        None => (fallback_mode, None),
    };

    PublishRequest {
        title,
        summary_html: Some(extract_first_paragraph(&body_html)),
        body_html,
        handle: None,
        tags: vec![item.group_id.clone()],
        mode,
        scheduled_at,
    }
}

static PARAGRAPH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<p[^>]*>(.*?)</p>").expect("paragraph pattern"));
static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));

/// Pull a plain-text summary out of generated body HTML.
///
/// Uses the first paragraph when one exists, otherwise the first 200
/// characters of the stripped text.
pub fn extract_first_paragraph(html: &str) -> String {
    let text = match PARAGRAPH.captures(html) {
        Some(caps) => TAG.replace_all(&caps[1], " ").into_owned(),
        None => {
            let stripped = TAG.replace_all(html, " ");
            let collapsed = collapse_whitespace(&stripped);
            return if collapsed.chars().count() > 200 {
                let head: String = collapsed.chars().take(200).collect();
                format!("{}...", head.trim_end())
            } else {
                collapsed
            };
        }
    };
    collapse_whitespace(&text)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
