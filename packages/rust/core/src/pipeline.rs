//! End-to-end catalog run: plan links, generate content, schedule, publish.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use url::Url;

use contentforge_adapters::{Generator, HttpGenerator, Publisher, StorefrontClient};
use contentforge_schedule::ScheduleOptions;
use contentforge_shared::config::{AppConfig, validate_credentials};
use contentforge_shared::{ContentForgeError, CostMetrics, Group, Result};

use crate::executor::{PipelineExecutor, RunSettings};
use crate::pause::PauseToken;
use crate::progress::ProgressReporter;
use crate::publish::{PublishSettings, publish_completed};
use crate::queue::WorkQueue;

/// Everything one catalog run needs.
#[derive(Debug, Clone)]
pub struct CatalogRunConfig {
    /// Grouped subjects to produce content for.
    pub groups: Vec<Group>,
    pub run: RunSettings,
    pub publish: PublishSettings,
    /// When present, completed items get distributed publish timestamps.
    pub schedule: Option<ScheduleOptions>,
}

/// What a catalog run produced.
#[derive(Debug, Clone, Default)]
pub struct CatalogRunReport {
    /// Items the run started with.
    pub planned: usize,
    pub completed: usize,
    pub failed: usize,
    pub published: usize,
    pub already_satisfied: usize,
    pub publish_failures: usize,
    pub costs: CostMetrics,
    pub elapsed: Duration,
}

/// Build the HTTP adapters from application config.
///
/// The credential preflight runs first: a missing env var yields the
/// configuration error that aborts a run before any item is attempted.
pub fn adapters_from_config(config: &AppConfig) -> Result<(Arc<dyn Generator>, Arc<dyn Publisher>)> {
    validate_credentials(config)?;

    let api_key = read_credential(&config.generator.api_key_env)?;
    let endpoint = Url::parse(&config.generator.endpoint)
        .map_err(|e| ContentForgeError::config(format!("invalid generator endpoint: {e}")))?;
    let generator = HttpGenerator::new(endpoint, api_key, config.generator.model.clone());

    let token = read_credential(&config.platform.access_token_env)?;
    let publisher = StorefrontClient::new(
        &config.platform.shop_domain,
        &config.platform.api_version,
        token,
    )
    .map_err(|e| {
        ContentForgeError::config(format!(
            "invalid shop domain {:?}: {e}",
            config.platform.shop_domain
        ))
    })?;

    Ok((Arc::new(generator), Arc::new(publisher)))
}

fn read_credential(var_name: &str) -> Result<String> {
    std::env::var(var_name).map_err(|_| {
        ContentForgeError::config(format!(
            "credential not found. Set the {var_name} environment variable."
        ))
    })
}

/// Run the full pipeline with adapters built from application config.
///
/// This is the config-driven entry point: credential preflight, then the
/// same phases as [`run_catalog`].
pub async fn run_catalog_from_config<R: Rng>(
    app: &AppConfig,
    config: &CatalogRunConfig,
    pause: &PauseToken,
    rng: &mut R,
    progress: &dyn ProgressReporter,
) -> Result<CatalogRunReport> {
    let (generator, publisher) = adapters_from_config(app)?;
    run_catalog(config, generator, publisher, pause, rng, progress).await
}

/// Run the full pipeline over a set of groups.
///
/// Phases run in order: link planning, generation, schedule distribution,
/// publication. Generation failures degrade the run (failed items are
/// reported, not published); only invalid inputs abort it.
#[tracing::instrument(skip_all, fields(groups = config.groups.len()))]
pub async fn run_catalog<R: Rng>(
    config: &CatalogRunConfig,
    generator: Arc<dyn Generator>,
    publisher: Arc<dyn Publisher>,
    pause: &PauseToken,
    rng: &mut R,
    progress: &dyn ProgressReporter,
) -> Result<CatalogRunReport> {
    if config.groups.is_empty() {
        return Err(ContentForgeError::config("no groups to run"));
    }

    let started = std::time::Instant::now();

    progress.phase("planning");
    let plans = contentforge_linking::plan(&config.groups);
    tracing::info!(
        fingerprint = %contentforge_linking::fingerprint(&config.groups),
        items = plans.len(),
        "link plan ready"
    );

    let mut queue = WorkQueue::from_groups(&config.groups)?;

    let executor = PipelineExecutor::new(generator, config.run.clone());
    let summary = executor.run(&mut queue, &plans, pause, progress).await?;

    let schedule = match &config.schedule {
        Some(opts) => Some(contentforge_schedule::distribute(
            queue.completed().len(),
            opts,
            rng,
        )?),
        None => None,
    };

    let report = publish_completed(
        queue.items(),
        schedule.as_deref(),
        publisher,
        &config.publish,
        progress,
    )
    .await;

    Ok(CatalogRunReport {
        planned: queue.len(),
        completed: summary.completed,
        failed: summary.failed,
        published: report.success_count(),
        already_satisfied: report.already_count(),
        publish_failures: report.failure_count(),
        costs: summary.totals,
        elapsed: started.elapsed(),
    })
}
