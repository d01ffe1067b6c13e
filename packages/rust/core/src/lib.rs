//! ContentForge pipeline core.
//!
//! Orchestrates a catalog run end to end: link planning, two-stage content
//! generation with retries and pause support, publish-time scheduling, and
//! chunked publication.

pub mod executor;
pub mod pause;
pub mod pipeline;
pub mod progress;
pub mod publish;
pub mod queue;

pub use executor::{PipelineExecutor, RunSettings, RunSummary};
pub use pause::PauseToken;
pub use pipeline::{
    CatalogRunConfig, CatalogRunReport, adapters_from_config, run_catalog,
    run_catalog_from_config,
};
pub use progress::{LogProgress, ProgressReporter, SilentProgress};
pub use publish::{PublishSettings, extract_first_paragraph, publish_completed};
pub use queue::WorkQueue;
