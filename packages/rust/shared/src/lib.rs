//! Shared domain types, errors, and configuration for ContentForge.

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, load_config, load_config_from, validate_credentials};
pub use error::{ContentForgeError, Result};
pub use types::{
    ContentScope, CostMetrics, GeneratedContent, Group, ItemId, ItemStatus, PriceRule,
    PublishMode, ScheduleEntry, WorkItem,
};
