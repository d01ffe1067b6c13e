//! Application configuration for ContentForge.
//!
//! User config lives at `~/.contentforge/contentforge.toml`.
//! Caller-supplied values override config file values, which override defaults.
//! Credentials are never stored in the file; each section names the env var
//! that holds the secret.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ContentForgeError, Result};
use crate::types::{ContentScope, PriceRule};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "contentforge.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".contentforge";

// ---------------------------------------------------------------------------
// Config structs (matching contentforge.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global run defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Generation service settings.
    #[serde(default)]
    pub generator: GeneratorConfig,

    /// Storefront platform settings.
    #[serde(default)]
    pub platform: PlatformConfig,

    /// Schedule distribution defaults.
    #[serde(default)]
    pub schedule: ScheduleDefaults,

    /// Price tier table.
    #[serde(default)]
    pub pricing: PricingConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Target locale for generated content.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Which content fields a run produces.
    #[serde(default)]
    pub scope: ContentScope,

    /// Maximum generation attempts per item.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between attempts, in seconds.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            scope: ContentScope::default(),
            max_attempts: default_max_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
        }
    }
}

fn default_locale() -> String {
    "en".into()
}
fn default_max_attempts() -> u32 {
    3
}
fn default_retry_delay_secs() -> u64 {
    3
}

/// `[generator]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_generator_key_env")]
    pub api_key_env: String,

    /// Generation service endpoint.
    #[serde(default = "default_generator_endpoint")]
    pub endpoint: String,

    /// Model identifier sent with each request.
    #[serde(default = "default_model")]
    pub model: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_generator_key_env(),
            endpoint: default_generator_endpoint(),
            model: default_model(),
        }
    }
}

fn default_generator_key_env() -> String {
    "CONTENTFORGE_GENERATOR_API_KEY".into()
}
fn default_generator_endpoint() -> String {
    "https://api.contentforge.dev/v1/generate".into()
}
fn default_model() -> String {
    "sonar".into()
}

/// `[platform]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Storefront shop domain (e.g., `my-shop.example.com`).
    #[serde(default)]
    pub shop_domain: String,

    /// Admin API version path segment.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Name of the env var holding the admin access token.
    #[serde(default = "default_platform_token_env")]
    pub access_token_env: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            shop_domain: String::new(),
            api_version: default_api_version(),
            access_token_env: default_platform_token_env(),
        }
    }
}

fn default_api_version() -> String {
    "2025-01".into()
}
fn default_platform_token_env() -> String {
    "CONTENTFORGE_PLATFORM_TOKEN".into()
}

/// `[schedule]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleDefaults {
    /// How many items publish immediately at the head of a run.
    #[serde(default = "default_immediate_count")]
    pub immediate_count: usize,

    /// Maximum day-scheduled items per calendar day.
    #[serde(default = "default_per_day_capacity")]
    pub per_day_capacity: usize,
}

impl Default for ScheduleDefaults {
    fn default() -> Self {
        Self {
            immediate_count: default_immediate_count(),
            per_day_capacity: default_per_day_capacity(),
        }
    }
}

fn default_immediate_count() -> usize {
    30
}
fn default_per_day_capacity() -> usize {
    10
}

/// `[pricing]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricingConfig {
    /// Target price ending pattern (ones digit + cents), e.g. `9.90`.
    #[serde(default = "default_ending_pattern")]
    pub ending_pattern: f64,

    /// Tier table. Bands need not be contiguous.
    #[serde(default = "default_price_rules")]
    pub rules: Vec<PriceRule>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            ending_pattern: default_ending_pattern(),
            rules: default_price_rules(),
        }
    }
}

fn default_ending_pattern() -> f64 {
    9.90
}

fn default_price_rules() -> Vec<PriceRule> {
    vec![
        PriceRule::new(0.0, 20.0, 4.0),
        PriceRule::new(20.0, 60.0, 2.5),
        PriceRule::new(60.0, 10_000.0, 2.0),
    ]
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.contentforge/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ContentForgeError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.contentforge/contentforge.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ContentForgeError::config(format!("failed to read {}: {e}", path.display())))?;

    toml::from_str(&content).map_err(|e| {
        ContentForgeError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)
        .map_err(|e| ContentForgeError::config(format!("failed to create {}: {e}", dir.display())))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config)
        .map_err(|e| ContentForgeError::config(e.to_string()))?;

    std::fs::write(&path, content)
        .map_err(|e| ContentForgeError::config(format!("failed to write {}: {e}", path.display())))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the credential env vars are set and non-empty.
///
/// This is the preflight that produces the only error class allowed to abort
/// a run before any item is attempted.
pub fn validate_credentials(config: &AppConfig) -> Result<()> {
    for var_name in [
        &config.generator.api_key_env,
        &config.platform.access_token_env,
    ] {
        match std::env::var(var_name) {
            Ok(val) if !val.is_empty() => {}
            _ => {
                return Err(ContentForgeError::config(format!(
                    "credential not found. Set the {var_name} environment variable."
                )));
            }
        }
    }
    Ok(())
}
