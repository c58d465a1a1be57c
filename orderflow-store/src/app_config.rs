use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
}

fn default_max_connections() -> u32 { 5 }
fn default_acquire_timeout() -> u64 { 3 }

/// Which price a persisted order carries.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PricingPolicy {
    /// Trust the unit price sent with the cart line.
    #[default]
    CartSupplied,
    /// Use the catalog's price at validation time.
    Catalog,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WorkflowConfig {
    /// Upper bound for any single collaborator call
    #[serde(default = "default_call_timeout")]
    pub call_timeout_ms: u64,
    #[serde(default)]
    pub pricing_policy: PricingPolicy,
    #[serde(default)]
    pub retry: RetrySettings,
}

fn default_call_timeout() -> u64 { 5_000 }

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: default_call_timeout(),
            pricing_policy: PricingPolicy::default(),
            retry: RetrySettings::default(),
        }
    }
}

/// Backoff for idempotent reads. Writes are never retried.
#[derive(Debug, Deserialize, Clone)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
}

fn default_max_attempts() -> u32 { 3 }
fn default_initial_delay() -> u64 { 100 }
fn default_max_delay() -> u64 { 2_000 }
fn default_multiplier() -> f64 { 2.0 }

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay(),
            max_delay_ms: default_max_delay(),
            multiplier: default_multiplier(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Load `{dir}/default`, then `{dir}/{RUN_MODE}` and `{dir}/local` if present,
    /// then `ORDERFLOW__*` environment variables.
    pub fn load_from(dir: &str) -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name(&format!("{}/default", dir)))
            .add_source(config::File::with_name(&format!("{}/{}", dir, run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name(&format!("{}/local", dir)).required(false))
            // Eg. `ORDERFLOW__WORKFLOW__CALL_TIMEOUT_MS=2500`
            .add_source(
                config::Environment::with_prefix("ORDERFLOW")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
