//! Run configuration.
//!
//! Everything a run needs is decided here, once, up front: input and
//! output locations, which scoring backend runs, and the knobs for the
//! external services. Loaded from a JSON file; tests use
//! `RunConfig::default_test()`.

use crate::registry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendChoice {
    Generative,
    Classifier,
    RuleTable,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub input_path: PathBuf,
    pub output_dir: PathBuf,
    pub backend: BackendChoice,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub generative: GenerativeConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub rule_table: RuleTableConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_base_url")]
    pub base_url: String,
    /// Falls back to the OPENCORP_API_TOKEN environment variable; with
    /// neither set, every name resolves to a stub without any network
    /// call.
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default = "default_registry_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,
    /// Delay between external lookups (rate-limit courtesy).
    #[serde(default = "default_pacing_ms")]
    pub pacing_ms: u64,
}

impl RegistryConfig {
    pub fn api_token(&self) -> Option<String> {
        self.api_token
            .clone()
            .or_else(|| std::env::var("OPENCORP_API_TOKEN").ok())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            backoff_cap: Duration::from_millis(self.backoff_cap_ms),
        }
    }

    pub fn pacing(&self) -> Duration {
        Duration::from_millis(self.pacing_ms)
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: default_registry_base_url(),
            api_token: None,
            timeout_secs: default_registry_timeout_secs(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
            pacing_ms: default_pacing_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerativeConfig {
    #[serde(default)]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_generative_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerativeConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            model: default_model(),
            temperature: default_temperature(),
            max_output_tokens: default_max_output_tokens(),
            timeout_secs: default_generative_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub model_path: PathBuf,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleTableConfig {
    /// None uses the embedded default table.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_registry_base_url() -> String {
    "https://api.opencorporates.com/v0.4".to_string()
}

fn default_registry_timeout_secs() -> u64 {
    20
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_base_ms() -> u64 {
    1_000
}

fn default_backoff_cap_ms() -> u64 {
    8_000
}

fn default_pacing_ms() -> u64 {
    200
}

fn default_model() -> String {
    "gemini-2.5-flash-lite".to_string()
}

fn default_temperature() -> f64 {
    0.2
}

fn default_max_output_tokens() -> u32 {
    256
}

fn default_generative_timeout_secs() -> u64 {
    60
}

impl RunConfig {
    /// Load from a JSON config file.
    /// In tests, use RunConfig::default_test().
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: RunConfig = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Config with hardcoded defaults for use in unit tests: rule-table
    /// backend, no network, no pacing or backoff sleeps.
    pub fn default_test() -> Self {
        Self {
            input_path: PathBuf::from("transactions.csv"),
            output_dir: PathBuf::from("out"),
            backend: BackendChoice::RuleTable,
            registry: RegistryConfig {
                api_token: None,
                backoff_base_ms: 0,
                backoff_cap_ms: 0,
                pacing_ms: 0,
                ..RegistryConfig::default()
            },
            generative: GenerativeConfig::default(),
            classifier: ClassifierConfig::default(),
            rule_table: RuleTableConfig::default(),
        }
    }
}
