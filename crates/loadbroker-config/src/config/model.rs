use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::ConfigSource;

/// Offers at or below `board_rate * (1 + accept_within)` are accepted.
pub const DEFAULT_ACCEPT_WITHIN: f64 = 0.10;
/// Offers above `board_rate * (1 + negotiate_within)` are rejected outright.
pub const DEFAULT_NEGOTIATE_WITHIN: f64 = 0.30;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
/// Counter increase over board rate, indexed by attempt.
pub const DEFAULT_COUNTER_STEPS: [f64; 3] = [0.05, 0.08, 0.10];
/// Ceiling over board rate beyond which a round ends in rejection, indexed by attempt.
pub const DEFAULT_HIGH_SIDE_CAPS: [f64; 3] = [0.25, 0.18, 0.12];

pub const DEFAULT_ADVISORY_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_ADVISORY_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_ADVISORY_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ADVISORY_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_ADVISORY_MAX_TOKENS: u32 = 256;
pub const DEFAULT_ADVISORY_TIMEOUT_SECS: u64 = 8;
pub const DEFAULT_ADVISORY_BUDGET: u32 = 100;

pub const DEFAULT_REGISTRY_BASE_URL: &str =
    "https://mobile.fmcsa.dot.gov/qc/services/carriers/docket-number";
pub const DEFAULT_REGISTRY_WEBKEY_ENV: &str = "FMCSA_WEBKEY";
pub const DEFAULT_REGISTRY_TIMEOUT_SECS: u64 = 10;

/// Effective loadbroker configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub policy: PolicyConfig,
    pub advisory: AdvisoryConfig,
    pub carrier_registry: CarrierRegistryConfig,
    pub logging: LoggingConfig,
    pub loads: Vec<LoadRecord>,
    pub source_attribution: HashMap<String, ConfigSource>,
}

impl Default for Config {
    /// Built-in defaults with every known key attributed to [`ConfigSource::Default`].
    fn default() -> Self {
        let source_attribution = Self::DEFAULT_KEYS
            .iter()
            .map(|key| ((*key).to_string(), ConfigSource::Default))
            .collect();

        Self {
            policy: PolicyConfig::default(),
            advisory: AdvisoryConfig::default(),
            carrier_registry: CarrierRegistryConfig::default(),
            logging: LoggingConfig::default(),
            loads: Vec::new(),
            source_attribution,
        }
    }
}

impl Config {
    pub(crate) const DEFAULT_KEYS: &'static [&'static str] = &[
        "accept_within",
        "negotiate_within",
        "max_attempts",
        "counter_steps",
        "high_side_caps",
        "advisory_enabled",
        "advisory_base_url",
        "advisory_api_key_env",
        "advisory_model",
        "advisory_temperature",
        "advisory_max_tokens",
        "advisory_timeout_secs",
        "advisory_budget",
        "registry_base_url",
        "registry_webkey_env",
        "registry_timeout_secs",
        "verbose",
    ];

    /// Whether the advisory evaluator should be consulted.
    #[must_use]
    pub fn advisory_enabled(&self) -> bool {
        self.advisory.enabled.unwrap_or(false)
    }

    #[must_use]
    pub fn verbose(&self) -> bool {
        self.logging.verbose.unwrap_or(false)
    }
}

/// Negotiation policy thresholds.
///
/// Fractions are relative to the board rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    pub accept_within: Option<f64>,
    pub negotiate_within: Option<f64>,
    pub max_attempts: Option<u32>,
    pub counter_steps: Option<Vec<f64>>,
    pub high_side_caps: Option<Vec<f64>>,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            accept_within: Some(DEFAULT_ACCEPT_WITHIN),
            negotiate_within: Some(DEFAULT_NEGOTIATE_WITHIN),
            max_attempts: Some(DEFAULT_MAX_ATTEMPTS),
            counter_steps: Some(DEFAULT_COUNTER_STEPS.to_vec()),
            high_side_caps: Some(DEFAULT_HIGH_SIDE_CAPS.to_vec()),
        }
    }
}

/// Optional LLM-backed advisory evaluator (OpenAI-compatible chat completions).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AdvisoryConfig {
    pub enabled: Option<bool>,
    pub base_url: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Upper bound on one advisory call, after which the deterministic policy answers
    pub timeout_secs: Option<u64>,
    /// Maximum advisory calls per process
    pub budget: Option<u32>,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            enabled: Some(false),
            base_url: Some(DEFAULT_ADVISORY_BASE_URL.to_string()),
            api_key_env: Some(DEFAULT_ADVISORY_API_KEY_ENV.to_string()),
            model: Some(DEFAULT_ADVISORY_MODEL.to_string()),
            temperature: Some(DEFAULT_ADVISORY_TEMPERATURE),
            max_tokens: Some(DEFAULT_ADVISORY_MAX_TOKENS),
            timeout_secs: Some(DEFAULT_ADVISORY_TIMEOUT_SECS),
            budget: Some(DEFAULT_ADVISORY_BUDGET),
        }
    }
}

/// Carrier authority registry (FMCSA QCMobile docket-number lookup).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CarrierRegistryConfig {
    pub base_url: Option<String>,
    /// Name of the environment variable holding the web key; unset means mock mode
    pub webkey_env: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl Default for CarrierRegistryConfig {
    fn default() -> Self {
        Self {
            base_url: Some(DEFAULT_REGISTRY_BASE_URL.to_string()),
            webkey_env: Some(DEFAULT_REGISTRY_WEBKEY_ENV.to_string()),
            timeout_secs: Some(DEFAULT_REGISTRY_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub verbose: Option<bool>,
}

/// One posted load from a `[[loads]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoadRecord {
    pub load_id: String,
    pub origin: String,
    pub destination: String,
    pub pickup_datetime: NaiveDateTime,
    pub delivery_datetime: NaiveDateTime,
    pub equipment_type: String,
    /// Posted board rate in dollars
    pub loadboard_rate: f64,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub weight: Option<u32>,
    #[serde(default)]
    pub commodity_type: Option<String>,
    #[serde(default)]
    pub num_of_pieces: Option<u32>,
    #[serde(default)]
    pub miles: Option<u32>,
    #[serde(default)]
    pub dimensions: Option<String>,
}
