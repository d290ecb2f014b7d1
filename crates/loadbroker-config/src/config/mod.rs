//! Configuration management for loadbroker
//!
//! This module provides hierarchical configuration with discovery and precedence:
//! CLI > file > defaults. Supports TOML configuration files with `[policy]`,
//! `[advisory]`, `[carrier_registry]`, `[logging]` and `[[loads]]` sections.

mod builder;
mod discovery;
mod model;
mod sources;
mod validation;

pub use builder::ConfigBuilder;
pub use model::*;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable pointing at a directory that holds `config.toml`
pub const HOME_ENV_VAR: &str = "LOADBROKER_HOME";

/// Directory searched for upward from the working directory
pub const CONFIG_DIR_NAME: &str = ".loadbroker";

/// Configuration file name inside [`CONFIG_DIR_NAME`] or [`HOME_ENV_VAR`]
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Where an effective configuration value came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    /// Value provided via CLI argument (highest precedence).
    Cli,
    /// Value loaded from configuration file.
    Config,
    /// Value provided programmatically (e.g., `Config::builder()`).
    Programmatic,
    /// Built-in default value (lowest precedence).
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "cli"),
            Self::Config => write!(f, "config"),
            Self::Programmatic => write!(f, "programmatic"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// CLI overrides applied on top of the configuration file.
#[derive(Debug, Clone, Default)]
pub struct CliArgs {
    /// Explicit configuration file (skips discovery)
    pub config_path: Option<PathBuf>,
    pub verbose: Option<bool>,
    pub max_attempts: Option<u32>,
    /// `Some(false)` forces the deterministic path even if `[advisory] enabled = true`
    pub advisory_enabled: Option<bool>,
    pub advisory_model: Option<String>,
}
