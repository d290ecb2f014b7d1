//! Configuration model, discovery, and validation for loadbroker
//!
//! Hierarchical configuration with precedence CLI > file > defaults, loaded from
//! `.loadbroker/config.toml`.

mod config;

pub use config::*;
pub use loadbroker_utils::error::ConfigError;
