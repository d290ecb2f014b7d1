//! CLI command implementations (facade).
//!
//! This module re-exports the command surface used by `run.rs`.
//! Implementations live in `commands/*`.

mod analytics;
mod carrier;
mod common;
mod config;
mod loads;
mod negotiate;

pub use analytics::execute_record_call_command;
pub use carrier::execute_verify_carrier_command;
pub use config::execute_config_command;
pub use loads::execute_search_loads_command;
pub use negotiate::{execute_negotiate_command, execute_simulate_command};
