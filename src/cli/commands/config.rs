//! Config command implementation
//!
//! Prints every effective value with the layer it came from.

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;

use super::common::emit_json;
use crate::Config;

#[derive(Debug, Serialize)]
struct ConfigValue {
    value: String,
    source: String,
}

/// Execute `loadbroker config`
pub fn execute_config_command(json: bool, config: &Config) -> Result<()> {
    let effective = config.effective_config();

    if json {
        let values: BTreeMap<String, ConfigValue> = effective
            .into_iter()
            .map(|(key, (value, source))| (key, ConfigValue { value, source }))
            .collect();
        return emit_json(&values);
    }

    let width = effective.keys().map(String::len).max().unwrap_or(0);
    for (key, (value, source)) in &effective {
        println!("{key:<width$} = {value}  ({source})");
    }
    Ok(())
}
