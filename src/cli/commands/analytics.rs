//! Record-call command implementation

use anyhow::Result;
use std::io::Read;
use std::path::Path;

use super::common::emit_json;
use crate::{AnalyticsRelay, BrokerError, format_dollars};

fn read_input(file: &Path) -> Result<String, BrokerError> {
    if file.as_os_str() == "-" {
        let mut input = String::new();
        std::io::stdin().read_to_string(&mut input)?;
        Ok(input)
    } else {
        Ok(std::fs::read_to_string(file)?)
    }
}

/// Execute `loadbroker record-call`
pub fn execute_record_call_command(file: &Path, json: bool) -> Result<()> {
    let input = read_input(file)?;

    let relay = AnalyticsRelay::new();
    let recorded = relay.record_json(&input).map_err(BrokerError::from)?;

    let events = relay.events();
    if json {
        return emit_json(&events);
    }

    println!("Recorded {} call(s)", recorded.len());
    for event in &events {
        let timestamp = event
            .timestamp
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();
        println!(
            "  {}  MC {}  {}  final {}",
            timestamp,
            event.mc_number.as_deref().unwrap_or("-"),
            event.call_outcome.as_deref().unwrap_or("-"),
            event.final_rate.map(format_dollars).unwrap_or_default()
        );
    }
    Ok(())
}
