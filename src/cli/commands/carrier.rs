//! Verify-carrier command implementation

use anyhow::Result;

use super::common::emit_json;
use crate::{BrokerError, CarrierRegistry, Config};

/// Execute `loadbroker verify-carrier`
pub async fn execute_verify_carrier_command(
    mc_number: &str,
    json: bool,
    config: &Config,
) -> Result<()> {
    let registry = CarrierRegistry::from_config(config).map_err(BrokerError::from)?;
    let verification = registry
        .verify(mc_number)
        .await
        .map_err(BrokerError::from)?;

    if json {
        return emit_json(&verification);
    }

    let mark = if verification.eligible { "✓" } else { "✗" };
    let name = verification.carrier_name.as_deref().unwrap_or("unknown carrier");
    println!(
        "{mark} MC {}: {} ({})",
        verification.mc_number,
        name,
        verification.status.as_str()
    );
    Ok(())
}
