//! Search-loads command implementation

use anyhow::Result;

use super::common::emit_json;
use crate::{BrokerError, Config, LoadBoard, LoadQuery, format_dollars};

/// Execute `loadbroker search-loads`
pub fn execute_search_loads_command(
    origin: String,
    destination: String,
    equipment_type: String,
    limit: Option<usize>,
    json: bool,
    config: &Config,
) -> Result<()> {
    let board = LoadBoard::from_config(config);
    let query = LoadQuery {
        origin,
        destination,
        equipment_type,
        limit,
    };
    let loads = board.search(&query).map_err(BrokerError::from)?;

    if json {
        return emit_json(&loads);
    }

    for load in loads {
        println!(
            "{}  {} -> {}  {}  {}",
            load.load_id,
            load.origin,
            load.destination,
            load.equipment_type,
            format_dollars(load.loadboard_rate)
        );
        println!(
            "    pickup {}  delivery {}",
            load.pickup_datetime.format("%Y-%m-%d %H:%M"),
            load.delivery_datetime.format("%Y-%m-%d %H:%M")
        );
        if let Some(miles) = load.miles {
            println!("    {miles} mi");
        }
        if let Some(notes) = &load.notes {
            println!("    {notes}");
        }
    }
    Ok(())
}
