//! Common helper functions used across CLI commands

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::args::BoardRateArgs;
use crate::OfferRequest;

/// Print `value` as pretty JSON on stdout.
pub fn emit_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize JSON output")?;
    println!("{json}");
    Ok(())
}

/// Offer request for one round; clap guarantees exactly one rate source.
pub fn offer_request(rate: &BoardRateArgs, offer: f64, attempt: u32) -> OfferRequest {
    OfferRequest {
        load_id: rate.load_id.clone(),
        board_rate: rate.board_rate,
        offer,
        attempt,
    }
}
