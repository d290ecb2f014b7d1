//! Negotiate and simulate command implementations
//!
//! `negotiate` decides exactly one round. `simulate` repeats a fixed offer,
//! feeding each decision's `attempts` into the next round until a terminal
//! decision, then records a call summary with the analytics relay.

use anyhow::Result;
use serde::Serialize;

use super::common::{emit_json, offer_request};
use crate::cli::args::BoardRateArgs;
use crate::{
    AnalyticsRelay, BrokerError, CallAnalytics, Config, Decision, LoadBoard, RoundOutcome, Status,
    format_dollars, orchestrator_from_config,
};

/// Execute `loadbroker negotiate`
pub async fn execute_negotiate_command(
    rate: &BoardRateArgs,
    offer: f64,
    attempt: u32,
    json: bool,
    config: &Config,
) -> Result<()> {
    let orchestrator = orchestrator_from_config(config)?;
    let board = LoadBoard::from_config(config);

    let round = offer_request(rate, offer, attempt)
        .resolve(&board, orchestrator.policy())
        .map_err(BrokerError::from)?;
    let outcome = orchestrator
        .negotiate_traced(round, rate.load_id.as_deref())
        .await
        .map_err(BrokerError::from)?;

    if json {
        emit_json(&outcome.decision)?;
    } else {
        print_outcome(&outcome);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct SimulatedRound {
    attempt: u32,
    provider: String,
    fallback: bool,
    #[serde(flatten)]
    decision: Decision,
}

#[derive(Debug, Serialize)]
struct SimulationReport {
    rounds: Vec<SimulatedRound>,
    outcome: Decision,
    call: CallAnalytics,
}

/// Execute `loadbroker simulate`
pub async fn execute_simulate_command(
    rate: &BoardRateArgs,
    offer: f64,
    json: bool,
    config: &Config,
) -> Result<()> {
    let orchestrator = orchestrator_from_config(config)?;
    let board = LoadBoard::from_config(config);

    let mut rounds = Vec::new();
    let mut attempt = 1;
    let outcome = loop {
        let round = offer_request(rate, offer, attempt)
            .resolve(&board, orchestrator.policy())
            .map_err(BrokerError::from)?;
        let RoundOutcome {
            decision,
            provider,
            fallback,
        } = orchestrator
            .negotiate_traced(round, rate.load_id.as_deref())
            .await
            .map_err(BrokerError::from)?;

        rounds.push(SimulatedRound {
            attempt,
            provider,
            fallback,
            decision: decision.clone(),
        });

        if decision.status.is_terminal() {
            break decision;
        }
        attempt = decision.attempts;
    };

    let relay = AnalyticsRelay::new();
    let call = relay
        .record(call_summary(offer, &rounds, &outcome))
        .map_err(BrokerError::from)?;

    let report = SimulationReport {
        rounds,
        outcome,
        call,
    };

    if json {
        emit_json(&report)?;
    } else {
        for round in &report.rounds {
            println!(
                "Round {}: {} {} ({})",
                round.attempt,
                round.decision.status.as_str().to_uppercase(),
                format_dollars(round.decision.target_rate),
                round.decision.message
            );
        }
        println!();
        println!(
            "Outcome: {} at {} after {} round(s)",
            report.outcome.status,
            format_dollars(report.outcome.target_rate),
            report.rounds.len()
        );
    }
    Ok(())
}

fn call_summary(offer: f64, rounds: &[SimulatedRound], outcome: &Decision) -> CallAnalytics {
    let last_counter = rounds
        .iter()
        .rev()
        .find(|r| r.decision.status == Status::Counter)
        .map(|r| r.decision.target_rate);

    CallAnalytics {
        carrier_name: None,
        mc_number: None,
        offer_amount: Some(offer),
        counter_offer_amount: last_counter,
        final_rate: Some(outcome.target_rate),
        negotiation_outcome: Some(outcome.status.to_string()),
        call_outcome: Some("simulated".to_string()),
        sentiment: None,
        timestamp: None,
    }
}

fn print_outcome(outcome: &RoundOutcome) {
    let decision = &outcome.decision;
    match decision.status {
        Status::Counter => println!(
            "COUNTER at {} (next attempt {})",
            format_dollars(decision.target_rate),
            decision.attempts
        ),
        Status::Accept => println!(
            "ACCEPT at {} (hand off to a rep)",
            format_dollars(decision.target_rate)
        ),
        Status::Reject => println!("REJECT (board {})", format_dollars(decision.target_rate)),
    }
    println!("  \"{}\"", decision.message);

    if outcome.fallback {
        println!("  provider: {} (advisory fallback)", outcome.provider);
    } else {
        println!("  provider: {}", outcome.provider);
    }
}
