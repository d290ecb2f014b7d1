//! Post-call analytics relay
//!
//! Records one summary per carrier call and keeps the most recent
//! [`EVENT_RETENTION`] in memory. Currency fields accept numbers or strings
//! such as `"$2,400"`; a blank string means "not given".

use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;

use loadbroker_utils::error::DeskError;
use loadbroker_utils::ring_buffer::RingBuffer;

/// Number of records returned by [`AnalyticsRelay::events`].
pub const EVENT_RETENTION: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallAnalytics {
    #[serde(default)]
    pub carrier_name: Option<String>,
    #[serde(default)]
    pub mc_number: Option<String>,
    #[serde(default, deserialize_with = "currency")]
    pub offer_amount: Option<f64>,
    #[serde(default, deserialize_with = "currency")]
    pub counter_offer_amount: Option<f64>,
    /// Required when recording
    #[serde(default, deserialize_with = "currency")]
    pub final_rate: Option<f64>,
    #[serde(default)]
    pub negotiation_outcome: Option<String>,
    /// Required when recording
    #[serde(default)]
    pub call_outcome: Option<String>,
    #[serde(default)]
    pub sentiment: Option<String>,
    /// Filled with the receive time when absent
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
}

fn currency<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawAmount>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawAmount::Number(n)) => Ok(Some(n)),
        Some(RawAmount::Text(text)) => parse_currency(&text).map_err(D::Error::custom),
    }
}

/// Parse `"$2,400.50"`-style amounts. Blank input is `None`.
///
/// # Errors
///
/// A description of the problem when the cleaned text is not a number.
pub fn parse_currency(text: &str) -> Result<Option<f64>, String> {
    let cleaned = text.trim().replace(['$', ','], "");
    if cleaned.is_empty() {
        return Ok(None);
    }
    cleaned
        .parse::<f64>()
        .map(Some)
        .map_err(|_| format!("'{text}' is not a currency amount"))
}

/// Thread-safe, bounded store of call records.
pub struct AnalyticsRelay {
    events: Mutex<RingBuffer<CallAnalytics>>,
}

impl Default for AnalyticsRelay {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalyticsRelay {
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: Mutex::new(RingBuffer::new(EVENT_RETENTION)),
        }
    }

    /// Validate and store one record, returning it as stored.
    ///
    /// # Errors
    ///
    /// `DeskError::InvalidAnalytics` when `call_outcome` or `final_rate` is
    /// missing.
    pub fn record(&self, mut event: CallAnalytics) -> Result<CallAnalytics, DeskError> {
        prepare(&mut event)?;
        log_recorded(&event);
        self.lock().push(event.clone());
        Ok(event)
    }

    /// Parse a JSON object or array of objects and record each entry.
    ///
    /// # Errors
    ///
    /// `DeskError::InvalidAnalytics` for malformed JSON or an invalid entry.
    /// Nothing from the batch is stored on error.
    pub fn record_json(&self, json: &str) -> Result<Vec<CallAnalytics>, DeskError> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum OneOrMany {
            Many(Vec<CallAnalytics>),
            One(Box<CallAnalytics>),
        }

        let parsed: OneOrMany = serde_json::from_str(json)
            .map_err(|e| DeskError::InvalidAnalytics(e.to_string()))?;
        let mut events = match parsed {
            OneOrMany::Many(events) => events,
            OneOrMany::One(event) => vec![*event],
        };
        for (index, event) in events.iter_mut().enumerate() {
            prepare(event).map_err(|e| match e {
                DeskError::InvalidAnalytics(reason) => {
                    DeskError::InvalidAnalytics(format!("entry {index}: {reason}"))
                }
                other => other,
            })?;
        }

        let mut buffer = self.lock();
        for event in &events {
            log_recorded(event);
            buffer.push(event.clone());
        }
        Ok(events)
    }

    /// Retained records, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<CallAnalytics> {
        self.lock().iter().cloned().collect()
    }

    /// Total number of records ever accepted.
    #[must_use]
    pub fn total_recorded(&self) -> usize {
        self.lock().total_written()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RingBuffer<CallAnalytics>> {
        // A panic while holding the lock cannot leave the buffer half-written.
        self.events
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Check required fields and stamp a missing timestamp.
fn prepare(event: &mut CallAnalytics) -> Result<(), DeskError> {
    if event
        .call_outcome
        .as_deref()
        .is_none_or(|outcome| outcome.trim().is_empty())
    {
        return Err(DeskError::InvalidAnalytics(
            "call_outcome is required".to_string(),
        ));
    }
    if event.final_rate.is_none() {
        return Err(DeskError::InvalidAnalytics(
            "final_rate is required".to_string(),
        ));
    }
    event.timestamp.get_or_insert_with(Utc::now);
    Ok(())
}

fn log_recorded(event: &CallAnalytics) {
    info!(
        mc_number = event.mc_number.as_deref().unwrap_or("-"),
        call_outcome = event.call_outcome.as_deref().unwrap_or("-"),
        final_rate = event.final_rate,
        "Call analytics recorded"
    );
}
