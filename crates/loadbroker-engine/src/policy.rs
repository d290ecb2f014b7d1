//! Negotiation policy thresholds and schedules

use loadbroker_config::{
    DEFAULT_ACCEPT_WITHIN, DEFAULT_COUNTER_STEPS, DEFAULT_HIGH_SIDE_CAPS, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_NEGOTIATE_WITHIN, PolicyConfig,
};
use loadbroker_utils::error::ConfigError;
use serde::Serialize;

/// Validated policy driving the deterministic evaluator.
///
/// Schedule tables always hold at least `max_attempts` entries, so lookups by
/// clamped attempt never fall off the end.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NegotiationPolicy {
    accept_within: f64,
    negotiate_within: f64,
    max_attempts: u32,
    counter_steps: Vec<f64>,
    high_side_caps: Vec<f64>,
}

impl Default for NegotiationPolicy {
    fn default() -> Self {
        Self {
            accept_within: DEFAULT_ACCEPT_WITHIN,
            negotiate_within: DEFAULT_NEGOTIATE_WITHIN,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            counter_steps: DEFAULT_COUNTER_STEPS.to_vec(),
            high_side_caps: DEFAULT_HIGH_SIDE_CAPS.to_vec(),
        }
    }
}

impl NegotiationPolicy {
    /// Build a policy, checking the constraints that span fields.
    ///
    /// # Errors
    ///
    /// `ConfigError::InvalidValue` when a fraction is out of range, the accept
    /// band is not inside the negotiate band, or a schedule is shorter than
    /// `max_attempts`.
    pub fn new(
        accept_within: f64,
        negotiate_within: f64,
        max_attempts: u32,
        counter_steps: Vec<f64>,
        high_side_caps: Vec<f64>,
    ) -> Result<Self, ConfigError> {
        let policy = Self {
            accept_within,
            negotiate_within,
            max_attempts,
            counter_steps,
            high_side_caps,
        };
        policy.validate()?;
        Ok(policy)
    }

    /// Build from the `[policy]` section; unset keys take the built-in defaults.
    pub fn from_config(config: &PolicyConfig) -> Result<Self, ConfigError> {
        Self::new(
            config.accept_within.unwrap_or(DEFAULT_ACCEPT_WITHIN),
            config.negotiate_within.unwrap_or(DEFAULT_NEGOTIATE_WITHIN),
            config.max_attempts.unwrap_or(DEFAULT_MAX_ATTEMPTS),
            config
                .counter_steps
                .clone()
                .unwrap_or_else(|| DEFAULT_COUNTER_STEPS.to_vec()),
            config
                .high_side_caps
                .clone()
                .unwrap_or_else(|| DEFAULT_HIGH_SIDE_CAPS.to_vec()),
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let fraction_ok = |v: f64| v.is_finite() && (0.0..1.0).contains(&v);

        if !fraction_ok(self.accept_within) {
            return Err(ConfigError::invalid_value(
                "accept_within",
                self.accept_within.to_string(),
            ));
        }
        if !fraction_ok(self.negotiate_within) || self.negotiate_within <= self.accept_within {
            return Err(ConfigError::invalid_value(
                "negotiate_within",
                format!(
                    "{} (must exceed accept_within {} and stay below 1)",
                    self.negotiate_within, self.accept_within
                ),
            ));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::invalid_value("max_attempts", "0"));
        }

        let needed = self.max_attempts as usize;
        for (key, table) in [
            ("counter_steps", &self.counter_steps),
            ("high_side_caps", &self.high_side_caps),
        ] {
            if table.len() < needed {
                return Err(ConfigError::invalid_value(
                    key,
                    format!(
                        "{} entries (max_attempts = {} needs one per attempt)",
                        table.len(),
                        self.max_attempts
                    ),
                ));
            }
            if let Some(bad) = table.iter().find(|v| !fraction_ok(**v)) {
                return Err(ConfigError::invalid_value(key, bad.to_string()));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn accept_within(&self) -> f64 {
        self.accept_within
    }

    #[must_use]
    pub fn negotiate_within(&self) -> f64 {
        self.negotiate_within
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Zero-based schedule index for `attempt`, clamped into `[1, max_attempts]`.
    fn schedule_index(&self, attempt: u32) -> usize {
        (attempt.clamp(1, self.max_attempts) - 1) as usize
    }

    /// Concession for this attempt as a fraction of board rate.
    #[must_use]
    pub fn counter_step(&self, attempt: u32) -> f64 {
        self.counter_steps[self.schedule_index(attempt)]
    }

    /// Ceiling over board rate for this attempt as a fraction of board rate.
    #[must_use]
    pub fn high_side_cap(&self, attempt: u32) -> f64 {
        self.high_side_caps[self.schedule_index(attempt)]
    }

    /// Whether a counter in this round must be turned into a rejection.
    #[must_use]
    pub fn attempt_cap_reached(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }
}
