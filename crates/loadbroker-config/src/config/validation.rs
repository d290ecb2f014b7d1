use std::collections::HashSet;

use super::Config;
use loadbroker_utils::error::ConfigError;

const MAX_ATTEMPTS_LIMIT: u32 = 10;
const MAX_TIMEOUT_SECS: u64 = 120;

fn check_fraction(key: &str, value: Option<f64>, allow_zero: bool) -> Result<(), ConfigError> {
    if let Some(v) = value {
        let lower_ok = if allow_zero { v >= 0.0 } else { v > 0.0 };
        if !v.is_finite() || !lower_ok || v >= 1.0 {
            let bound = if allow_zero { "[0, 1)" } else { "(0, 1)" };
            return Err(ConfigError::invalid_value(
                key,
                format!("{v} (must be a fraction in {bound})"),
            ));
        }
    }
    Ok(())
}

fn check_timeout(key: &str, value: Option<u64>) -> Result<(), ConfigError> {
    if let Some(secs) = value
        && (secs == 0 || secs > MAX_TIMEOUT_SECS)
    {
        return Err(ConfigError::invalid_value(
            key,
            format!("{secs} (must be between 1 and {MAX_TIMEOUT_SECS} seconds)"),
        ));
    }
    Ok(())
}

impl Config {
    /// Validate configuration values
    ///
    /// Per-field range checks only. Cross-field policy checks (table lengths
    /// against `max_attempts`, accept band inside the negotiate band) happen
    /// when the negotiation policy is built from this configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_fraction("accept_within", self.policy.accept_within, true)?;
        check_fraction("negotiate_within", self.policy.negotiate_within, false)?;

        if let Some(max_attempts) = self.policy.max_attempts
            && (max_attempts == 0 || max_attempts > MAX_ATTEMPTS_LIMIT)
        {
            return Err(ConfigError::invalid_value(
                "max_attempts",
                format!("{max_attempts} (must be between 1 and {MAX_ATTEMPTS_LIMIT})"),
            ));
        }

        for (key, table) in [
            ("counter_steps", &self.policy.counter_steps),
            ("high_side_caps", &self.policy.high_side_caps),
        ] {
            if let Some(values) = table {
                if values.is_empty() {
                    return Err(ConfigError::invalid_value(key, "[] (must not be empty)"));
                }
                for v in values {
                    check_fraction(key, Some(*v), true)?;
                }
            }
        }

        if let Some(temperature) = self.advisory.temperature
            && !(0.0..=2.0).contains(&temperature)
        {
            return Err(ConfigError::invalid_value(
                "advisory_temperature",
                format!("{temperature} (must be between 0.0 and 2.0)"),
            ));
        }
        if let Some(0) = self.advisory.max_tokens {
            return Err(ConfigError::invalid_value(
                "advisory_max_tokens",
                "0 (must be greater than 0)",
            ));
        }
        check_timeout("advisory_timeout_secs", self.advisory.timeout_secs)?;
        check_timeout("registry_timeout_secs", self.carrier_registry.timeout_secs)?;

        for (key, url) in [
            ("advisory_base_url", &self.advisory.base_url),
            ("registry_base_url", &self.carrier_registry.base_url),
        ] {
            if let Some(url) = url
                && !(url.starts_with("http://") || url.starts_with("https://"))
            {
                return Err(ConfigError::invalid_value(
                    key,
                    format!("{url} (must be an http or https URL)"),
                ));
            }
        }

        self.validate_loads()
    }

    fn validate_loads(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for load in &self.loads {
            if load.load_id.trim().is_empty() {
                return Err(ConfigError::invalid_value("loads.load_id", "empty load id"));
            }
            if !seen.insert(load.load_id.as_str()) {
                return Err(ConfigError::invalid_value(
                    "loads.load_id",
                    format!("{} (duplicate load id)", load.load_id),
                ));
            }
            if !load.loadboard_rate.is_finite() || load.loadboard_rate <= 0.0 {
                return Err(ConfigError::invalid_value(
                    format!("loads.{}.loadboard_rate", load.load_id),
                    format!("{} (must be greater than 0)", load.loadboard_rate),
                ));
            }
            if load.delivery_datetime < load.pickup_datetime {
                return Err(ConfigError::invalid_value(
                    format!("loads.{}.delivery_datetime", load.load_id),
                    "delivery precedes pickup",
                ));
            }
        }
        Ok(())
    }
}
