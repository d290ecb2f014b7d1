use std::collections::BTreeMap;

use super::{Config, ConfigSource};

fn source_label(source: Option<&ConfigSource>) -> String {
    source.unwrap_or(&ConfigSource::Default).to_string()
}

fn join_fractions(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl Config {
    /// Get effective configuration as key-value pairs with source attribution
    ///
    /// Keys are sorted so `loadbroker config` output is stable.
    #[must_use]
    pub fn effective_config(&self) -> BTreeMap<String, (String, String)> {
        let mut config = BTreeMap::new();

        let mut add_config = |key: &str, value: Option<String>| {
            if let Some(val) = value {
                let source = source_label(self.source_attribution.get(key));
                config.insert(key.to_string(), (val, source));
            }
        };

        add_config("accept_within", self.policy.accept_within.map(|v| v.to_string()));
        add_config(
            "negotiate_within",
            self.policy.negotiate_within.map(|v| v.to_string()),
        );
        add_config("max_attempts", self.policy.max_attempts.map(|v| v.to_string()));
        add_config(
            "counter_steps",
            self.policy.counter_steps.as_deref().map(join_fractions),
        );
        add_config(
            "high_side_caps",
            self.policy.high_side_caps.as_deref().map(join_fractions),
        );

        add_config("advisory_enabled", Some(self.advisory_enabled().to_string()));
        add_config("advisory_base_url", self.advisory.base_url.clone());
        add_config("advisory_api_key_env", self.advisory.api_key_env.clone());
        add_config("advisory_model", self.advisory.model.clone());
        add_config(
            "advisory_temperature",
            self.advisory.temperature.map(|v| v.to_string()),
        );
        add_config(
            "advisory_max_tokens",
            self.advisory.max_tokens.map(|v| v.to_string()),
        );
        add_config(
            "advisory_timeout_secs",
            self.advisory.timeout_secs.map(|v| v.to_string()),
        );
        add_config("advisory_budget", self.advisory.budget.map(|v| v.to_string()));

        add_config("registry_base_url", self.carrier_registry.base_url.clone());
        add_config("registry_webkey_env", self.carrier_registry.webkey_env.clone());
        add_config(
            "registry_timeout_secs",
            self.carrier_registry.timeout_secs.map(|v| v.to_string()),
        );

        add_config("verbose", Some(self.verbose().to_string()));
        add_config("loads", Some(self.loads.len().to_string()));

        config
    }
}
