use super::{Config, ConfigSource, LoadRecord};
use loadbroker_utils::error::ConfigError;

impl Config {
    /// Create a builder for programmatic configuration.
    ///
    /// Use this when embedding loadbroker without relying on environment
    /// variables or config files.
    ///
    /// ```rust
    /// use loadbroker_config::Config;
    ///
    /// let config = Config::builder()
    ///     .max_attempts(2)
    ///     .counter_steps(vec![0.05, 0.08])
    ///     .high_side_caps(vec![0.25, 0.18])
    ///     .build()
    ///     .expect("valid config");
    /// assert_eq!(config.policy.max_attempts, Some(2));
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for programmatic configuration of loadbroker.
///
/// All values set via the builder are attributed to `ConfigSource::Programmatic`
/// in the resulting `Config`'s source attribution map.
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    accept_within: Option<f64>,
    negotiate_within: Option<f64>,
    max_attempts: Option<u32>,
    counter_steps: Option<Vec<f64>>,
    high_side_caps: Option<Vec<f64>>,
    advisory_enabled: Option<bool>,
    advisory_base_url: Option<String>,
    advisory_model: Option<String>,
    advisory_timeout_secs: Option<u64>,
    registry_base_url: Option<String>,
    verbose: Option<bool>,
    loads: Vec<LoadRecord>,
}

impl ConfigBuilder {
    /// Create a new `ConfigBuilder` with no values set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn accept_within(mut self, fraction: f64) -> Self {
        self.accept_within = Some(fraction);
        self
    }

    #[must_use]
    pub fn negotiate_within(mut self, fraction: f64) -> Self {
        self.negotiate_within = Some(fraction);
        self
    }

    #[must_use]
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Counter increases over the board rate, one per attempt.
    #[must_use]
    pub fn counter_steps(mut self, steps: Vec<f64>) -> Self {
        self.counter_steps = Some(steps);
        self
    }

    /// Rejection ceilings over the board rate, one per attempt.
    #[must_use]
    pub fn high_side_caps(mut self, caps: Vec<f64>) -> Self {
        self.high_side_caps = Some(caps);
        self
    }

    #[must_use]
    pub fn advisory_enabled(mut self, enabled: bool) -> Self {
        self.advisory_enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn advisory_base_url(mut self, url: impl Into<String>) -> Self {
        self.advisory_base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn advisory_model(mut self, model: impl Into<String>) -> Self {
        self.advisory_model = Some(model.into());
        self
    }

    #[must_use]
    pub fn advisory_timeout_secs(mut self, secs: u64) -> Self {
        self.advisory_timeout_secs = Some(secs);
        self
    }

    #[must_use]
    pub fn registry_base_url(mut self, url: impl Into<String>) -> Self {
        self.registry_base_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = Some(verbose);
        self
    }

    /// Add a load to the board.
    #[must_use]
    pub fn load(mut self, load: LoadRecord) -> Self {
        self.loads.push(load);
        self
    }

    /// Build the configuration, validating the result.
    pub fn build(self) -> Result<Config, ConfigError> {
        let mut config = Config::default();
        let source = ConfigSource::Programmatic;

        macro_rules! set {
            ($target:expr, $value:expr, $key:literal) => {
                if let Some(v) = $value {
                    $target = Some(v);
                    config
                        .source_attribution
                        .insert($key.to_string(), source.clone());
                }
            };
        }

        set!(config.policy.accept_within, self.accept_within, "accept_within");
        set!(config.policy.negotiate_within, self.negotiate_within, "negotiate_within");
        set!(config.policy.max_attempts, self.max_attempts, "max_attempts");
        set!(config.policy.counter_steps, self.counter_steps, "counter_steps");
        set!(config.policy.high_side_caps, self.high_side_caps, "high_side_caps");
        set!(config.advisory.enabled, self.advisory_enabled, "advisory_enabled");
        set!(config.advisory.base_url, self.advisory_base_url, "advisory_base_url");
        set!(config.advisory.model, self.advisory_model, "advisory_model");
        set!(config.advisory.timeout_secs, self.advisory_timeout_secs, "advisory_timeout_secs");
        set!(config.carrier_registry.base_url, self.registry_base_url, "registry_base_url");
        set!(config.logging.verbose, self.verbose, "verbose");

        if !self.loads.is_empty() {
            config.loads = self.loads;
            config
                .source_attribution
                .insert("loads".to_string(), source);
        }

        config.validate()?;
        Ok(config)
    }
}
