use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use super::{
    AdvisoryConfig, CONFIG_DIR_NAME, CONFIG_FILE_NAME, CarrierRegistryConfig, CliArgs, Config,
    ConfigSource, HOME_ENV_VAR, LoadRecord, LoggingConfig, PolicyConfig,
};
use loadbroker_utils::error::ConfigError;

/// TOML configuration file structure
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct TomlConfig {
    policy: Option<PolicyConfig>,
    advisory: Option<AdvisoryConfig>,
    carrier_registry: Option<CarrierRegistryConfig>,
    logging: Option<LoggingConfig>,
    #[serde(default)]
    loads: Vec<LoadRecord>,
}

/// Overwrite `target` when the higher-precedence layer provides a value.
fn apply<T>(
    target: &mut Option<T>,
    value: Option<T>,
    key: &str,
    source: &ConfigSource,
    attribution: &mut HashMap<String, ConfigSource>,
) {
    if value.is_some() {
        *target = value;
        attribution.insert(key.to_string(), source.clone());
    }
}

impl Config {
    /// Discover and load configuration with precedence: CLI > file > defaults
    ///
    /// Uses current working directory for config file discovery when no explicit
    /// path is provided in cli_args.
    pub fn discover(cli_args: &CliArgs) -> Result<Self> {
        let start_dir = env::current_dir().map_err(|e| ConfigError::DiscoveryFailed {
            reason: format!("cannot read current directory: {e}"),
        })?;
        Self::discover_from(&start_dir, cli_args)
    }

    /// Discover and load configuration starting from a specific directory
    ///
    /// This is the path-driven variant used by tests to avoid depending on the
    /// process working directory.
    pub fn discover_from(start_dir: &Path, cli_args: &CliArgs) -> Result<Self> {
        let mut config = Config::default();

        let config_path = match &cli_args.config_path {
            Some(explicit_path) => {
                if !explicit_path.exists() {
                    return Err(ConfigError::NotFound {
                        path: explicit_path.display().to_string(),
                    }
                    .into());
                }
                Some(explicit_path.clone())
            }
            None => match Self::home_config_file() {
                Some(path) => Some(path),
                None => Self::discover_config_file_from(start_dir)?,
            },
        };

        if let Some(path) = &config_path {
            let file_config = Self::load_config_file(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?;
            config.merge_file(file_config);
        }

        config.apply_cli(cli_args);

        // Validate the final configuration
        config.validate()?;

        Ok(config)
    }

    fn merge_file(&mut self, file_config: TomlConfig) {
        let source = ConfigSource::Config;
        let attr = &mut self.source_attribution;

        if let Some(policy) = file_config.policy {
            apply(&mut self.policy.accept_within, policy.accept_within, "accept_within", &source, attr);
            apply(&mut self.policy.negotiate_within, policy.negotiate_within, "negotiate_within", &source, attr);
            apply(&mut self.policy.max_attempts, policy.max_attempts, "max_attempts", &source, attr);
            apply(&mut self.policy.counter_steps, policy.counter_steps, "counter_steps", &source, attr);
            apply(&mut self.policy.high_side_caps, policy.high_side_caps, "high_side_caps", &source, attr);
        }

        if let Some(advisory) = file_config.advisory {
            apply(&mut self.advisory.enabled, advisory.enabled, "advisory_enabled", &source, attr);
            apply(&mut self.advisory.base_url, advisory.base_url, "advisory_base_url", &source, attr);
            apply(&mut self.advisory.api_key_env, advisory.api_key_env, "advisory_api_key_env", &source, attr);
            apply(&mut self.advisory.model, advisory.model, "advisory_model", &source, attr);
            apply(&mut self.advisory.temperature, advisory.temperature, "advisory_temperature", &source, attr);
            apply(&mut self.advisory.max_tokens, advisory.max_tokens, "advisory_max_tokens", &source, attr);
            apply(&mut self.advisory.timeout_secs, advisory.timeout_secs, "advisory_timeout_secs", &source, attr);
            apply(&mut self.advisory.budget, advisory.budget, "advisory_budget", &source, attr);
        }

        if let Some(registry) = file_config.carrier_registry {
            apply(&mut self.carrier_registry.base_url, registry.base_url, "registry_base_url", &source, attr);
            apply(&mut self.carrier_registry.webkey_env, registry.webkey_env, "registry_webkey_env", &source, attr);
            apply(&mut self.carrier_registry.timeout_secs, registry.timeout_secs, "registry_timeout_secs", &source, attr);
        }

        if let Some(logging) = file_config.logging {
            apply(&mut self.logging.verbose, logging.verbose, "verbose", &source, attr);
        }

        if !file_config.loads.is_empty() {
            self.loads = file_config.loads;
            attr.insert("loads".to_string(), source);
        }
    }

    fn apply_cli(&mut self, cli_args: &CliArgs) {
        let source = ConfigSource::Cli;
        let attr = &mut self.source_attribution;

        apply(&mut self.logging.verbose, cli_args.verbose, "verbose", &source, attr);
        apply(&mut self.policy.max_attempts, cli_args.max_attempts, "max_attempts", &source, attr);
        apply(&mut self.advisory.enabled, cli_args.advisory_enabled, "advisory_enabled", &source, attr);
        apply(&mut self.advisory.model, cli_args.advisory_model.clone(), "advisory_model", &source, attr);
    }

    /// `$LOADBROKER_HOME/config.toml`, if the variable is set and the file exists
    fn home_config_file() -> Option<PathBuf> {
        let home = env::var_os(HOME_ENV_VAR).filter(|value| !value.is_empty())?;
        let path = PathBuf::from(home).join(CONFIG_FILE_NAME);
        path.is_file().then_some(path)
    }

    /// Discover config file by searching upward from a given directory
    ///
    /// Walks up the directory tree looking for `.loadbroker/config.toml`, stopping
    /// at repository root markers (.git, .hg, .svn) or filesystem root.
    pub fn discover_config_file_from(start_dir: &Path) -> Result<Option<PathBuf>> {
        let mut current_dir = start_dir.to_path_buf();

        loop {
            let config_path = current_dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME);
            if config_path.is_file() {
                return Ok(Some(config_path));
            }

            if current_dir.join(".git").exists()
                || current_dir.join(".hg").exists()
                || current_dir.join(".svn").exists()
            {
                break;
            }

            match current_dir.parent() {
                Some(parent) => current_dir = parent.to_path_buf(),
                None => break,
            }
        }

        Ok(None)
    }

    /// Load configuration from TOML file
    fn load_config_file(path: &Path) -> Result<TomlConfig> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let config: TomlConfig = toml::from_str(&content)
                    .map_err(|e| ConfigError::InvalidFile(format!("{}: {e}", path.display())))?;
                Ok(config)
            }
            // Discovered file removed between discovery and read: fall back to defaults
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(TomlConfig::default()),
            Err(e) => Err(anyhow::anyhow!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            )),
        }
    }
}
