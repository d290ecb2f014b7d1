//! Configuration system tests
//!
//! Tests:
//! - Upward discovery stopping at .git
//! - Precedence: CLI > config > defaults
//! - Source attribution in `effective_config`
//! - LOADBROKER_HOME override
//! - `[[loads]]` feeding the load board and board rate lookup
//! - Invalid config handling

use anyhow::Result;
use serial_test::serial;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use loadbroker::config::{CliArgs, Config, ConfigSource};
use loadbroker::{ConfigError, LoadBoard, LoadQuery, RateSource, orchestrator_from_config};

const LOADS_TOML: &str = r#"
[[loads]]
load_id = "L1001"
origin = "Dallas, TX"
destination = "Atlanta, GA"
pickup_datetime = "2025-08-20T08:00:00"
delivery_datetime = "2025-08-21T17:00:00"
equipment_type = "Dry Van"
loadboard_rate = 2000.0
notes = "No touch freight"
weight = 42000
commodity_type = "Paper products"
num_of_pieces = 24
miles = 781
dimensions = "53ft"

[[loads]]
load_id = "L1002"
origin = "Dallas, TX"
destination = "Memphis, TN"
pickup_datetime = "2025-08-21T06:00:00"
delivery_datetime = "2025-08-21T20:00:00"
equipment_type = "Reefer"
loadboard_rate = 1450.0
"#;

/// Helper to create a config file in a directory
fn create_config_file(dir: &Path, content: &str) -> PathBuf {
    let config_dir = dir.join(".loadbroker");
    fs::create_dir_all(&config_dir).unwrap();
    let config_path = config_dir.join("config.toml");
    fs::write(&config_path, content).unwrap();
    config_path
}

/// Helper to create a .git directory marker
fn create_git_marker(dir: &Path) {
    fs::create_dir_all(dir.join(".git")).unwrap();
}

/// Restores `LOADBROKER_HOME` on drop.
struct HomeGuard(Option<std::ffi::OsString>);

impl HomeGuard {
    fn set(value: &Path) -> Self {
        let original = env::var_os("LOADBROKER_HOME");
        // SAFETY: callers are #[serial]; no other thread touches the environment
        unsafe { env::set_var("LOADBROKER_HOME", value) };
        Self(original)
    }

    fn unset() -> Self {
        let original = env::var_os("LOADBROKER_HOME");
        // SAFETY: as above
        unsafe { env::remove_var("LOADBROKER_HOME") };
        Self(original)
    }
}

impl Drop for HomeGuard {
    fn drop(&mut self) {
        // SAFETY: still inside the #[serial] test that created the guard
        match &self.0 {
            Some(value) => unsafe { env::set_var("LOADBROKER_HOME", value) },
            None => unsafe { env::remove_var("LOADBROKER_HOME") },
        }
    }
}

#[test]
#[serial]
fn test_upward_discovery_stops_at_git() -> Result<()> {
    let _home = HomeGuard::unset();
    let temp_dir = TempDir::new()?;
    let root = temp_dir.path();

    // root/
    //   .git/
    //   .loadbroker/config.toml
    //   sub/deeper/
    create_git_marker(root);
    create_config_file(root, "[policy]\nmax_attempts = 2\ncounter_steps = [0.05, 0.08]\nhigh_side_caps = [0.25, 0.18]\n");
    let deeper = root.join("sub").join("deeper");
    fs::create_dir_all(&deeper)?;

    let config = Config::discover_from(&deeper, &CliArgs::default())?;
    assert_eq!(config.policy.max_attempts, Some(2));
    assert_eq!(
        config.source_attribution.get("max_attempts"),
        Some(&ConfigSource::Config)
    );

    // A nested repository root hides the outer config
    let nested = root.join("nested");
    create_git_marker(&nested);
    let config = Config::discover_from(&nested, &CliArgs::default())?;
    assert_eq!(config.policy.max_attempts, Some(3));
    assert_eq!(
        config.source_attribution.get("max_attempts"),
        Some(&ConfigSource::Default)
    );
    Ok(())
}

#[test]
#[serial]
fn test_cli_overrides_file_overrides_defaults() -> Result<()> {
    let _home = HomeGuard::unset();
    let temp_dir = TempDir::new()?;
    create_git_marker(temp_dir.path());
    create_config_file(
        temp_dir.path(),
        r#"
[policy]
accept_within = 0.08

[advisory]
model = "gpt-4o"
"#,
    );

    let cli = CliArgs {
        advisory_model: Some("gpt-4.1-mini".to_string()),
        verbose: Some(true),
        ..CliArgs::default()
    };
    let config = Config::discover_from(temp_dir.path(), &cli)?;
    let effective = config.effective_config();

    assert_eq!(
        effective.get("accept_within"),
        Some(&("0.08".to_string(), "config".to_string()))
    );
    assert_eq!(
        effective.get("advisory_model"),
        Some(&("gpt-4.1-mini".to_string(), "cli".to_string()))
    );
    assert_eq!(
        effective.get("negotiate_within").map(|(_, source)| source.as_str()),
        Some("default")
    );
    assert!(config.verbose());
    Ok(())
}

#[test]
#[serial]
fn test_loadbroker_home_is_used() -> Result<()> {
    let home_dir = TempDir::new()?;
    fs::write(
        home_dir.path().join("config.toml"),
        "[carrier_registry]\ntimeout_secs = 4\n",
    )?;
    let _home = HomeGuard::set(home_dir.path());

    let work_dir = TempDir::new()?;
    create_git_marker(work_dir.path());
    let config = Config::discover_from(work_dir.path(), &CliArgs::default())?;
    assert_eq!(config.carrier_registry.timeout_secs, Some(4));
    Ok(())
}

#[test]
#[serial]
fn test_explicit_config_path() -> Result<()> {
    let _home = HomeGuard::unset();
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("desk.toml");
    fs::write(&path, LOADS_TOML)?;

    let cli = CliArgs {
        config_path: Some(path),
        ..CliArgs::default()
    };
    let config = Config::discover_from(temp_dir.path(), &cli)?;
    assert_eq!(config.loads.len(), 2);
    assert_eq!(config.loads[0].miles, Some(781));
    assert_eq!(config.loads[1].weight, None);

    let missing = CliArgs {
        config_path: Some(temp_dir.path().join("missing.toml")),
        ..CliArgs::default()
    };
    let err = Config::discover_from(temp_dir.path(), &missing).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ConfigError>(),
        Some(ConfigError::NotFound { .. })
    ));
    Ok(())
}

#[test]
#[serial]
fn test_configured_loads_drive_search_and_rates() -> Result<()> {
    let _home = HomeGuard::unset();
    let temp_dir = TempDir::new()?;
    create_git_marker(temp_dir.path());
    create_config_file(temp_dir.path(), LOADS_TOML);

    let config = Config::discover_from(temp_dir.path(), &CliArgs::default())?;
    let board = LoadBoard::from_config(&config);

    let found = board.search(&LoadQuery::new("dallas", "ga", "dry"))?;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].load_id, "L1001");
    assert_eq!(board.lookup("L1002"), Some(1450.0));
    assert_eq!(
        config.effective_config().get("loads").map(|(v, _)| v.as_str()),
        Some("2")
    );
    Ok(())
}

#[test]
#[serial]
fn test_invalid_configs_are_rejected() -> Result<()> {
    let _home = HomeGuard::unset();

    for body in [
        "[policy]\naccept_within = 1.5\n",
        "[policy]\nmax_attempts = 0\n",
        "[advisory]\nbase_url = \"ftp://example.com\"\n",
        "[policy]\nunknown_key = 1\n",
        "not toml at all = = =",
    ] {
        let temp_dir = TempDir::new()?;
        create_git_marker(temp_dir.path());
        create_config_file(temp_dir.path(), body);
        assert!(
            Config::discover_from(temp_dir.path(), &CliArgs::default()).is_err(),
            "expected rejection for {body:?}"
        );
    }
    Ok(())
}

#[test]
#[serial]
fn test_cli_max_attempts_must_fit_policy_tables() -> Result<()> {
    let _home = HomeGuard::unset();
    let temp_dir = TempDir::new()?;
    create_git_marker(temp_dir.path());

    let cli = CliArgs {
        max_attempts: Some(5),
        ..CliArgs::default()
    };
    let config = Config::discover_from(temp_dir.path(), &cli)?;
    assert!(orchestrator_from_config(&config).is_err());

    let cli = CliArgs {
        max_attempts: Some(2),
        ..CliArgs::default()
    };
    let config = Config::discover_from(temp_dir.path(), &cli)?;
    assert_eq!(orchestrator_from_config(&config)?.policy().max_attempts(), 2);
    Ok(())
}
