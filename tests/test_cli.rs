//! Integration tests for the loadbroker binary
//!
//! Each test runs the compiled binary in an isolated temp directory (marked as
//! a repository root so discovery cannot escape it).

use assert_cmd::assert::OutputAssertExt;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::process::{Command, Stdio};
use tempfile::TempDir;

const CONFIG_WITH_LOADS: &str = r#"
[[loads]]
load_id = "L1001"
origin = "Dallas, TX"
destination = "Atlanta, GA"
pickup_datetime = "2025-08-20T08:00:00"
delivery_datetime = "2025-08-21T17:00:00"
equipment_type = "Dry Van"
loadboard_rate = 2000.0
miles = 781

[[loads]]
load_id = "L1002"
origin = "Houston, TX"
destination = "Atlanta, GA"
pickup_datetime = "2025-08-22T09:00:00"
delivery_datetime = "2025-08-23T12:00:00"
equipment_type = "Dry Van"
loadboard_rate = 1800.0
"#;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join(".git")).unwrap();
        Self { dir }
    }

    fn with_config(body: &str) -> Self {
        let ws = Self::new();
        let config_dir = ws.dir.path().join(".loadbroker");
        fs::create_dir(&config_dir).unwrap();
        fs::write(config_dir.join("config.toml"), body).unwrap();
        ws
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("loadbroker"));
        cmd.current_dir(self.dir.path())
            .env_remove("LOADBROKER_HOME")
            .env_remove("LOADBROKER_ADVISORY_BUDGET")
            .env_remove("FMCSA_WEBKEY")
            .env_remove("RUST_LOG")
            .stdin(Stdio::null());
        cmd
    }
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&output).unwrap()
}

#[test]
fn test_version_and_help() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("loadbroker"));
    ws.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("negotiate"))
        .stdout(predicate::str::contains("search-loads"));
}

#[test]
fn test_negotiate_json_counter() {
    let ws = Workspace::new();
    let json = stdout_json(ws.cmd().args([
        "negotiate",
        "--board-rate",
        "2000",
        "--offer",
        "2500",
        "--json",
    ]));

    assert_eq!(json["status"], "counter");
    assert_eq!(json["target_rate"], 2400.0);
    assert_eq!(json["handoff"], false);
    assert_eq!(json["final"], false);
    assert_eq!(json["attempts"], 2);
    assert_eq!(json["message"], "I can do $2,400. Does that work?");
}

#[test]
fn test_negotiate_human_output() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["negotiate", "--board-rate", "2000", "--offer", "1900"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ACCEPT at $1,900"))
        .stdout(predicate::str::contains("provider: deterministic"));
}

#[test]
fn test_negotiate_by_load_id() {
    let ws = Workspace::with_config(CONFIG_WITH_LOADS);
    let json = stdout_json(ws.cmd().args([
        "negotiate",
        "--load-id",
        "L1002",
        "--offer",
        "1500",
        "--attempt",
        "2",
        "--json",
    ]));
    // 1500 + 1800 * 0.08 = 1644
    assert_eq!(json["status"], "counter");
    assert_eq!(json["target_rate"], 1644.0);
    assert_eq!(json["attempts"], 3);
}

#[test]
fn test_negotiate_error_exit_codes() {
    let ws = Workspace::with_config(CONFIG_WITH_LOADS);

    ws.cmd()
        .args(["negotiate", "--load-id", "L9999", "--offer", "1500"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("L9999"));

    ws.cmd()
        .args(["negotiate", "--board-rate", "0", "--offer", "1500"])
        .assert()
        .code(3);

    ws.cmd()
        .args(["negotiate", "--board-rate", "2000", "--offer", "1500", "--attempt", "4"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("attempt"));

    ws.cmd()
        .args(["negotiate", "--offer", "1500"])
        .assert()
        .code(2);
}

#[test]
fn test_simulate_runs_until_terminal() {
    let ws = Workspace::new();
    let json = stdout_json(ws.cmd().args([
        "simulate",
        "--board-rate",
        "2000",
        "--offer",
        "2500",
        "--json",
    ]));

    let rounds = json["rounds"].as_array().unwrap();
    assert_eq!(rounds.len(), 3);
    assert_eq!(rounds[0]["target_rate"], 2400.0);
    // min(2500 - 160, 2360)
    assert_eq!(rounds[1]["target_rate"], 2340.0);
    assert_eq!(rounds[2]["status"], "reject");

    assert_eq!(json["outcome"]["status"], "reject");
    assert_eq!(json["outcome"]["final"], true);
    assert_eq!(json["call"]["call_outcome"], "simulated");
    assert_eq!(json["call"]["counter_offer_amount"], 2340.0);
    assert_eq!(json["call"]["final_rate"], 2000.0);
}

#[test]
fn test_simulate_respects_max_attempts_flag() {
    let ws = Workspace::new();
    let json = stdout_json(ws.cmd().args([
        "simulate",
        "--board-rate",
        "2000",
        "--offer",
        "1500",
        "--max-attempts",
        "2",
        "--json",
    ]));
    assert_eq!(json["rounds"].as_array().unwrap().len(), 2);
    assert_eq!(json["outcome"]["status"], "reject");
}

#[test]
fn test_search_loads() {
    let ws = Workspace::with_config(CONFIG_WITH_LOADS);
    let json = stdout_json(ws.cmd().args([
        "search-loads",
        "--origin",
        "tx",
        "--destination",
        "atlanta",
        "--equipment-type",
        "van",
        "--json",
    ]));
    let ids: Vec<&str> = json
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["load_id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["L1001", "L1002"]);

    ws.cmd()
        .args([
            "search-loads",
            "--origin",
            "Denver",
            "--destination",
            "Atlanta",
            "--equipment-type",
            "Van",
        ])
        .assert()
        .code(4);

    ws.cmd()
        .args([
            "search-loads",
            "--origin",
            "D",
            "--destination",
            "Atlanta",
            "--equipment-type",
            "Van",
        ])
        .assert()
        .code(3);
}

#[test]
fn test_verify_carrier_mock() {
    let ws = Workspace::new();
    let json = stdout_json(ws.cmd().args(["verify-carrier", "--mc-number", "123456", "--json"]));
    assert_eq!(json["eligible"], true);
    assert_eq!(json["status"], "MOCK_SUCCESS");
    assert_eq!(json["carrier_name"], "Demo Carrier Inc.");

    ws.cmd()
        .args(["verify-carrier", "--mc-number", "12"])
        .assert()
        .code(3);
}

#[test]
fn test_record_call_from_file() {
    let ws = Workspace::new();
    let path = ws.dir.path().join("calls.json");
    fs::write(
        &path,
        r#"[
            {"carrier_name":"Acme","mc_number":"123456","offer_amount":"$1,900","final_rate":"$1,950","call_outcome":"booked"},
            {"mc_number":"654321","final_rate":1800,"counter_offer_amount":"","call_outcome":"declined"}
        ]"#,
    )
    .unwrap();

    let json = stdout_json(
        ws.cmd()
            .args(["record-call", "--file"])
            .arg(&path)
            .arg("--json"),
    );
    let events = json.as_array().unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0]["offer_amount"], 1900.0);
    assert_eq!(events[0]["final_rate"], 1950.0);
    assert!(events[1]["counter_offer_amount"].is_null());
    assert!(events[1]["timestamp"].is_string());

    fs::write(&path, r#"{"final_rate":1800}"#).unwrap();
    ws.cmd()
        .args(["record-call", "--file"])
        .arg(&path)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("call_outcome"));
}

#[test]
fn test_config_command_shows_sources() {
    let ws = Workspace::with_config("[policy]\naccept_within = 0.05\n");
    let json = stdout_json(ws.cmd().args(["config", "--json", "--no-advisory"]));

    assert_eq!(json["accept_within"]["value"], "0.05");
    assert_eq!(json["accept_within"]["source"], "config");
    assert_eq!(json["advisory_enabled"]["source"], "cli");
    assert_eq!(json["max_attempts"]["source"], "default");
}

#[test]
fn test_invalid_config_exits_with_cli_args_code() {
    let ws = Workspace::with_config("[policy]\nnegotiate_within = 3.0\n");
    ws.cmd()
        .args(["negotiate", "--board-rate", "2000", "--offer", "1900"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("negotiate_within"));
}
