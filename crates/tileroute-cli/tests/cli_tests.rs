//! Integration tests for the route runner binary.
//!
//! These tests use `assert_cmd` against the fixture configuration to check
//! the statistics record on stdout and the exit status per outcome.

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const MARKET_WEST: &str = "40.0,-74.999";
const MARKET_EAST: &str = "40.0,-74.941";
const ISLAND: &str = "48.0,-69.995";

fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../docs/fixtures")
        .canonicalize()
        .expect("fixtures present")
}

fn cli() -> Command {
    let mut cmd = cargo_bin_cmd!("tileroute-cli");
    cmd.env("RUST_LOG", "error");
    cmd
}

fn route(origin: &str, destination: &str, mode: &str) -> Command {
    let mut cmd = cli();
    cmd.arg(fixtures_dir().join("config.json"))
        .args(["-o", origin, "-d", destination, "-t", mode]);
    cmd
}

#[test]
fn successful_route_prints_csv_record() {
    route(MARKET_WEST, MARKET_EAST, "auto")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            "40.000000,-74.999000,40.000000,-74.941000,success,1,",
        ))
        .stdout(predicate::str::ends_with(",2\n"));
}

#[test]
fn json_format_prints_named_fields() {
    route(MARKET_WEST, MARKET_EAST, "auto")
        .args(["--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""outcome":"success""#))
        .stdout(predicate::str::contains(r#""pass_count":1"#));
}

#[test]
fn json_request_replaces_csv_arguments() {
    let request = r#"{"locations": [{"lat": 40.0, "lon": -74.999}, {"lat": 40.0, "lon": -74.941}],
                      "costing": "bicycle", "directions_options": {"units": "kilometers"}}"#;
    cli()
        .arg(fixtures_dir().join("config.json"))
        .args(["--json", request])
        .assert()
        .success()
        .stdout(predicate::str::contains(",success,1,"));
}

#[test]
fn no_connectivity_fails_with_zero_passes() {
    route(MARKET_WEST, ISLAND, "auto")
        .arg("--connectivity")
        .assert()
        .failure()
        .stdout(predicate::str::contains(",fail_no_connectivity,0,"));
}

#[test]
fn unreachable_destination_is_reported_but_not_fatal() {
    route(MARKET_WEST, ISLAND, "auto")
        .assert()
        .success()
        .stdout(predicate::str::contains(",fail_unreachable_dest,2,"));
}

#[test]
fn waypoint_without_edges_is_an_invalid_origin() {
    route("0.0,0.0", MARKET_EAST, "auto")
        .assert()
        .failure()
        .stdout(predicate::str::contains(",fail_invalid_origin,0,"));
}

#[test]
fn unconfigured_mode_fails_before_searching() {
    let temp = TempDir::new().expect("create temp dir");
    let config = temp.path().join("config.json");
    fs::write(
        &config,
        format!(
            r#"{{"graph": {{"path": "{}"}}, "costing_options": {{"auto": {{}}}}}}"#,
            fixtures_dir().join("graph.json").display()
        ),
    )
    .expect("write config");

    cli()
        .arg(&config)
        .args(["-o", MARKET_WEST, "-d", MARKET_EAST, "-t", "pedestrian"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("no costing method found for 'pedestrian'"));
}

#[test]
fn bad_coordinates_are_rejected() {
    route("95.0,-75.0", MARKET_EAST, "auto")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid location"));
}

#[test]
fn missing_config_file_is_reported() {
    cli()
        .arg("/nonexistent/tileroute.json")
        .args(["-o", MARKET_WEST, "-d", MARKET_EAST, "-t", "auto"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load configuration"));
}

#[test]
fn locations_are_required_without_json() {
    cli()
        .arg(fixtures_dir().join("config.json"))
        .args(["-t", "auto"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--origin"));
}
