// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(clippy::unwrap_used, clippy::expect_used)]
//! End-to-end runs of the `transit` binary against the reference network.

use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use tempfile::TempDir;
use transit_core::{FeatureType, Network};
use transit_dry_tests::{reference_network, reference_state, station, AlterationBuilder};

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let ws = Self {
            dir: tempfile::tempdir().unwrap(),
        };
        ws.write("network.json", &reference_network().unwrap());
        ws.write("seed.json", &reference_state());
        ws
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write<T: serde::Serialize>(&self, name: &str, value: &T) {
        let bytes = serde_json::to_vec(value).unwrap();
        std::fs::write(self.path(name), bytes).unwrap();
    }

    /// `transit` with an isolated config dir and no ambient log filter.
    fn transit(&self) -> Command {
        let mut cmd = Command::cargo_bin("transit").unwrap();
        cmd.env_remove("RUST_LOG")
            .arg("--config-dir")
            .arg(self.path("config"));
        cmd
    }

    /// `transit <sub> --network network.json --seed seed.json`.
    fn against_seed(&self, sub: &str) -> Command {
        let mut cmd = self.transit();
        cmd.arg(sub)
            .arg("--network")
            .arg(self.path("network.json"))
            .arg("--seed")
            .arg(self.path("seed.json"));
        cmd
    }
}

fn stdout_json(cmd: &mut Command) -> Value {
    let out = cmd.assert().success().get_output().stdout.clone();
    serde_json::from_slice(&out).unwrap()
}

#[test]
fn inspect_tabulates_the_ledger() {
    let ws = Workspace::new();
    ws.transit()
        .arg("inspect")
        .arg("--network")
        .arg(ws.path("network.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("network n1 (8 x 4), 3 alterations"))
        .stdout(predicate::str::contains("2020-03-01T00:00:00Z"))
        .stdout(predicate::str::contains("warning").not());
}

#[test]
fn inspect_flags_out_of_order_dates() {
    let ws = Workspace::new();
    let mut network: Network = reference_network().unwrap();
    network
        .ledger
        .append(AlterationBuilder::new("late", "2019-12-31T00:00:00Z").build())
        .unwrap();
    ws.write("network.json", &network);
    ws.transit()
        .arg("inspect")
        .arg("--network")
        .arg(ws.path("network.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("warning:"))
        .stdout(predicate::str::contains("late"));
}

#[test]
fn inspect_flags_alterations_without_edits() {
    let ws = Workspace::new();
    let mut network = reference_network().unwrap();
    network
        .ledger
        .append(AlterationBuilder::new("noop", "2020-04-01T00:00:00Z").build())
        .unwrap();
    ws.write("network.json", &network);
    ws.transit()
        .arg("inspect")
        .arg("--network")
        .arg(ws.path("network.json"))
        .assert()
        .success()
        .stdout(predicate::str::contains("warning: alteration noop carries no edits"))
        .stdout(predicate::str::contains("is dated").not());
}

#[test]
fn networks_repeating_an_alteration_id_are_refused() {
    let ws = Workspace::new();
    let mut raw = serde_json::to_value(reference_network().unwrap()).unwrap();
    let ledger = raw["ledger"].as_array_mut().unwrap();
    ledger.push(ledger[0].clone());
    ws.write("network.json", &raw);
    ws.transit()
        .arg("inspect")
        .arg("--network")
        .arg(ws.path("network.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse network"))
        .stderr(predicate::str::contains("alteration a1 is already in the ledger"));
}

#[test]
fn replay_to_a_target_prints_the_hydrated_system() {
    let ws = Workspace::new();
    let sys = stdout_json(
        ws.against_seed("replay")
            .args(["--to", "a1", "--system", "sys1", "--compact"]),
    );
    let ids: Vec<&str> = sys["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["s1", "s2", "s3"]);
    assert_eq!(
        sys["lines"][0]["services"][0]["segments"][0]["nodes"][2]["type"],
        "geometry-node"
    );
}

#[test]
fn replay_without_target_reaches_the_frontier() {
    let ws = Workspace::new();
    let state = stdout_json(&mut ws.against_seed("replay"));
    assert_eq!(
        state["alterationStack"],
        serde_json::json!(["a1", "a2", "a3"])
    );
    assert_eq!(state["line"]["L1"]["color"], "#0a0");
}

#[test]
fn replay_of_unknown_system_fails() {
    let ws = Workspace::new();
    ws.against_seed("replay")
        .args(["--system", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("system nope does not exist"));
}

#[test]
fn lines_follow_the_ledger_position() {
    let ws = Workspace::new();
    ws.against_seed("lines")
        .args(["--system", "sys1", "--segment", "seg2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Red"))
        .stdout(predicate::str::contains("Blue"));

    ws.against_seed("lines")
        .args(["--to", "a2", "--system", "sys1", "--segment", "seg2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Red"))
        .stdout(predicate::str::contains("Blue").not());

    ws.against_seed("lines")
        .args(["--to", "a1", "--system", "sys1", "--segment", "seg2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no line of sys1 runs over seg2"));
}

#[test]
fn verify_round_trips_the_reference_ledger() {
    let ws = Workspace::new();
    ws.against_seed("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("ok: 3 alterations applied and rolled back"));
}

#[test]
fn verify_reports_the_failing_step() {
    let ws = Workspace::new();
    let mut network = reference_network().unwrap();
    let bad = AlterationBuilder::new("bad", "2020-04-01T00:00:00Z")
        .add(station("s9", 0.0, 0.0))
        .insert_after(FeatureType::Segment, "seg1", "nodes", "nowhere", "s9")
        .build();
    network.ledger.append(bad).unwrap();
    ws.write("network.json", &network);
    ws.against_seed("verify")
        .assert()
        .failure()
        .stderr(predicate::str::contains("ledger does not apply cleanly"));
}

#[test]
fn verify_without_seed_cannot_edit_missing_features() {
    let ws = Workspace::new();
    ws.transit()
        .arg("verify")
        .arg("--network")
        .arg(ws.path("network.json"))
        .assert()
        .failure();
}

#[test]
fn strict_verify_rejects_dangling_references() {
    let ws = Workspace::new();
    let mut network = reference_network().unwrap();
    let orphan = AlterationBuilder::new("orphan", "2020-04-01T00:00:00Z")
        .remove(station("s2", 2.0, 2.0))
        .build();
    network.ledger.append(orphan).unwrap();
    ws.write("network.json", &network);
    ws.against_seed("verify").assert().success();
    ws.against_seed("verify").arg("--strict").assert().failure();
}

#[test]
fn missing_network_file_is_reported() {
    let ws = Workspace::new();
    ws.transit()
        .args(["inspect", "--network"])
        .arg(ws.path("absent.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to open network"));
}

#[test]
fn preferences_are_persisted_and_honoured() {
    let ws = Workspace::new();
    ws.against_seed("verify").assert().success();
    let saved = std::fs::read(ws.path("config/transit_cli.json")).unwrap();
    let saved: Value = serde_json::from_slice(&saved).unwrap();
    assert_eq!(saved["pretty"], true);

    std::fs::write(ws.path("config/transit_cli.json"), br#"{"pretty": false}"#).unwrap();
    let out = ws
        .against_seed("replay")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.trim_end().lines().count(), 1);
}

#[test]
fn bad_log_filter_is_rejected() {
    let ws = Workspace::new();
    ws.transit()
        .args(["--log", "transit=loudest", "inspect", "--network"])
        .arg(ws.path("network.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid --log filter"));
}
