//! Tests for the reamerge command line
//!
//! Every command runs inside a temporary directory with the user config
//! directory pointed there too, so no local config leaks in.

mod common;

use assert_cmd::Command;
use common::Workspace;
use predicates::prelude::*;

fn reamerge(ws: &Workspace) -> Command {
    let mut cmd = Command::cargo_bin("reamerge").unwrap();
    cmd.current_dir(ws.path())
        .env("XDG_CONFIG_HOME", ws.path().join("xdg"))
        .env_remove("RUST_LOG")
        .env_remove("REAMERGE_GAP")
        .env_remove("REAMERGE_THRESHOLD")
        .env_remove("REAMERGE_ALIGN_LANES")
        .env_remove("REAMERGE_TEMPLATE")
        .env_remove("REAMERGE_LOG_LEVEL");
    cmd
}

#[test]
fn inspect_summarizes_session() {
    let ws = Workspace::new();
    let take = ws.take("take1");

    reamerge(&ws)
        .arg("inspect")
        .arg(&take)
        .assert()
        .success()
        .stdout(predicate::str::contains("take1"))
        .stdout(predicate::str::contains("120 BPM 4/4"))
        .stdout(predicate::str::contains("2 (2 with media)"))
        .stdout(predicate::str::contains("8 measures"));
}

#[test]
fn plan_prints_offsets_as_json() {
    let ws = Workspace::new();
    let a = ws.take("take1");
    let b = ws.take("take2");

    let output = reamerge(&ws)
        .args(["plan", "--json"])
        .arg(&a)
        .arg(&b)
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows[0]["measure"], 0);
    assert_eq!(rows[1]["measure"], 10);
    assert_eq!(rows[1]["time"], 20.0);
}

#[test]
fn gap_comes_from_flag_then_config() {
    let ws = Workspace::new();
    let a = ws.take("take1");
    let b = ws.take("take2");
    ws.write("reamerge.toml", "[merge]\ngap_measures = 4\n");

    reamerge(&ws)
        .arg("plan")
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("total: 24 measures"));

    reamerge(&ws)
        .args(["plan", "--gap", "0"])
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("total: 16 measures"));
}

#[test]
fn match_shows_assignment_matrix() {
    let ws = Workspace::new();
    let template = ws.template();
    let take = ws.take("take1");

    reamerge(&ws)
        .arg("match")
        .arg("--template")
        .arg(&template)
        .arg(&take)
        .assert()
        .success()
        .stdout(predicate::str::contains("Kick In"))
        .stdout(predicate::str::contains("Snare Top"))
        .stdout(predicate::str::contains("2 tracks matched"));
}

#[test]
fn alias_flag_redirects_a_source() {
    let ws = Workspace::new();
    let template = ws.template();
    let take = ws.take("take1");

    let output = reamerge(&ws)
        .args(["match", "--json", "--alias", "Snare*=Bass", "--template"])
        .arg(&template)
        .arg(&take)
        .output()
        .unwrap();
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(rows[3]["destination"], "Bass");
    assert_eq!(rows[3]["sessions"][0]["source"], "Snare Top");
    assert!(rows[2]["sessions"][0].is_null());
}

#[test]
fn merge_writes_project() {
    let ws = Workspace::new();
    let template = ws.template();
    let a = ws.take("take1");
    let b = ws.take("take2");
    let out = ws.path().join("merged.rpp");

    reamerge(&ws)
        .arg("merge")
        .arg("--template")
        .arg(&template)
        .arg("--output")
        .arg(&out)
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 destinations processed, 0 skipped"));

    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.contains("POSITION 20\n"));
    assert!(text.contains("POSITION 20.5\n"));
}

#[test]
fn merge_without_template_fails() {
    let ws = Workspace::new();
    let a = ws.take("take1");

    reamerge(&ws)
        .args(["merge", "--output", "out.rpp"])
        .arg(&a)
        .assert()
        .failure()
        .stderr(predicate::str::contains("No template given"));
}

#[test]
fn missing_session_fails_with_path() {
    let ws = Workspace::new();

    reamerge(&ws)
        .args(["inspect", "nowhere.rpp"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nowhere.rpp"));
}

#[test]
fn bad_alias_is_rejected() {
    let ws = Workspace::new();
    let template = ws.template();
    let a = ws.take("take1");

    reamerge(&ws)
        .args(["match", "--alias", "no-separator", "--template"])
        .arg(&template)
        .arg(&a)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no-separator"));
}

#[test]
fn config_shows_layered_values_and_sources() {
    let ws = Workspace::new();
    ws.write("xdg/reamerge/config.toml", "[merge]\ngap_measures = 4\n[aliases]\n\"Gtr*\" = \"Guitars\"\n");
    ws.write("reamerge.toml", "[merge]\ngap_measures = 2\n[aliases]\n\"Kick*\" = \"Kick\"\n");

    let output = reamerge(&ws)
        .env("REAMERGE_THRESHOLD", "0.7")
        .arg("config")
        .output()
        .unwrap();
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();

    let body: String = text.lines().filter(|l| !l.starts_with('#')).collect::<Vec<_>>().join("\n");
    let parsed: mergeconf::MergeConfig = toml::from_str(&body).unwrap();
    assert_eq!(parsed.merge.gap_measures, 2);
    assert_eq!(parsed.matching.threshold, 0.7);
    let patterns: Vec<&str> = parsed.aliases.keys().map(String::as_str).collect();
    assert_eq!(patterns, vec!["Kick*", "Gtr*"]);

    assert!(text.contains("# from reamerge.toml"), "{text}");
    assert!(text.contains("# overridden by $REAMERGE_THRESHOLD"), "{text}");
}

#[test]
fn config_as_json_lists_sources() {
    let ws = Workspace::new();
    ws.write("reamerge.toml", "[logging]\nlevel = \"debug\"\n");

    let output = reamerge(&ws).args(["config", "--json"]).output().unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["config"]["logging"]["level"], "debug");
    assert_eq!(report["sources"]["files"][0], "reamerge.toml");
}
