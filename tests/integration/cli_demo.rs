#![allow(missing_docs)]

use std::fs;
use std::path::PathBuf;

use assert_cmd::cargo::cargo_bin_cmd;
use serde_json::Value;
use tempfile::TempDir;

fn write_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("config.toml");
    fs::write(&path, contents).expect("write config");
    (dir, path)
}

fn stdout_of(args: &[&str]) -> String {
    let (_dir, config) = write_config("");
    let output = cargo_bin_cmd!("pagetree")
        .arg("--config")
        .arg(&config)
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    String::from_utf8(output).expect("utf8 stdout")
}

fn load_json(args: &[&str], config: &str) -> Value {
    let (_dir, path) = write_config(config);
    let output = cargo_bin_cmd!("pagetree")
        .arg("--config")
        .arg(&path)
        .args(["--theme", "plain", "load", "--format", "json"])
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("valid json")
}

#[test]
fn demo_walks_every_section() {
    let out = stdout_of(&["--theme", "plain", "demo"]);
    for section in 1..=12 {
        assert!(out.contains(&format!("[{section}]")), "missing section {section}");
    }
    assert!(out.contains("size: 62"));
    assert!(out.contains("'A': 169"));
    assert!(out.contains("'m': 3600"));
    assert!(out.contains("0 = missing): 0"));
    assert!(out.contains("first key > 'm': n -> 3721"));
    assert!(out.contains("remove('C', 3): ok"));
    assert!(out.contains("source size after move: 0"));
    assert!(out.contains("A < B: true"));
    assert!(out.contains("B > A: true"));
    assert!(out.contains("demo finished"));
}

#[test]
fn demo_forward_iteration_starts_with_smallest_keys() {
    let out = stdout_of(&["--theme", "plain", "demo"]);
    assert!(out.contains("0(729) 1(1) 2(16) "));
    assert!(out.contains("IN [lvl="));
    assert!(out.contains("visited: 62"));
}

#[test]
fn load_reports_json_shape() {
    let json = load_json(&["5", "3", "8", "1", "--remove", "3", "--remove", "42"], "");
    assert_eq!(json["inserted"].as_u64(), Some(4));
    assert_eq!(json["removed"].as_u64(), Some(1));
    assert_eq!(json["missing"].as_u64(), Some(1));
    assert_eq!(json["len"].as_u64(), Some(3));
    assert_eq!(json["height"].as_u64(), Some(1));
    assert_eq!(json["shape"]["pages"].as_u64(), Some(1));
    assert_eq!(json["options"]["order"].as_u64(), Some(3));
    assert_eq!(json["stats"]["removes"].as_u64(), Some(1));
}

#[test]
fn load_random_is_seeded() {
    let first = load_json(&["--random", "300", "--seed", "7"], "");
    let second = load_json(&["--random", "300", "--seed", "7"], "");
    assert_eq!(first["len"].as_u64(), Some(300));
    assert_eq!(first["stats"], second["stats"]);
    assert!(first["height"].as_u64().unwrap_or(0) >= 3);
}

#[test]
fn config_file_sets_tree_options() {
    let json = load_json(&["1", "1", "2"], "[tree]\norder = 4\nunique_keys = false\n");
    assert_eq!(json["options"]["order"].as_u64(), Some(4));
    assert_eq!(json["options"]["unique_keys"].as_bool(), Some(false));
    assert_eq!(json["inserted"].as_u64(), Some(3));
    assert_eq!(json["rejected"].as_u64(), Some(0));
}

#[test]
fn flags_override_config_file() {
    let (_dir, path) = write_config("[tree]\norder = 4\n");
    let output = cargo_bin_cmd!("pagetree")
        .env("PAGETREE_CONFIG", &path)
        .args(["--order", "5", "load", "--format", "json", "1", "1"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let json: Value = serde_json::from_slice(&output).expect("valid json");
    assert_eq!(json["options"]["order"].as_u64(), Some(5));
    assert_eq!(json["rejected"].as_u64(), Some(1));
}

#[test]
fn text_load_prints_pages() {
    let out = stdout_of(&["load", "1", "2", "3", "4", "5", "6"]);
    assert!(out.contains("level 0 page #"));
    assert!(out.contains("  level 1 page #"));
    assert!(out.contains("invariants verified"));
}

#[test]
fn order_below_minimum_fails() {
    let (_dir, path) = write_config("");
    let assert = cargo_bin_cmd!("pagetree")
        .arg("--config")
        .arg(&path)
        .args(["--order", "2", "demo"])
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("order must be >= 3"), "stderr: {stderr}");
}

#[test]
fn invalid_config_is_reported() {
    let (_dir, path) = write_config("[tree]\norder = 1\n");
    let assert = cargo_bin_cmd!("pagetree")
        .arg("--config")
        .arg(&path)
        .arg("demo")
        .assert()
        .failure();
    let stderr = String::from_utf8_lossy(&assert.get_output().stderr).into_owned();
    assert!(stderr.contains("invalid [tree] table"), "stderr: {stderr}");
}

#[test]
fn help_lists_subcommands_and_ui_flags() {
    let out = stdout_of(&["--help"]);
    assert!(out.contains("demo"));
    assert!(out.contains("load"));
    assert!(out.contains("--theme"));
    assert!(out.contains("--config"));
}
