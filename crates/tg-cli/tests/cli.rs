//! CLI command integration tests.
//! Each test runs inside its own temp directory with TG_CONFIG unset.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const TEXT: &str = "The cat sat on the mat. The other cat sat near the hat. \
    A bat flew past the flat roof where rats chased cats.";

fn tg_cmd(dir: &TempDir) -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("tg").unwrap();
    cmd.current_dir(dir.path());
    cmd.env_remove("TG_CONFIG");
    cmd
}

fn write_input(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("input.txt");
    std::fs::write(&path, TEXT).unwrap();
    path
}

fn parse_edges(stdout: &[u8]) -> Vec<serde_json::Value> {
    let value: serde_json::Value = serde_json::from_slice(stdout).unwrap();
    value.as_array().cloned().expect("edge list is a JSON array")
}

#[test]
fn build_prints_edge_array() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir);

    let output = tg_cmd(&dir).arg("build").arg(&input).output().unwrap();
    assert!(output.status.success());
    let edges = parse_edges(&output.stdout);
    let ring = edges
        .iter()
        .filter(|e| e["type"] == "adjacency:base")
        .count();
    assert_eq!(ring, 24);
    for e in &edges {
        assert!(e["sourceIndex"].as_u64().unwrap() < e["targetIndex"].as_u64().unwrap());
    }
}

#[test]
fn build_reads_stdin() {
    let dir = TempDir::new().unwrap();
    tg_cmd(&dir)
        .args(["build", "--max-layers", "0"])
        .write_stdin("alpha beta gamma delta")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"sourceLabel\":\"alpha\""))
        .stdout(predicate::str::contains("adjacency:layer").not());
}

#[test]
fn build_pretty_is_indented() {
    let dir = TempDir::new().unwrap();
    tg_cmd(&dir)
        .args(["build", "--pretty"])
        .write_stdin("one two three")
        .assert()
        .success()
        .stdout(predicate::str::contains("\n  {"));
}

#[test]
fn single_token_yields_empty_list() {
    let dir = TempDir::new().unwrap();
    tg_cmd(&dir)
        .arg("build")
        .write_stdin("lonely")
        .assert()
        .success()
        .stdout(predicate::str::diff("[]\n"));
}

#[test]
fn stats_reports_levels() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir);
    tg_cmd(&dir)
        .arg("stats")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("tokens:     24"))
        .stdout(predicate::str::contains("level 0:    24 edges, max degree 2"))
        .stdout(predicate::str::contains("oracle:     calls="));
}

#[test]
fn dedupe_collapses_repeats() {
    let dir = TempDir::new().unwrap();
    tg_cmd(&dir)
        .args(["stats", "--dedupe"])
        .write_stdin("the cat the cat the dog")
        .assert()
        .success()
        .stdout(predicate::str::contains("tokens:     3"));
}

#[test]
fn check_passes_on_clean_build() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir);
    tg_cmd(&dir)
        .args(["check", "--threshold", "0.2", "--degree", "3", "--degree", "2"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ok:"));
}

#[test]
fn max_edges_flag_caps_output() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir);
    let output = tg_cmd(&dir)
        .args(["build", "--max-edges", "25", "--threshold", "0"])
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(parse_edges(&output.stdout).len() <= 25);
}

#[test]
fn config_file_is_applied() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir);
    let config = dir.path().join("graph.toml");
    std::fs::write(&config, "[graph]\nmax_layers = 0\n").unwrap();

    let output = tg_cmd(&dir)
        .arg("build")
        .arg("--config")
        .arg(&config)
        .arg(&input)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(parse_edges(&output.stdout).len(), 24);
}

#[test]
fn working_directory_config_and_flag_override() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir);
    std::fs::write(dir.path().join("tg.toml"), "[graph]\nmax_layers = 0\n").unwrap();

    tg_cmd(&dir)
        .arg("stats")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("layers:     0"));

    tg_cmd(&dir)
        .args(["stats", "--max-layers", "2"])
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("layers:     2"));
}

#[test]
fn env_config_is_applied() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir);
    let config = dir.path().join("env.toml");
    std::fs::write(&config, "[graph]\nmax_layers = 1\n").unwrap();

    tg_cmd(&dir)
        .env("TG_CONFIG", &config)
        .arg("stats")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("layers:     1"));
}

#[test]
fn mistyped_config_fields_use_defaults() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir);
    std::fs::write(
        dir.path().join("tg.toml"),
        "[graph]\nmax_layers = 2.5\nsimilarity_threshold = \"high\"\n",
    )
    .unwrap();

    tg_cmd(&dir)
        .arg("stats")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("layers:     2"));
}

#[test]
fn missing_config_file_fails() {
    let dir = TempDir::new().unwrap();
    tg_cmd(&dir)
        .args(["build", "--config", "does-not-exist.toml"])
        .write_stdin("a b c")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}

#[test]
fn invalid_config_file_fails() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("tg.toml"), "[graph\n").unwrap();
    tg_cmd(&dir)
        .arg("build")
        .write_stdin("a b c")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load config"));
}

#[test]
fn missing_input_file_fails() {
    let dir = TempDir::new().unwrap();
    tg_cmd(&dir)
        .args(["build", "nope.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read nope.txt"));
}
