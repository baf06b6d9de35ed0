use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn statex(config_home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("statex").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home);
    cmd
}

fn write_garbage_pdf(dir: &Path, name: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, b"this is not a pdf").unwrap();
    path
}

#[test]
fn test_missing_input() {
    let home = TempDir::new().unwrap();
    statex(home.path())
        .args(["process", "does-not-exist.pdf"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_unreadable_pdf_yields_empty_payload() {
    let home = TempDir::new().unwrap();
    let pdf = write_garbage_pdf(home.path(), "broken.pdf");

    statex(home.path())
        .arg("process")
        .arg(&pdf)
        .arg("--show-report")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"transactions\": []"))
        .stdout(predicate::str::contains("\"currency\": \"GEL\""))
        .stdout(predicate::str::contains("\"currencyDetectionMethod\": \"default\""))
        .stderr(predicate::str::contains("Chosen set: none"));
}

#[test]
fn test_csv_output_to_file() {
    let home = TempDir::new().unwrap();
    let pdf = write_garbage_pdf(home.path(), "broken.pdf");
    let out = home.path().join("out.csv");

    statex(home.path())
        .arg("process")
        .arg(&pdf)
        .args(["--format", "csv", "--output"])
        .arg(&out)
        .assert()
        .success()
        .stdout(predicate::str::contains("0 transactions written to"));

    let content = fs::read_to_string(&out).unwrap();
    assert_eq!(
        content.trim(),
        "date,description,translated_description,amount,currency,category,confidence"
    );
}

#[test]
fn test_config_init_and_get() {
    let home = TempDir::new().unwrap();
    let config_path = home.path().join("custom.json");

    statex(home.path())
        .args(["config", "init", "--output"])
        .arg(&config_path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));
    assert!(config_path.exists());

    statex(home.path())
        .arg("--config")
        .arg(&config_path)
        .args(["config", "get", "extraction.default_currency"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"GEL\""));

    statex(home.path())
        .args(["config", "init", "--output"])
        .arg(&config_path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn test_config_set_default_location() {
    let home = TempDir::new().unwrap();

    statex(home.path())
        .args(["config", "set", "extraction.text_fallback", "false"])
        .assert()
        .success();
    assert!(home.path().join("statex").join("config.json").exists());

    statex(home.path())
        .args(["config", "get", "extraction.text_fallback"])
        .assert()
        .success()
        .stdout(predicate::str::contains("false"));

    statex(home.path())
        .args(["config", "set", "extraction.no_such_key", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}

#[test]
fn test_config_get_unknown_key() {
    let home = TempDir::new().unwrap();
    statex(home.path())
        .args(["config", "get", "classifier.nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration key not found"));
}

#[test]
fn test_batch_no_matches() {
    let home = TempDir::new().unwrap();
    let pattern = home.path().join("*.pdf");

    statex(home.path())
        .arg("batch")
        .arg(pattern.to_str().unwrap())
        .assert()
        .failure()
        .stderr(predicate::str::contains("No matching files found"));
}

#[test]
fn test_batch_writes_outputs_and_summary() {
    let home = TempDir::new().unwrap();
    let inputs = home.path().join("in");
    fs::create_dir_all(&inputs).unwrap();
    write_garbage_pdf(&inputs, "march.pdf");
    write_garbage_pdf(&inputs, "april.pdf");
    fs::write(inputs.join("notes.txt"), "ignored").unwrap();
    let out_dir = home.path().join("out");

    statex(home.path())
        .arg("batch")
        .arg(inputs.join("*").to_str().unwrap())
        .arg("--output-dir")
        .arg(&out_dir)
        .args(["--summary", "-j", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Found 2 files"))
        .stdout(predicate::str::contains("with no transactions"));

    assert!(out_dir.join("march.json").exists());
    assert!(out_dir.join("april.json").exists());

    let summary = fs::read_to_string(out_dir.join("summary.csv")).unwrap();
    let mut lines = summary.lines();
    assert!(lines.next().unwrap().starts_with("filename,status,transactions"));
    // rows follow input order
    assert!(lines.next().unwrap().starts_with("april.pdf,success,0,GEL,0.40"));
    assert!(lines.next().unwrap().starts_with("march.pdf,success,0,GEL,0.40"));
}
