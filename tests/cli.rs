use assert_cmd::Command;
use predicates::str::contains;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn cmd() -> Command {
    let mut cmd = Command::cargo_bin("geodiff").unwrap();
    cmd.env("NO_COLOR", "1").env_remove("RUST_LOG");
    cmd
}

fn write_config(dir: &Path, host: &str, countries: &[&str]) -> PathBuf {
    let path = dir.join("config.json");
    let config = json!({
        "countries": countries,
        "proxy": {
            "host": host,
            "port": "22225",
            "username": "customer",
            "password": "secret"
        }
    });
    fs::write(&path, serde_json::to_string_pretty(&config).unwrap()).unwrap();
    path
}

#[test]
fn missing_config_writes_template_and_fails() {
    let tmp = TempDir::new().unwrap();
    let config = tmp.path().join("geodiff").join("config.json");

    cmd()
        .arg("--config")
        .arg(&config)
        .assert()
        .code(2)
        .stderr(contains("default config created"));

    let template: serde_json::Value = serde_json::from_str(&fs::read_to_string(&config).unwrap()).unwrap();
    assert_eq!(template["proxy"]["host"], "example.com");
    assert_eq!(template["countries"], json!(["cn", "in", "us", "jp", "de"]));
}

#[test]
fn placeholder_credentials_are_rejected() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), "example.com", &["us", "de"]);

    cmd()
        .arg("--config")
        .arg(&config)
        .assert()
        .code(2)
        .stderr(contains("default proxy credentials"));
}

#[test]
fn invalid_country_in_config_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), "proxy.test", &["us", "usa"]);

    cmd()
        .arg("--config")
        .arg(&config)
        .assert()
        .code(2)
        .stderr(contains("invalid country code: usa"));
}

#[test]
fn invalid_country_override_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), "proxy.test", &["us", "de"]);

    cmd()
        .arg("--config")
        .arg(&config)
        .args(["--countries", "us,x1"])
        .assert()
        .code(2)
        .stderr(contains("invalid country code: x1"));
}

#[test]
fn empty_input_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), "proxy.test", &["us", "de"]);
    let input = tmp.path().join("urls.txt");
    fs::write(&input, "\n   \n").unwrap();

    cmd()
        .arg("--config")
        .arg(&config)
        .arg("--input")
        .arg(&input)
        .assert()
        .code(2)
        .stderr(contains("no valid URLs found in input"));
}

#[test]
fn missing_input_file_is_rejected() {
    let tmp = TempDir::new().unwrap();
    let config = write_config(tmp.path(), "proxy.test", &["us", "de"]);

    cmd()
        .arg("--config")
        .arg(&config)
        .arg("--input")
        .arg(tmp.path().join("nope.txt"))
        .assert()
        .code(2)
        .stderr(contains("opening input file"));
}

#[test]
fn zero_concurrency_is_a_usage_error() {
    cmd().args(["-c", "0"]).assert().failure();
}

#[test]
fn help_mentions_verification() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("--verify"))
        .stdout(contains("--concurrency"));
}
