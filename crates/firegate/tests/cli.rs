//! CLI smoke tests.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const REQUIRED_ENV: [&str; 4] = [
    "FIREFLY_III_API_URL",
    "FIREFLY_III_CLIENT_ID",
    "FIREFLY_III_CLIENT_SECRET",
    "SESSION_SECRET",
];

/// A `firegate` invocation isolated from the host's config and environment.
fn firegate(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("firegate").unwrap();
    cmd.current_dir(dir.path())
        .env("FIREGATE_CONFIG_DIR", dir.path().join("user"))
        .env_remove("FIREGATE_CONFIG");
    for key in REQUIRED_ENV {
        cmd.env_remove(key);
    }
    cmd
}

fn write_config(dir: &TempDir) -> std::path::PathBuf {
    let path = dir.path().join("firegate.toml");
    fs::write(
        &path,
        r#"
[upstream]
base_url = "https://firefly.example.com"

[oauth]
client_id = "7"
client_secret = "file-client-secret"

[session]
secret = "0123456789abcdef0123456789abcdef"
"#,
    )
    .unwrap();
    path
}

#[test]
fn test_help() {
    let dir = TempDir::new().unwrap();
    firegate(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_check_fails_without_required_settings() {
    let dir = TempDir::new().unwrap();
    firegate(&dir)
        .args(["config", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("FIREFLY_III_API_URL"));
}

#[test]
fn test_check_passes_with_project_file() {
    let dir = TempDir::new().unwrap();
    write_config(&dir);

    firegate(&dir)
        .args(["config", "check"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration OK"));
}

#[test]
fn test_check_passes_with_environment() {
    let dir = TempDir::new().unwrap();
    firegate(&dir)
        .args(["config", "check"])
        .env("FIREFLY_III_API_URL", "https://firefly.example.com")
        .env("FIREFLY_III_CLIENT_ID", "7")
        .env("FIREFLY_III_CLIENT_SECRET", "env-client-secret")
        .env("SESSION_SECRET", "0123456789abcdef0123456789abcdef")
        .assert()
        .success();
}

#[test]
fn test_show_redacts_secrets() {
    let dir = TempDir::new().unwrap();
    write_config(&dir);

    firegate(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("https://firefly.example.com"))
        .stdout(predicate::str::contains("file-client-secret").not())
        .stdout(predicate::str::contains("0123456789abcdef0123456789abcdef").not());
}

#[test]
fn test_missing_explicit_config_file() {
    let dir = TempDir::new().unwrap();
    firegate(&dir)
        .args(["--config", "missing.toml", "config", "check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing.toml"));
}
