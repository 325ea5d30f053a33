//! CLI end-to-end tests
//!
//! Tests for the vidrelay command-line interface. None of these need
//! ffmpeg, yt-dlp or network access.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the vidrelay binary, isolated from any config or
/// token in the developer's environment.
#[allow(deprecated)]
fn vidrelay_cmd(cwd: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("vidrelay").unwrap();
    cmd.current_dir(cwd).env_remove("VIDRELAY_BOT_TOKEN");
    cmd
}

#[test]
fn test_cli_no_args_shows_help() {
    let temp = tempdir().unwrap();
    vidrelay_cmd(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let temp = tempdir().unwrap();
    vidrelay_cmd(temp.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("vidrelay"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    let temp = tempdir().unwrap();
    vidrelay_cmd(temp.path())
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "vidrelay {}",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn test_cli_send_help() {
    let temp = tempdir().unwrap();
    vidrelay_cmd(temp.path())
        .args(["send", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--caption"))
        .stdout(predicate::str::contains("--thumbnail"))
        .stdout(predicate::str::contains("--keep-source"))
        .stdout(predicate::str::contains("deleted"));
}

#[test]
fn test_cli_split_help() {
    let temp = tempdir().unwrap();
    vidrelay_cmd(temp.path())
        .args(["split", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"));
}

#[test]
fn test_cli_check_tools_command() {
    let temp = tempdir().unwrap();
    vidrelay_cmd(temp.path())
        .arg("check-tools")
        .assert()
        .success()
        .stdout(predicate::str::contains("ffmpeg"))
        .stdout(predicate::str::contains("yt-dlp"));
}

#[test]
fn test_cli_probe_nonexistent_file() {
    let temp = tempdir().unwrap();
    vidrelay_cmd(temp.path())
        .args(["probe", "/nonexistent/path/movie.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_send_nonexistent_file() {
    let temp = tempdir().unwrap();
    vidrelay_cmd(temp.path())
        .args(["send", "/nonexistent/path/movie.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_split_nonexistent_file() {
    let temp = tempdir().unwrap();
    vidrelay_cmd(temp.path())
        .args(["split", "--dry-run", "/nonexistent/path/movie.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}

#[test]
fn test_cli_send_without_destination() {
    let temp = tempdir().unwrap();
    let video = temp.path().join("clip.mp4");
    fs::write(&video, b"data").unwrap();

    vidrelay_cmd(temp.path())
        .args(["send", video.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("chat_id"));
}

#[test]
fn test_cli_send_without_token() {
    let temp = tempdir().unwrap();
    let video = temp.path().join("clip.mp4");
    fs::write(&video, b"data").unwrap();
    let config_file = temp.path().join("vidrelay.toml");
    fs::write(&config_file, "[telegram]\nchat_id = \"@archive\"\n").unwrap();

    vidrelay_cmd(temp.path())
        .args([
            "--config",
            config_file.to_str().unwrap(),
            "send",
            video.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bot_token"));
}

#[test]
fn test_cli_validate_valid_config() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("config.toml");

    fs::write(
        &config_file,
        r#"
[telegram]
bot_token = "123:abc"
chat_id = "@archive"

[split]
target_max_bytes = 1900000000
overlap_seconds = 3
"#,
    )
    .unwrap();

    vidrelay_cmd(temp.path())
        .args(["validate", config_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("@archive"));
}

#[test]
fn test_cli_validate_reports_warnings() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("config.toml");
    fs::write(&config_file, "[split]\noverlap_seconds = 5\n").unwrap();

    vidrelay_cmd(temp.path())
        .args(["validate", config_file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("chat_id is empty"));
}

#[test]
fn test_cli_validate_invalid_config() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("config.toml");
    fs::write(&config_file, "[split]\ntarget_max_bytes = 0\n").unwrap();

    vidrelay_cmd(temp.path())
        .args(["validate", config_file.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("target_max_bytes"));
}

#[test]
fn test_cli_validate_without_file_uses_defaults() {
    let temp = tempdir().unwrap();
    vidrelay_cmd(temp.path())
        .arg("validate")
        .assert()
        .success()
        .stdout(predicate::str::contains("using defaults"))
        .stdout(predicate::str::contains("api.telegram.org"))
        .stdout(predicate::str::contains("50 MB upload limit"));
}
