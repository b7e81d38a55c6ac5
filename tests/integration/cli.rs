//! Tests for the `papp-update` binary.
//!
//! The release server runs on the test's runtime workers while the binary
//! blocks the test thread, so these tests need the multi-threaded runtime.

use crate::common::{Artifact, ReleaseServer, TestInstall, tree_contents};
use anyhow::Result;
use axum::http::StatusCode;
use portable_updater::constants::{DEFAULT_MARKER_FILE, UPDATE_COMPLETE_MESSAGE};
use portable_updater::test_utils::ArchiveFixture;
use predicates::prelude::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_check_reports_available_update_as_json() -> Result<()> {
    let server = ReleaseServer::start("v11.23.1", Artifact::Status(StatusCode::NOT_FOUND)).await?;
    let install = TestInstall::new("11.23.0")?;
    install.write_config(&install.config(&server.api_url()))?;

    let output = install.cli().args(["check", "--json"]).assert().success().get_output().clone();

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["current"], "11.23.0");
    assert_eq!(json["latest"], "11.23.1");
    assert_eq!(json["update_available"], true);
    assert_eq!(
        json["release_url"],
        format!("{}/releases/tag/v11.23.1", server.base)
    );
    assert_eq!(server.downloads(), 0);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_check_respects_disabled_setting() -> Result<()> {
    let server = ReleaseServer::start("v11.23.1", Artifact::Status(StatusCode::NOT_FOUND)).await?;
    let install = TestInstall::new("11.23.0")?;
    let mut config = install.config(&server.api_url());
    config.check_for_updates = false;
    install.write_config(&config)?;

    install
        .cli()
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("disabled"));
    assert_eq!(server.release_hits(), 0);

    install
        .cli()
        .args(["check", "--force"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Update available: 11.23.0 -> 11.23.1"));
    assert_eq!(server.release_hits(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_update_installs_new_release() -> Result<()> {
    let archive = ArchiveFixture::release_bundle(DEFAULT_MARKER_FILE, "11.23.1").to_bytes()?;
    let server = ReleaseServer::start("v11.23.1", Artifact::Bytes(archive)).await?;
    let install = TestInstall::new("11.23.0")?;
    install.write_config(&install.config(&server.api_url()))?;

    install
        .cli()
        .args(["update", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains(UPDATE_COMPLETE_MESSAGE));

    assert_eq!(install.recorded_version().as_deref(), Some("11.23.1"));
    assert_eq!(install.read_app_file(DEFAULT_MARKER_FILE), "binary 11.23.1");

    install
        .cli()
        .args(["update", "--yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("latest version (11.23.1)"));
    assert_eq!(server.downloads(), 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_update_declined_at_prompt() -> Result<()> {
    let archive = ArchiveFixture::release_bundle(DEFAULT_MARKER_FILE, "11.23.1").to_bytes()?;
    let server = ReleaseServer::start("v11.23.1", Artifact::Bytes(archive)).await?;
    let install = TestInstall::new("11.23.0")?;
    install.write_config(&install.config(&server.api_url()))?;

    install
        .cli()
        .arg("update")
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Do you want to update now?"))
        .stdout(predicate::str::contains("Update cancelled"));

    assert_eq!(server.downloads(), 0);
    assert_eq!(install.recorded_version().as_deref(), Some("11.23.0"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_failed_download_exits_nonzero_and_keeps_install() -> Result<()> {
    let server = ReleaseServer::start("v11.23.1", Artifact::Status(StatusCode::NOT_FOUND)).await?;
    let install = TestInstall::new("11.23.0")?;
    install.write_config(&install.config(&server.api_url()))?;
    let before = tree_contents(&install.app_dir);

    install
        .cli()
        .args(["update", "--yes"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("error"))
        .stderr(predicate::str::contains("Update failed"))
        .stderr(predicate::str::contains("404"));

    assert_eq!(tree_contents(&install.app_dir), before);
    assert_eq!(install.recorded_version().as_deref(), Some("11.23.0"));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_status_shows_installation() -> Result<()> {
    let install = TestInstall::new("11.23.0")?;
    install.write_config(&install.config("http://127.0.0.1:9/releases/latest"))?;

    install
        .cli()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Recorded version: 11.23.0"))
        .stdout(predicate::str::contains("Bundle version:   11.23.0"));
    Ok(())
}

#[test]
fn test_config_init_show_and_path() -> Result<()> {
    let install = TestInstall::new("11.23.0")?;
    let path = install.config_path.display().to_string();

    install
        .cli()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(path.as_str()));

    install
        .cli()
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration at:"));
    assert!(install.config_path.exists());

    install
        .cli()
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));

    install
        .cli()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("check_for_updates = true"))
        .stdout(predicate::str::contains("Resolved paths"));
    Ok(())
}

#[test]
fn test_invalid_config_is_reported() -> Result<()> {
    let install = TestInstall::new("11.23.0")?;
    std::fs::write(&install.config_path, "check_for_updates = \"sometimes\"\n")?;

    install
        .cli()
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration"));
    Ok(())
}

#[test]
fn test_help_lists_commands() {
    assert_cmd::Command::cargo_bin("papp-update")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("check"))
        .stdout(predicate::str::contains("update"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("config"));
}
