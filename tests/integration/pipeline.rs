//! Update pipeline tests through the library API.

use crate::common::{Artifact, ReleaseServer, TestInstall, tree_contents};
use anyhow::Result;
use portable_updater::constants::{DEFAULT_MARKER_FILE, UNKNOWN_VERSION, UPDATE_COMPLETE_MESSAGE};
use portable_updater::core::UpdateError;
use portable_updater::test_utils::{ArchiveFixture, init_test_logging};
use portable_updater::update::{
    ChannelReporter, LogReporter, UpdateOutcome, UpdateStage, Updater, backup_path,
};
use tokio::sync::mpsc;

fn release_archive(version: &str) -> Result<Vec<u8>> {
    ArchiveFixture::release_bundle(DEFAULT_MARKER_FILE, version).to_bytes()
}

/// 11.23.0 installed, 11.23.1 published: the update lands and is recorded.
#[tokio::test]
async fn test_update_from_11_23_0_to_11_23_1() -> Result<()> {
    init_test_logging(None);
    let server = ReleaseServer::start("v11.23.1", Artifact::Bytes(release_archive("11.23.1")?)).await?;
    let install = TestInstall::new("11.23.0")?;
    let updater = Updater::new(install.options(&server.api_url()))?;

    let check = updater.check().await;
    assert_eq!(check.current, "11.23.0");
    assert_eq!(check.latest, "11.23.1");
    assert!(check.update_available);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let outcome = updater.run_update(&ChannelReporter::new(tx)).await?;

    assert_eq!(
        outcome,
        UpdateOutcome::Installed {
            version: "11.23.1".to_string()
        }
    );
    assert_eq!(install.recorded_version().as_deref(), Some("11.23.1"));
    assert_eq!(install.read_app_file(DEFAULT_MARKER_FILE), "binary 11.23.1");
    assert_eq!(install.read_app_file("browser/omni.ja"), "omni 11.23.1");
    assert!(install.read_app_file("application.ini").contains("Version=11.23.1"));
    assert!(!backup_path(&install.app_dir).exists());

    let mut stages = Vec::new();
    while let Ok(event) = rx.try_recv() {
        stages.push((event.stage, event.percent, event.message));
    }
    let percents: Vec<u8> = stages.iter().map(|(_, p, _)| *p).collect();
    assert_eq!(percents, vec![0, 20, 50, 75, 100]);
    let (stage, _, message) = stages.last().unwrap();
    assert_eq!(*stage, UpdateStage::Complete);
    assert_eq!(message, UPDATE_COMPLETE_MESSAGE);

    // A second run finds nothing to do
    let outcome = updater.run_update(&LogReporter).await?;
    assert_eq!(
        outcome,
        UpdateOutcome::UpToDate {
            current: "11.23.1".to_string()
        }
    );
    assert_eq!(server.downloads(), 1);
    Ok(())
}

/// Archives that keep the marker in a differently named directory still install.
#[tokio::test]
async fn test_marker_outside_app_directory() -> Result<()> {
    let archive = ArchiveFixture::new()
        .file("bin/floorp.exe", b"binary 12.0.0")
        .file("bin/libxul.so", b"xul")
        .file("LICENSE", b"MPL")
        .to_bytes()?;
    let server = ReleaseServer::start("v12.0.0", Artifact::Bytes(archive)).await?;
    let install = TestInstall::new("11.23.0")?;

    let outcome = Updater::new(install.options(&server.api_url()))?.run_update(&LogReporter).await?;

    assert!(matches!(outcome, UpdateOutcome::Installed { .. }));
    assert_eq!(install.read_app_file("floorp.exe"), "binary 12.0.0");
    assert_eq!(install.read_app_file("libxul.so"), "xul");
    assert!(!install.app_dir.join("LICENSE").exists());
    assert!(!install.app_dir.join("application.ini").exists());
    Ok(())
}

#[tokio::test]
async fn test_zero_byte_artifact_never_touches_install() -> Result<()> {
    let server = ReleaseServer::start("v11.23.1", Artifact::Bytes(Vec::new())).await?;
    let install = TestInstall::new("11.23.0")?;
    let before = tree_contents(&install.app_dir);

    let err = Updater::new(install.options(&server.api_url()))?
        .run_update(&LogReporter)
        .await
        .unwrap_err();

    assert!(matches!(err, UpdateError::EmptyArtifact { .. }), "{err}");
    assert_eq!(tree_contents(&install.app_dir), before);
    assert_eq!(install.recorded_version().as_deref(), Some("11.23.0"));
    Ok(())
}

#[tokio::test]
async fn test_archive_without_marker_never_touches_install() -> Result<()> {
    let archive = ArchiveFixture::new().file("docs/readme.txt", b"nothing to run").to_bytes()?;
    let server = ReleaseServer::start("v11.23.1", Artifact::Bytes(archive)).await?;
    let install = TestInstall::new("11.23.0")?;
    let before = tree_contents(&install.app_dir);

    let err = Updater::new(install.options(&server.api_url()))?
        .run_update(&LogReporter)
        .await
        .unwrap_err();

    assert!(matches!(err, UpdateError::PayloadNotFound { .. }), "{err}");
    assert_eq!(tree_contents(&install.app_dir), before);
    assert!(!backup_path(&install.app_dir).exists());
    Ok(())
}

#[tokio::test]
async fn test_stale_backup_blocks_update() -> Result<()> {
    let server = ReleaseServer::start("v11.23.1", Artifact::Bytes(release_archive("11.23.1")?)).await?;
    let install = TestInstall::new("11.23.0")?;
    std::fs::create_dir_all(backup_path(&install.app_dir))?;
    let before = tree_contents(&install.app_dir);

    let err = Updater::new(install.options(&server.api_url()))?
        .run_update(&LogReporter)
        .await
        .unwrap_err();

    assert!(matches!(err, UpdateError::Filesystem { .. }), "{err}");
    assert_eq!(tree_contents(&install.app_dir), before);
    assert!(backup_path(&install.app_dir).exists());
    assert_eq!(install.recorded_version().as_deref(), Some("11.23.0"));
    Ok(())
}

#[tokio::test]
async fn test_unreachable_release_server_means_no_update() -> Result<()> {
    let install = TestInstall::new("11.23.0")?;
    let updater = Updater::new(install.options("http://127.0.0.1:9/releases/latest"))?;

    let check = updater.check().await;
    assert_eq!(check.latest, UNKNOWN_VERSION);
    assert!(!check.update_available);

    let outcome = updater.run_update(&LogReporter).await?;
    assert_eq!(
        outcome,
        UpdateOutcome::UpToDate {
            current: "11.23.0".to_string()
        }
    );
    Ok(())
}
