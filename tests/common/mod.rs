//! Shared helpers for the integration suite.
//!
//! - [`ReleaseServer`] - a local HTTP server standing in for the releases API
//!   and the artifact download host
//! - [`TestInstall`] - a throwaway portable installation with its own config

#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::Router;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::get;
use portable_updater::config::UpdaterConfig;
use portable_updater::constants::{DEFAULT_ARTIFACT_NAME, DEFAULT_MARKER_FILE, DEFAULT_USER_AGENT};
use portable_updater::update::{UpdaterOptions, VersionRecordStore};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// What the server answers for the artifact download.
#[derive(Clone, Debug)]
pub enum Artifact {
    Bytes(Vec<u8>),
    Status(StatusCode),
}

/// Local stand-in for the upstream release host.
///
/// Serves `GET /releases/latest` (rejecting requests without the updater's
/// User-Agent) and `GET /releases/download/<tag>/<artifact>`.
pub struct ReleaseServer {
    pub base: String,
    pub tag: String,
    release_hits: Arc<AtomicUsize>,
    downloads: Arc<AtomicUsize>,
}

impl ReleaseServer {
    pub async fn start(tag: &str, artifact: Artifact) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let base = format!("http://{}", listener.local_addr()?);
        let release_hits = Arc::new(AtomicUsize::new(0));
        let downloads = Arc::new(AtomicUsize::new(0));

        let release = serde_json::json!({
            "tag_name": tag,
            "html_url": format!("{base}/releases/tag/{tag}"),
            "draft": false,
            "assets": [],
        });

        let hits = release_hits.clone();
        let latest = get(move |headers: HeaderMap| {
            let release = release.clone();
            hits.fetch_add(1, Ordering::SeqCst);
            async move {
                let agent = headers.get(header::USER_AGENT).and_then(|v| v.to_str().ok());
                if agent != Some(DEFAULT_USER_AGENT) {
                    return (StatusCode::FORBIDDEN, "User-Agent required").into_response();
                }
                axum::Json(release).into_response()
            }
        });

        let count = downloads.clone();
        let download = get(move || {
            let artifact = artifact.clone();
            count.fetch_add(1, Ordering::SeqCst);
            async move {
                match artifact {
                    Artifact::Bytes(bytes) => bytes.into_response(),
                    Artifact::Status(status) => status.into_response(),
                }
            }
        });

        let app = Router::new()
            .route("/releases/latest", latest)
            .route(&format!("/releases/download/{tag}/{DEFAULT_ARTIFACT_NAME}"), download);

        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base,
            tag: tag.to_string(),
            release_hits,
            downloads,
        })
    }

    pub fn api_url(&self) -> String {
        format!("{}/releases/latest", self.base)
    }

    pub fn release_hits(&self) -> usize {
        self.release_hits.load(Ordering::SeqCst)
    }

    pub fn downloads(&self) -> usize {
        self.downloads.load(Ordering::SeqCst)
    }
}

/// A portable installation in a temporary directory.
///
/// ```text
/// <root>/app/floorp.exe
/// <root>/app/application.ini
/// <root>/app/browser/omni.ja
/// <root>/portapp.json
/// <root>/config.toml
/// ```
pub struct TestInstall {
    _temp: TempDir,
    pub root: PathBuf,
    pub app_dir: PathBuf,
    pub record: PathBuf,
    pub config_path: PathBuf,
}

impl TestInstall {
    pub fn new(version: &str) -> Result<Self> {
        let temp = TempDir::new()?;
        let root = temp.path().to_path_buf();
        let app_dir = root.join("app");
        let record = root.join("portapp.json");

        fs::create_dir_all(app_dir.join("browser"))?;
        fs::write(app_dir.join(DEFAULT_MARKER_FILE), format!("binary {version}"))?;
        fs::write(
            app_dir.join("application.ini"),
            format!("[App]\nName=Floorp\nVersion={version}\n"),
        )?;
        fs::write(app_dir.join("browser/omni.ja"), format!("omni {version}"))?;
        fs::write(
            &record,
            format!("{{\n  \"name\": \"Floorp Portable\",\n  \"version\": \"{version}\"\n}}\n"),
        )?;

        Ok(Self {
            config_path: root.join("config.toml"),
            _temp: temp,
            root,
            app_dir,
            record,
        })
    }

    /// Configuration pointing at `api_url` and this installation.
    pub fn config(&self, api_url: &str) -> UpdaterConfig {
        UpdaterConfig {
            releases_api_url: api_url.to_string(),
            app_path: Some(self.app_dir.clone()),
            record_path: Some(self.record.clone()),
            metadata_timeout_secs: 5,
            download_timeout_secs: 30,
            ..UpdaterConfig::default()
        }
    }

    pub fn write_config(&self, config: &UpdaterConfig) -> Result<()> {
        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content)
            .with_context(|| format!("Failed to write {}", self.config_path.display()))
    }

    pub fn options(&self, api_url: &str) -> UpdaterOptions {
        UpdaterOptions {
            metadata_timeout: Duration::from_secs(5),
            download_timeout: Duration::from_secs(30),
            ..self.config(api_url).to_options(&self.root)
        }
    }

    pub fn recorded_version(&self) -> Option<String> {
        VersionRecordStore::new(&self.record).read_version().ok()
    }

    pub fn read_app_file(&self, relative: &str) -> String {
        fs::read_to_string(self.app_dir.join(relative)).unwrap_or_default()
    }

    /// The CLI binary, configured for this installation.
    pub fn cli(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("papp-update").expect("binary built");
        cmd.arg("--config")
            .arg(&self.config_path)
            .env("NO_COLOR", "1")
            .env("PAPP_NO_PROGRESS", "1")
            .env_remove("RUST_LOG")
            .env_remove("PAPP_UPDATER_CONFIG");
        cmd
    }
}

/// Snapshot of every file under `root` (relative path and content).
pub fn tree_contents(root: &Path) -> Vec<(PathBuf, Vec<u8>)> {
    walkdir::WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let relative = e.path().strip_prefix(root).unwrap_or(e.path()).to_path_buf();
            let content = fs::read(e.path()).unwrap_or_default();
            (relative, content)
        })
        .collect()
}
