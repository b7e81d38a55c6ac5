//! Global constants used throughout the updater.
//!
//! Timeouts, well-known file names, and the sentinel values shared between
//! the version resolver, the pipeline, and the CLI.

use std::time::Duration;

/// Timeout for the release metadata request (10 seconds).
pub const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Timeout for the artifact download (10 minutes).
///
/// Covers the whole transfer, not a single read. Release archives are large
/// and a slow link must still be able to finish.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(600);

/// Version reported when the installed or upstream version cannot be resolved.
pub const UNKNOWN_VERSION: &str = "unknown";

/// User-Agent sent with every request. The releases API rejects anonymous clients.
pub const DEFAULT_USER_AGENT: &str = "Floorp-Portable-Updater";

/// Upstream endpoint returning the latest release as JSON.
pub const DEFAULT_RELEASES_API_URL: &str =
    "https://api.github.com/repos/Floorp-Projects/Floorp/releases/latest";

/// Human-facing release page, shown by `status` and `config show`.
pub const DEFAULT_RELEASE_PAGE_URL: &str = "https://github.com/Floorp-Projects/Floorp/releases";

/// File name of the release artifact appended to the download URL.
pub const DEFAULT_ARTIFACT_NAME: &str = "floorp-win64.installer.exe";

/// Executable whose presence marks a directory as a runnable bundle.
pub const DEFAULT_MARKER_FILE: &str = "floorp.exe";

/// Conventional name of the bundle directory, both inside archives and on disk.
pub const DEFAULT_PAYLOAD_DIR: &str = "app";

/// Version record file, kept next to the launcher executable.
pub const DEFAULT_RECORD_FILE: &str = "portapp.json";

/// Suffix of the one-generation backup kept during an install.
pub const BACKUP_SUFFIX: &str = ".bak";

/// Environment variable that disables progress bars when set.
pub const NO_PROGRESS_ENV: &str = "PAPP_NO_PROGRESS";

/// Message shown once the new bundle is live.
pub const UPDATE_COMPLETE_MESSAGE: &str =
    "The update has been successfully installed. The application will restart now.";
