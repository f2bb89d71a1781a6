//! System-wide constants and default paths.

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

/// Manifest file names recognized during discovery, in precedence order.
///
/// When a directory carries more than one, the first match wins so that
/// one directory never yields two environments.
pub const MANIFEST_FILE_NAMES: &[&str] = &[
    "docker-compose.yml",
    "docker-compose.yaml",
    "compose.yml",
    "compose.yaml",
];

/// Cache time-to-live applied when no explicit TTL is configured.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Documentation files probed in each environment directory.
pub const README_FILE_NAMES: &[&str] = &["README.md", "README.MD"];

/// Localized documentation variants, probed before the plain README when
/// loading environment detail.
pub const LOCALIZED_README_FILE_NAMES: &[&str] =
    &["README.zh-cn.md", "README.zh-CN.md", "README_zh.md"];

/// Subdirectory names that mark bundled exploit or proof-of-concept code.
pub const EXPLOIT_DIR_NAMES: &[&str] = &["exploit", "exploits", "poc", "pocs"];

/// First-level file names treated as exploit artifacts regardless of content.
pub const EXPLOIT_FILE_NAMES: &[&str] = &["poc.py", "poc.sh", "exp.py"];

/// Source extensions considered when listing exploit files.
pub const EXPLOIT_SOURCE_EXTENSIONS: &[&str] = &["py", "sh", "rb", "go", "c", "cpp"];

/// Picture extensions probed when checking for bundled screenshots.
pub const PICTURE_FILE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp", "svg"];

/// Cap on first-level picture files examined per environment directory.
pub const MAX_PICTURE_FILES: usize = 5;

/// Cap on exploit file content returned with environment detail, in bytes.
pub const MAX_EXPLOIT_CONTENT_BYTES: usize = 10_000;

/// Worker threads used for per-environment scan probes. Image inspection
/// shells out per image, so the bound keeps subprocess fan-out in check.
pub const DEFAULT_SCAN_WORKERS: usize = 4;

/// How many scanned manifests between progress log lines.
pub const SCAN_PROGRESS_INTERVAL: usize = 50;

/// Environment variable naming the scan root.
pub const ROOT_ENV_VAR: &str = "STACKYARD_ROOT";

/// Application name used in CLI output and state files.
pub const APP_NAME: &str = "stackyard";

/// Binary name for the CLI.
pub const BIN_NAME: &str = "syd";

/// Returns the data directory, preferring `$HOME/.stackyard`, falling
/// back to the current directory when no home is resolvable.
fn resolve_data_dir() -> PathBuf {
    if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
        let user_dir = PathBuf::from(home).join(".stackyard");
        if std::fs::create_dir_all(&user_dir).is_ok() {
            return user_dir;
        }
    }
    PathBuf::from(".")
}

static DATA_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the resolved data directory for this session.
pub fn data_dir() -> &'static PathBuf {
    DATA_DIR.get_or_init(resolve_data_dir)
}

/// Returns the default on-disk cache envelope path.
pub fn default_cache_file() -> PathBuf {
    data_dir().join("registry-cache.json")
}
