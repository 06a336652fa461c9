//! Cache configuration: root resolution and download policy (\S4.8, \S10.3).
//!
//! The only global state this subsystem carries (\S9: "Global state: only
//! the cache root ... pass it by value"). Resolved once, at a single call
//! site, then threaded through by value the way `llm-base`'s
//! `ModelParameters` is built once from CLI/env and handed to `llm::load`.

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable overriding the cache root directly.
pub const CACHE_ROOT_ENV: &str = "SMALLMIND_MODEL_CACHE";

/// Default download timeout: 30 minutes, per \S5's "bounded timeout
/// (default: 30 minutes for very large files)".
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30 * 60);

/// Cache behavior, resolved once per process and passed by value.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    root: PathBuf,
    download_timeout: Duration,
    follow_redirects: bool,
}

impl CacheConfig {
    /// Builds a config with an explicit root, the default timeout, and
    /// redirects followed.
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            download_timeout: DEFAULT_DOWNLOAD_TIMEOUT,
            follow_redirects: true,
        }
    }

    /// Resolves the cache root from `SMALLMIND_MODEL_CACHE` if set,
    /// otherwise a per-OS default directory (\S4.8):
    /// Windows `%LOCALAPPDATA%/SmallMind/models`, macOS
    /// `~/Library/Caches/SmallMind/models`, elsewhere
    /// `${XDG_CACHE_HOME:-~/.cache}/smallmind/models`.
    pub fn from_env() -> Self {
        let root = std::env::var_os(CACHE_ROOT_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(default_cache_root);
        Self::new(root)
    }

    /// The resolved cache root directory.
    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    /// Overrides the download timeout (builder-style).
    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    /// The configured download timeout.
    pub fn download_timeout(&self) -> Duration {
        self.download_timeout
    }

    /// Overrides whether HTTP redirects are followed (builder-style).
    pub fn with_follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = follow;
        self
    }

    /// Whether HTTP redirects are followed during download.
    pub fn follow_redirects(&self) -> bool {
        self.follow_redirects
    }
}

/// The per-OS application-directory segment under `dirs::cache_dir()`:
/// `SmallMind` on Windows/macOS (matching `%LOCALAPPDATA%/SmallMind/models`
/// and `~/Library/Caches/SmallMind/models`), lowercase `smallmind`
/// everywhere else (matching `${XDG_CACHE_HOME:-~/.cache}/smallmind/models`).
#[cfg(any(target_os = "windows", target_os = "macos"))]
const APP_DIR_NAME: &str = "SmallMind";
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
const APP_DIR_NAME: &str = "smallmind";

fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .map(|base| base.join(APP_DIR_NAME).join("models"))
        .unwrap_or_else(|| PathBuf::from(".smallmind").join("models"))
}
