// Run configuration: where lyrics, music and the profanity cache live.
// Resolved once in main from CLI arguments and the environment, then passed by reference.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use crate::error::VerseError;

/// Name of the per-user configuration directory
pub const CONFIG_DIR_NAME: &str = "verse";

/// Profanity cache file name inside the configuration directory
pub const CACHE_FILE_NAME: &str = "profanity.cache";

/// Upper bound on the number of lines the scanner will collect
pub const MAX_CORPUS_LINES: usize = 100_000;

/// Lines longer than this (in bytes) are skipped by the streaming sampler
pub const MAX_DISPLAY_LEN: usize = 100;

/// Depth bound for the music library traversal
pub const MAX_MUSIC_DEPTH: usize = 32;

/// Default external profanity classifier program
pub const DEFAULT_CLASSIFIER: &str = "check-profanity";

/// Default classifier timeout in seconds
pub const DEFAULT_CLASSIFIER_TIMEOUT_SECS: u64 = 300;

/// Fully resolved configuration for one run
#[derive(Debug, Clone)]
pub struct VerseConfig {
    /// Per-user configuration directory (holds the profanity cache)
    pub config_dir: PathBuf,
    /// Directory scanned for `*.txt*` lyric files
    pub lyrics_dir: PathBuf,
    /// Music library searched for tagged audio files
    pub music_dir: Option<PathBuf>,
    /// Program run to classify lines for profanity
    pub classifier_command: String,
    /// Wall-clock limit for one classifier run
    pub classifier_timeout: Duration,
    /// Scanner capacity bound
    pub max_corpus_lines: usize,
}

impl VerseConfig {
    /// Path of the persisted profanity cache
    pub fn cache_path(&self) -> PathBuf {
        self.config_dir.join(CACHE_FILE_NAME)
    }
}

/// Pick the configuration directory from `XDG_CONFIG_HOME` (preferred, when non-empty)
/// or `HOME` (as `$HOME/.config`). Returns `None` when neither is usable.
pub fn resolve_config_dir(xdg_config_home: Option<&str>, home: Option<&str>) -> Option<PathBuf> {
    match xdg_config_home {
        Some(xdg) if !xdg.is_empty() => Some(Path::new(xdg).join(CONFIG_DIR_NAME)),
        _ => home.map(|h| Path::new(h).join(".config").join(CONFIG_DIR_NAME)),
    }
}

/// Resolve the configuration directory from the process environment and make sure it exists.
pub async fn init_config_dir() -> Result<PathBuf, VerseError> {
    let xdg = std::env::var("XDG_CONFIG_HOME").ok();
    let home = std::env::var("HOME").ok();

    let config_dir = resolve_config_dir(xdg.as_deref(), home.as_deref()).ok_or_else(|| {
        VerseError::ConfigDir("neither XDG_CONFIG_HOME nor HOME is set".to_string())
    })?;

    ensure_dir(&config_dir).await?;
    Ok(config_dir)
}

/// Create `dir` if missing; fail if something other than a directory is already there.
pub async fn ensure_dir(dir: &Path) -> Result<(), VerseError> {
    match tokio::fs::metadata(dir).await {
        Ok(metadata) if metadata.is_dir() => {
            debug!("Config directory present: {}", dir.display());
            Ok(())
        }
        Ok(_) => Err(VerseError::ConfigDir(format!(
            "{} exists but is not a directory",
            dir.display()
        ))),
        Err(_) => {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                VerseError::ConfigDir(format!("failed to create {}: {}", dir.display(), e))
            })?;
            restrict_permissions(dir).await;
            info!("Created config directory: {}", dir.display());
            Ok(())
        }
    }
}

#[cfg(unix)]
async fn restrict_permissions(dir: &Path) {
    use std::os::unix::fs::PermissionsExt;
    let perms = std::fs::Permissions::from_mode(0o700);
    if let Err(e) = tokio::fs::set_permissions(dir, perms).await {
        debug!("Could not restrict permissions on {}: {}", dir.display(), e);
    }
}

#[cfg(not(unix))]
async fn restrict_permissions(_dir: &Path) {}

/// Default lyrics directory under the user's home
pub fn default_lyrics_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|h| PathBuf::from(h).join("lyrics"))
}

/// Default music library under the user's home
pub fn default_music_dir() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|h| PathBuf::from(h).join("music").join("tracks"))
}
