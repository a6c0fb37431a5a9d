use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

/// Marker a file name must contain to be treated as a lyric file.
/// Substring match: `song.txt.bak` qualifies, `song.TXT` does not.
pub const LYRIC_FILE_MARKER: &str = ".txt";

/// A lyric file found in the lyrics directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricFile {
    pub path: PathBuf,
    /// Bare file name, used for metadata resolution
    pub file_name: String,
}

/// Returns true when a directory entry name qualifies as a lyric file
pub fn is_lyric_file_name(name: &str) -> bool {
    name.contains(LYRIC_FILE_MARKER)
}

/// Lists lyric files directly inside `dir`, sorted by file name.
///
/// Entries are accepted when they are regular files (or their type cannot be determined)
/// and their name contains `.txt`. The sort order is what keeps profanity cache indices
/// aligned between runs, so every consumer of the corpus must enumerate through here.
///
/// An unreadable directory yields an empty list rather than an error.
pub async fn list_lyric_files(dir: impl AsRef<Path>) -> Vec<LyricFile> {
    let dir = dir.as_ref();

    let mut read_dir = match fs::read_dir(dir).await {
        Ok(read_dir) => read_dir,
        Err(e) => {
            warn!("Cannot open lyrics directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut entries = Vec::new();
    loop {
        let entry = match read_dir.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                warn!("Directory iteration error in {}: {}", dir.display(), e);
                break;
            }
        };

        // WHY: unknown file type is accepted, mirroring filesystems that don't report it
        let type_ok = match entry.file_type().await {
            Ok(ft) => ft.is_file(),
            Err(_) => true,
        };
        if !type_ok {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().into_owned();
        if !is_lyric_file_name(&file_name) {
            continue;
        }

        debug!("Found lyric file: {}", entry.path().display());
        entries.push(LyricFile {
            path: entry.path(),
            file_name,
        });
    }

    entries.sort_by(|a, b| a.file_name.as_bytes().cmp(b.file_name.as_bytes()));

    info!("Discovered {} lyric files in {}", entries.len(), dir.display());
    entries
}
