use thiserror::Error;

use crate::selector::SelectionError;

/// Failures surfaced to the CLI boundary
#[derive(Debug, Error)]
pub enum VerseError {
    /// No lyric lines could be extracted from the lyrics directory
    #[error("No lyrics found.")]
    NoLyricsFound,

    /// Configuration directory could not be located or prepared
    #[error("Could not initialize config directory: {0}")]
    ConfigDir(String),

    #[error(transparent)]
    Selection(#[from] SelectionError),
}
