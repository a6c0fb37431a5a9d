use crate::metadata::TrackMetadata;

/// Which metadata to print above the lyric line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShowMeta {
    pub artist: bool,
    pub title: bool,
}

impl ShowMeta {
    /// `show_meta` implies both artist and title
    pub fn from_flags(show_artist: bool, show_title: bool, show_meta: bool) -> Self {
        Self {
            artist: show_artist || show_meta,
            title: show_title || show_meta,
        }
    }
}

/// Header line for the selected lyric, if any. Unknown (empty) fields are never printed.
pub fn metadata_header(meta: &TrackMetadata, show: ShowMeta) -> Option<String> {
    let artist = show.artist && !meta.artist.is_empty();
    let title = show.title && !meta.title.is_empty();

    match (artist, title) {
        (true, true) => Some(format!("{} - {}", meta.artist, meta.title)),
        (true, false) => Some(meta.artist.clone()),
        (false, true) => Some(meta.title.clone()),
        (false, false) => None,
    }
}

/// Full output: optional header, then the lyric line
pub fn render(line: &str, meta: &TrackMetadata, show: ShowMeta) -> String {
    match metadata_header(meta, show) {
        Some(header) => format!("{header}\n{line}\n"),
        None => format!("{line}\n"),
    }
}
