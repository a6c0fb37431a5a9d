// Artist/title resolution for lyric files.
// Tag lookup against a music library when available, filename heuristics otherwise.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::MAX_MUSIC_DEPTH;

/// Audio file suffix matched in the music library (case-sensitive)
pub const MUSIC_FILE_SUFFIX: &str = ".mp3";

const TRIM_CHARS: [char; 4] = [' ', '\t', '\n', '\r'];

/// Resolved artist and title. Empty strings mean "unknown".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    pub artist: String,
    pub title: String,
}

impl TrackMetadata {
    pub fn new(artist: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            artist: artist.into(),
            title: title.into(),
        }
    }
}

fn trim(s: &str) -> &str {
    s.trim_matches(&TRIM_CHARS[..])
}

/// Derive artist and title from a lyric file name.
///
/// A trailing `.txt` (any case) is dropped, then the name is split at the first `" - "`,
/// or failing that the first bare `-`. Without a delimiter the whole name is the title.
pub fn split_artist_title(file_name: &str) -> TrackMetadata {
    let mut base = file_name;
    let len = base.len();
    if len > 4 && base.is_char_boundary(len - 4) && base[len - 4..].eq_ignore_ascii_case(".txt") {
        base = &base[..len - 4];
    }

    let split = base
        .find(" - ")
        .map(|pos| (pos, 3))
        .or_else(|| base.find('-').map(|pos| (pos, 1)));

    match split {
        Some((pos, delim_len)) => {
            TrackMetadata::new(trim(&base[..pos]), trim(&base[pos + delim_len..]))
        }
        None => TrackMetadata::new("", trim(base)),
    }
}

/// Strip everything from the last `.` onwards
pub fn remove_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(pos) => &file_name[..pos],
        None => file_name,
    }
}

/// Raw tag values as read from an audio file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackTags {
    pub artist: Option<String>,
    pub title: Option<String>,
}

impl TrackTags {
    /// Both fields present and non-blank
    pub fn complete(&self) -> Option<TrackMetadata> {
        let artist = trim(self.artist.as_deref()?);
        let title = trim(self.title.as_deref()?);
        if artist.is_empty() || title.is_empty() {
            return None;
        }
        Some(TrackMetadata::new(artist, title))
    }
}

/// Reads embedded tags from an audio file
pub trait TagReader: Send + Sync {
    fn read_tags(&self, path: &Path) -> Option<TrackTags>;
}

/// ID3 tag reader for MP3 files
#[derive(Debug, Default, Clone, Copy)]
pub struct Id3TagReader;

impl TagReader for Id3TagReader {
    fn read_tags(&self, path: &Path) -> Option<TrackTags> {
        use id3::TagLike;

        match id3::Tag::read_from_path(path) {
            Ok(tag) => Some(TrackTags {
                artist: tag.artist().map(str::to_string),
                title: tag.title().map(str::to_string),
            }),
            Err(id3::Error {
                kind: id3::ErrorKind::NoTag,
                ..
            }) => {
                debug!("No ID3 tag in {}", path.display());
                None
            }
            Err(e) => {
                warn!("Failed to read ID3 tag from {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// Audio files in a music library keyed by extension-stripped file name.
///
/// Built with one bounded, sorted walk. When two files share a stem the first
/// one in walk order wins.
#[derive(Debug, Default, Clone)]
pub struct MusicLibrary {
    by_stem: HashMap<String, PathBuf>,
}

impl MusicLibrary {
    /// Walk `root` up to `max_depth` levels and index every `.mp3` file
    pub fn index(root: impl AsRef<Path>, max_depth: usize) -> Self {
        let root = root.as_ref();
        let mut by_stem = HashMap::new();

        let walker = WalkDir::new(root)
            .max_depth(max_depth)
            .follow_links(false)
            .sort_by_file_name();

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable music library entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            if !name.ends_with(MUSIC_FILE_SUFFIX) {
                continue;
            }
            by_stem
                .entry(remove_extension(name).to_string())
                .or_insert_with(|| entry.path().to_path_buf());
        }

        info!("Indexed {} audio files under {}", by_stem.len(), root.display());
        Self { by_stem }
    }

    pub fn len(&self) -> usize {
        self.by_stem.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_stem.is_empty()
    }

    /// Audio file whose stem equals `stem` exactly
    pub fn find(&self, stem: &str) -> Option<&Path> {
        self.by_stem.get(stem).map(PathBuf::as_path)
    }
}

/// Resolves artist/title for lyric files
pub struct MetadataResolver {
    library: Option<MusicLibrary>,
    tag_reader: Box<dyn TagReader>,
}

impl MetadataResolver {
    /// Resolver that only ever splits file names
    pub fn filename_only() -> Self {
        Self {
            library: None,
            tag_reader: Box::new(Id3TagReader),
        }
    }

    /// Resolver backed by a music library and a tag reader
    pub fn with_library(library: MusicLibrary, tag_reader: Box<dyn TagReader>) -> Self {
        Self {
            library: Some(library),
            tag_reader,
        }
    }

    /// Index `music_dir` and read tags with ID3
    pub fn from_music_dir(music_dir: impl AsRef<Path>) -> Self {
        let music_dir = music_dir.as_ref();
        let library = MusicLibrary::index(music_dir, MAX_MUSIC_DEPTH);
        if library.is_empty() {
            warn!("No audio files under {}, metadata comes from file names", music_dir.display());
        }
        Self::with_library(library, Box::new(Id3TagReader))
    }

    /// Resolve artist/title for a lyric file name.
    ///
    /// With `prefer_filename_split` the tag lookup is skipped entirely.
    pub fn resolve(&self, file_name: &str, prefer_filename_split: bool) -> TrackMetadata {
        if !prefer_filename_split {
            if let Some(meta) = self.lookup_tags(file_name) {
                return meta;
            }
        }
        split_artist_title(file_name)
    }

    fn lookup_tags(&self, file_name: &str) -> Option<TrackMetadata> {
        let library = self.library.as_ref()?;
        let stem = remove_extension(file_name);
        let audio_path = library.find(stem)?;

        let meta = self.tag_reader.read_tags(audio_path)?.complete();
        match &meta {
            Some(m) => debug!("Tags for {}: {} - {}", file_name, m.artist, m.title),
            None => debug!("Incomplete tags in {}, using file name", audio_path.display()),
        }
        meta
    }
}
