// Corpus scanning: every non-empty line of every lyric file, in enumeration order.
// Line index i in the corpus is also line i of the profanity cache.

use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::discovery::list_lyric_files;
use crate::metadata::{MetadataResolver, TrackMetadata};
use crate::reader::{LyricLines, ReaderConfig};

/// True for song-structure annotations such as `[Chorus]` or `(x2)`
pub fn is_section_marker(text: &str) -> bool {
    text.starts_with('[') || text.starts_with('(')
}

/// One corpus line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    /// Shared by every line of the same source file
    pub meta: Arc<TrackMetadata>,
    pub section_marker: bool,
    /// Position within the whole corpus
    pub index: usize,
}

impl Line {
    pub fn artist(&self) -> &str {
        &self.meta.artist
    }

    pub fn title(&self) -> &str {
        &self.meta.title
    }
}

/// Ordered lines spanning all lyric files
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    lines: Vec<Line>,
}

impl Corpus {
    /// Build a corpus directly from `(text, metadata)` pairs
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = (S, TrackMetadata)>,
        S: Into<String>,
    {
        let mut corpus = Self::default();
        for (text, meta) in lines {
            corpus.push(text.into(), Arc::new(meta));
        }
        corpus
    }

    fn push(&mut self, text: String, meta: Arc<TrackMetadata>) {
        let index = self.lines.len();
        self.lines.push(Line {
            section_marker: is_section_marker(&text),
            text,
            meta,
            index,
        });
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Line> {
        self.lines.get(index)
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Line> {
        self.lines.iter()
    }

    /// Line texts in corpus order, as handed to the profanity classifier
    pub fn texts(&self) -> Vec<String> {
        self.lines.iter().map(|l| l.text.clone()).collect()
    }
}

impl std::ops::Index<usize> for Corpus {
    type Output = Line;

    fn index(&self, index: usize) -> &Line {
        &self.lines[index]
    }
}

/// Scanner options
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Capacity bound; extraction stops silently once reached
    pub max_lines: usize,
    /// Skip tag lookup and split file names
    pub prefer_filename_split: bool,
    pub reader: ReaderConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_lines: crate::config::MAX_CORPUS_LINES,
            prefer_filename_split: false,
            reader: ReaderConfig::default(),
        }
    }
}

/// Scan `lyrics_dir` into a corpus.
///
/// Unreadable files are skipped. An unreadable directory gives an empty corpus.
pub async fn scan(
    lyrics_dir: impl AsRef<Path>,
    resolver: &MetadataResolver,
    config: &ScanConfig,
) -> Corpus {
    let lyrics_dir = lyrics_dir.as_ref();
    let mut corpus = Corpus::default();

    'files: for file in list_lyric_files(lyrics_dir).await {
        if corpus.len() >= config.max_lines {
            break;
        }

        let mut lines = match LyricLines::open(&file.path, &config.reader).await {
            Ok(lines) => lines,
            Err(e) => {
                warn!("Skipping unreadable lyric file: {}", e);
                continue;
            }
        };

        let meta = Arc::new(resolver.resolve(&file.file_name, config.prefer_filename_split));
        let before = corpus.len();

        loop {
            match lines.next_line().await {
                Ok(Some(text)) => {
                    if corpus.len() >= config.max_lines {
                        debug!("Corpus capacity {} reached", config.max_lines);
                        break 'files;
                    }
                    corpus.push(text, meta.clone());
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Read error in {} (keeping {} lines): {}",
                          file.path.display(), corpus.len() - before, e);
                    break;
                }
            }
        }

        debug!("Read {} lines from {}", corpus.len() - before, file.path.display());
    }

    info!("Corpus scan of {} complete: {} lines", lyrics_dir.display(), corpus.len());
    corpus
}
