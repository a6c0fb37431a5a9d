// Random line selection.
//
// Two strategies over the same enumeration order:
// - `pick`: rejection sampling over a materialized corpus, with adjacency constraints
// - `pick_streaming`: single-pass reservoir sampling straight from the lyrics directory

use std::path::Path;
use std::sync::Arc;

use rand::Rng;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::MAX_DISPLAY_LEN;
use crate::corpus::{is_section_marker, Corpus};
use crate::discovery::list_lyric_files;
use crate::metadata::{MetadataResolver, TrackMetadata};
use crate::profanity::ProfanityFlags;
use crate::reader::{LyricLines, ReaderConfig};

/// Rejection draws allowed per corpus line before falling back to a direct draw
const REJECTION_ROUNDS: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("No lyrics found.")]
    EmptyCorpus,
    #[error("No eligible line under current filters.")]
    NoEligibleLine,
}

/// A selected line with its source metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pick {
    pub text: String,
    pub meta: Arc<TrackMetadata>,
    /// Corpus index of the line
    pub index: usize,
}

impl Pick {
    pub fn artist(&self) -> &str {
        &self.meta.artist
    }

    pub fn title(&self) -> &str {
        &self.meta.title
    }
}

fn line_ok(corpus: &Corpus, flags: &ProfanityFlags, allow_profanity: bool, i: usize) -> bool {
    !corpus[i].section_marker && (allow_profanity || !flags.is_profane(i))
}

/// Whether index `i` may be selected: the line and its successor (if any) must be
/// neither section markers nor, unless allowed, profane.
pub fn is_acceptable(corpus: &Corpus, flags: &ProfanityFlags, allow_profanity: bool, i: usize) -> bool {
    if i >= corpus.len() || !line_ok(corpus, flags, allow_profanity, i) {
        return false;
    }
    i + 1 >= corpus.len() || line_ok(corpus, flags, allow_profanity, i + 1)
}

/// All acceptable indices in ascending order
pub fn acceptable_indices(corpus: &Corpus, flags: &ProfanityFlags, allow_profanity: bool) -> Vec<usize> {
    (0..corpus.len())
        .filter(|&i| is_acceptable(corpus, flags, allow_profanity, i))
        .collect()
}

/// Pick a uniformly random acceptable index.
///
/// Draws uniformly over the whole corpus and keeps the first acceptable draw. The
/// acceptable set is checked for emptiness up front, and after a bounded number of
/// rejections the pick comes straight from that set, so the call always terminates.
pub fn pick<R: Rng + ?Sized>(
    corpus: &Corpus,
    flags: &ProfanityFlags,
    allow_profanity: bool,
    rng: &mut R,
) -> Result<usize, SelectionError> {
    if corpus.is_empty() {
        return Err(SelectionError::EmptyCorpus);
    }

    let acceptable = acceptable_indices(corpus, flags, allow_profanity);
    if acceptable.is_empty() {
        return Err(SelectionError::NoEligibleLine);
    }

    let max_attempts = corpus.len().saturating_mul(REJECTION_ROUNDS);
    for _ in 0..max_attempts {
        let i = rng.gen_range(0..corpus.len());
        if is_acceptable(corpus, flags, allow_profanity, i) {
            return Ok(i);
        }
    }

    debug!("Rejection sampling exhausted after {} draws; drawing from acceptable set", max_attempts);
    Ok(acceptable[rng.gen_range(0..acceptable.len())])
}

/// Convenience wrapper returning the picked line
pub fn pick_line<R: Rng + ?Sized>(
    corpus: &Corpus,
    flags: &ProfanityFlags,
    allow_profanity: bool,
    rng: &mut R,
) -> Result<Pick, SelectionError> {
    let i = pick(corpus, flags, allow_profanity, rng)?;
    let line = &corpus[i];
    Ok(Pick {
        text: line.text.clone(),
        meta: line.meta.clone(),
        index: i,
    })
}

/// Options for the streaming sampler
#[derive(Debug, Clone)]
pub struct StreamOptions<'a> {
    pub allow_profanity: bool,
    pub prefer_filename_split: bool,
    /// Lines longer than this (bytes) are never selected
    pub max_line_len: usize,
    /// Positional flags, consulted when profanity is not allowed
    pub flags: Option<&'a ProfanityFlags>,
    pub reader: ReaderConfig,
}

impl Default for StreamOptions<'_> {
    fn default() -> Self {
        Self {
            allow_profanity: false,
            prefer_filename_split: true,
            max_line_len: MAX_DISPLAY_LEN,
            flags: None,
            reader: ReaderConfig::default(),
        }
    }
}

/// Single-item reservoir over a stream of candidates
#[derive(Debug)]
pub struct Reservoir<T> {
    seen: u64,
    held: Option<T>,
}

impl<T> Default for Reservoir<T> {
    fn default() -> Self {
        Self { seen: 0, held: None }
    }
}

impl<T> Reservoir<T> {
    /// Count one more valid item. Returns true if it should replace the held item,
    /// which happens with probability `1/k` for the k-th item.
    pub fn offer<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        self.seen += 1;
        rng.gen_range(0..self.seen) == 0
    }

    pub fn hold(&mut self, item: T) {
        self.held = Some(item);
    }

    pub fn seen(&self) -> u64 {
        self.seen
    }

    pub fn into_held(self) -> Option<T> {
        self.held
    }
}

/// Pick one random line straight from `lyrics_dir` without materializing the corpus.
///
/// Valid lines are non-marker lines no longer than `max_line_len` that pass the
/// profanity filter. Each file's metadata is resolved at most once, the first time
/// one of its lines is held.
pub async fn pick_streaming<R: Rng + ?Sized>(
    lyrics_dir: impl AsRef<Path>,
    resolver: &MetadataResolver,
    options: &StreamOptions<'_>,
    rng: &mut R,
) -> Result<Pick, SelectionError> {
    let lyrics_dir = lyrics_dir.as_ref();
    let mut reservoir = Reservoir::default();
    let mut corpus_index = 0usize;

    for file in list_lyric_files(lyrics_dir).await {
        let mut lines = match LyricLines::open(&file.path, &options.reader).await {
            Ok(lines) => lines,
            Err(e) => {
                warn!("Skipping unreadable lyric file: {}", e);
                continue;
            }
        };

        let mut file_meta: Option<Arc<TrackMetadata>> = None;

        loop {
            let text = match lines.next_line().await {
                Ok(Some(text)) => text,
                Ok(None) => break,
                Err(e) => {
                    warn!("Read error in {}: {}", file.path.display(), e);
                    break;
                }
            };
            let index = corpus_index;
            corpus_index += 1;

            if is_section_marker(&text) || text.len() > options.max_line_len {
                continue;
            }
            if !options.allow_profanity && options.flags.is_some_and(|f| f.is_profane(index)) {
                continue;
            }

            if reservoir.offer(rng) {
                let meta = file_meta
                    .get_or_insert_with(|| {
                        Arc::new(resolver.resolve(&file.file_name, options.prefer_filename_split))
                    })
                    .clone();
                reservoir.hold(Pick { text, meta, index });
            }
        }
    }

    if let Some(flags) = options.flags {
        if !options.allow_profanity && flags.len() != corpus_index {
            warn!(
                "Profanity cache has {} entries but {} lines were streamed; flags may be stale",
                flags.len(),
                corpus_index
            );
        }
    }

    debug!("Streaming pass saw {} lines, {} valid", corpus_index, reservoir.seen());

    if corpus_index == 0 {
        return Err(SelectionError::EmptyCorpus);
    }
    reservoir.into_held().ok_or(SelectionError::NoEligibleLine)
}
