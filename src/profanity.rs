// Profanity flag cache: one `0`/`1` per corpus line, keyed by position.
//
// The cache is trusted whenever its line count equals the corpus line count.
// Edits that keep the count unchanged are not detected.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::corpus::Corpus;

/// Per-line profanity flags in corpus order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfanityFlags {
    flags: Vec<bool>,
}

impl ProfanityFlags {
    pub fn new(flags: Vec<bool>) -> Self {
        Self { flags }
    }

    /// Every line clean
    pub fn all_clean(len: usize) -> Self {
        Self { flags: vec![false; len] }
    }

    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    /// Flag for corpus index `i`; indices past the end count as clean
    pub fn is_profane(&self, i: usize) -> bool {
        self.flags.get(i).copied().unwrap_or(false)
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.flags
    }

    pub fn profane_count(&self) -> usize {
        self.flags.iter().filter(|&&f| f).count()
    }

    /// Serialized cache form: one decimal digit per line
    pub fn to_cache_string(&self) -> String {
        let mut out = String::with_capacity(self.flags.len() * 2);
        for &flag in &self.flags {
            out.push(if flag { '1' } else { '0' });
            out.push('\n');
        }
        out
    }

    /// Parse cache contents. Each line is read as an integer, non-zero meaning profane;
    /// lines that fail to parse count as clean.
    pub fn parse_cache(content: &str) -> Self {
        let flags = content
            .lines()
            .map(|line| line.trim().parse::<i64>().map(|v| v != 0).unwrap_or(false))
            .collect();
        Self { flags }
    }
}

/// Newline-separated classifier input. Bare `\r` inside a line becomes a space so
/// classifiers reading with universal newlines still see one record per corpus line.
pub fn classifier_input(lines: &[String]) -> String {
    let mut input = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum());
    for line in lines {
        input.extend(line.chars().map(|c| if c == '\r' { ' ' } else { c }));
        input.push('\n');
    }
    input
}

/// Batch profanity classifier
#[async_trait]
pub trait Classifier: Send + Sync {
    /// One flag per input line, same order and length
    async fn classify(&self, lines: &[String]) -> Result<Vec<bool>>;
}

/// Runs an external program: lines on stdin (see [`classifier_input`]), one `0`/`1`
/// per line on stdout
#[derive(Debug, Clone)]
pub struct CommandClassifier {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandClassifier {
    pub fn new(program: impl Into<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    async fn run(&self, lines: &[String]) -> Result<Vec<bool>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to start classifier `{}`", self.program))?;

        let mut stdin = child.stdin.take().context("classifier stdin unavailable")?;
        let mut stdout = child.stdout.take().context("classifier stdout unavailable")?;

        let input = classifier_input(lines);

        // WHY: write and read concurrently so a large batch can't deadlock on full pipes
        let writer = async move {
            stdin.write_all(input.as_bytes()).await?;
            stdin.shutdown().await?;
            drop(stdin);
            Ok::<_, std::io::Error>(())
        };
        let reader = async {
            let mut output = String::new();
            stdout.read_to_string(&mut output).await?;
            Ok::<_, std::io::Error>(output)
        };
        let (written, output) = tokio::join!(writer, reader);
        written.context("failed to send lines to classifier")?;
        let output = output.context("classifier output unreadable")?;

        let status = child.wait().await?;
        if !status.success() {
            anyhow::bail!("classifier `{}` exited with {}", self.program, status);
        }

        let flags = output
            .lines()
            .map(|line| match line.trim() {
                "0" => Ok(false),
                "1" => Ok(true),
                other => other
                    .parse::<i64>()
                    .map(|v| v != 0)
                    .map_err(|_| anyhow::anyhow!("malformed classifier output line: {other:?}")),
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(flags)
    }
}

#[async_trait]
impl Classifier for CommandClassifier {
    async fn classify(&self, lines: &[String]) -> Result<Vec<bool>> {
        debug!("Running classifier `{}` on {} lines", self.program, lines.len());
        match tokio::time::timeout(self.timeout, self.run(lines)).await {
            Ok(result) => result,
            Err(_) => anyhow::bail!(
                "classifier `{}` timed out after {:?}",
                self.program,
                self.timeout
            ),
        }
    }
}

/// Cache status relative to the current corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Missing,
    SizeMismatch { cached: usize, expected: usize },
    Valid,
}

/// Persisted profanity flags at a fixed path
#[derive(Debug, Clone)]
pub struct ProfanityCache {
    path: PathBuf,
}

impl ProfanityCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read raw flags from disk, `None` if the file can't be read
    pub async fn read(&self) -> Option<ProfanityFlags> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Some(ProfanityFlags::parse_cache(&content)),
            Err(e) => {
                debug!("No usable profanity cache at {}: {}", self.path.display(), e);
                None
            }
        }
    }

    /// Overwrite the cache file with `flags`
    pub async fn write(&self, flags: &ProfanityFlags) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, flags.to_cache_string())
            .await
            .with_context(|| format!("failed to write profanity cache {}", self.path.display()))?;
        Ok(())
    }

    /// Compare the cache against a corpus of `corpus_len` lines
    pub fn state_of(cached: Option<&ProfanityFlags>, corpus_len: usize) -> CacheState {
        match cached {
            None => CacheState::Missing,
            Some(flags) if flags.len() != corpus_len => CacheState::SizeMismatch {
                cached: flags.len(),
                expected: corpus_len,
            },
            Some(_) => CacheState::Valid,
        }
    }

    /// Classify every corpus line and persist the result.
    ///
    /// A failing or misbehaving classifier is an error and leaves the cache file
    /// untouched, so a good cache survives and a missing one is retried next run.
    pub async fn regenerate<C: Classifier + ?Sized>(
        &self,
        corpus: &Corpus,
        classifier: &C,
    ) -> Result<ProfanityFlags> {
        info!("Regenerating profanity cache for {} lines", corpus.len());

        let flags = classifier
            .classify(&corpus.texts())
            .await
            .context("profanity classifier failed")?;
        if flags.len() != corpus.len() {
            anyhow::bail!(
                "classifier returned {} flags for {} lines",
                flags.len(),
                corpus.len()
            );
        }

        let flags = ProfanityFlags::new(flags);
        if let Err(e) = self.write(&flags).await {
            warn!("{:#}", e);
        }

        info!("Profanity cache holds {} flagged of {} lines", flags.profane_count(), flags.len());
        Ok(flags)
    }

    /// Regenerate, falling back to all-clean flags for this run only
    async fn regenerate_or_clean<C: Classifier + ?Sized>(
        &self,
        corpus: &Corpus,
        classifier: &C,
    ) -> ProfanityFlags {
        match self.regenerate(corpus, classifier).await {
            Ok(flags) => flags,
            Err(e) => {
                warn!("Treating all lines as clean, cache not updated: {:#}", e);
                ProfanityFlags::all_clean(corpus.len())
            }
        }
    }

    /// Load flags for `corpus`, regenerating on a missing or mismatched cache,
    /// or unconditionally when `force_regenerate` is set.
    pub async fn load_or_regenerate<C: Classifier + ?Sized>(
        &self,
        corpus: &Corpus,
        classifier: &C,
        force_regenerate: bool,
    ) -> ProfanityFlags {
        if force_regenerate {
            return self.regenerate_or_clean(corpus, classifier).await;
        }

        let cached = self.read().await;
        match Self::state_of(cached.as_ref(), corpus.len()) {
            CacheState::Valid => {
                debug!("Profanity cache valid ({} lines)", corpus.len());
                cached.unwrap_or_else(|| ProfanityFlags::all_clean(corpus.len()))
            }
            CacheState::Missing => {
                info!("Profanity cache missing at {}", self.path.display());
                self.regenerate_or_clean(corpus, classifier).await
            }
            CacheState::SizeMismatch { cached, expected } => {
                info!("Profanity cache stale: {} cached vs {} corpus lines", cached, expected);
                self.regenerate_or_clean(corpus, classifier).await
            }
        }
    }
}
