use anyhow::Result;
use std::path::Path;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

/// Configuration for lyric file reading
#[derive(Debug, Clone)]
pub struct ReaderConfig {
    /// Buffer size for async reading (default: 8KB)
    pub buffer_size: usize,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self { buffer_size: 8192 }
    }
}

/// Strip exactly one trailing line terminator (`\n` or `\r\n`)
pub fn strip_line_terminator(line: &str) -> &str {
    match line.strip_suffix('\n') {
        Some(rest) => rest.strip_suffix('\r').unwrap_or(rest),
        None => line,
    }
}

/// Streams the non-empty lines of one lyric file.
///
/// Bytes are decoded lossily so a stray non-UTF-8 byte costs one replacement
/// character, not the whole file.
pub struct LyricLines {
    reader: BufReader<File>,
    buf: Vec<u8>,
}

impl LyricLines {
    /// Open a lyric file for line-by-line reading
    pub async fn open(path: impl AsRef<Path>, config: &ReaderConfig) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open file {}: {}", path.display(), e))?;
        debug!("Opened lyric file: {}", path.display());
        Ok(Self {
            reader: BufReader::with_capacity(config.buffer_size, file),
            buf: Vec::new(),
        })
    }

    /// Next non-empty line with its terminator removed, or `None` at end of file
    pub async fn next_line(&mut self) -> Result<Option<String>> {
        loop {
            self.buf.clear();
            let n = self.reader.read_until(b'\n', &mut self.buf).await?;
            if n == 0 {
                return Ok(None);
            }

            let text = String::from_utf8_lossy(&self.buf);
            let line = strip_line_terminator(&text);
            if line.is_empty() {
                continue;
            }
            return Ok(Some(line.to_string()));
        }
    }
}
