//! Item feeds consumed by the stream loops.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use warden_core::ModerationItem;

#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    #[error("Feed I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed item on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// A blocking source of items, yielded in platform order.
///
/// `Ok(None)` means the feed is exhausted.
pub trait ItemFeed: Send {
    fn next_item(&mut self) -> Result<Option<ModerationItem>, FeedError>;
}

/// Feed reading one JSON-encoded [`ModerationItem`] per line. Blank lines
/// are skipped.
pub struct JsonLinesFeed<R> {
    reader: R,
    line: usize,
    buf: String,
}

impl JsonLinesFeed<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, FeedError> {
        Ok(Self::new(BufReader::new(File::open(path)?)))
    }
}

impl<R: BufRead> JsonLinesFeed<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buf: String::new(),
        }
    }
}

impl<R: BufRead + Send> ItemFeed for JsonLinesFeed<R> {
    fn next_item(&mut self) -> Result<Option<ModerationItem>, FeedError> {
        loop {
            self.buf.clear();
            if self.reader.read_line(&mut self.buf)? == 0 {
                return Ok(None);
            }
            self.line += 1;
            let trimmed = self.buf.trim();
            if trimmed.is_empty() {
                continue;
            }
            return serde_json::from_str(trimmed)
                .map(Some)
                .map_err(|source| FeedError::Parse {
                    line: self.line,
                    source,
                });
        }
    }
}
