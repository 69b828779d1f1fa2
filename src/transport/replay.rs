//! Canned-report transport.
//!
//! Serves a fixed report per [`Mode`] in fixed-size chunks. Used for offline
//! runs (`kline analyze --replay-dir`) and throughout the tests.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::{ChunkStream, StreamTransport, TransportError};
use crate::session::{AnalysisRequest, Mode};

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_CHARS: usize = 64;

/// Split text into pieces of at most `size` characters.
///
/// Splits only on character boundaries; a `size` of zero is treated as one.
pub fn split_chunks(text: &str, size: usize) -> Vec<String> {
    let size = size.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut count = 0;
    for ch in text.chars() {
        current.push(ch);
        count += 1;
        if count == size {
            chunks.push(std::mem::take(&mut current));
            count = 0;
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Replays stored reports.
#[derive(Debug)]
pub struct ReplayTransport {
    reports: HashMap<Mode, String>,
    chunk_chars: usize,
    delay: Option<Duration>,
    requests: Mutex<Vec<AnalysisRequest>>,
}

impl Default for ReplayTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplayTransport {
    pub fn new() -> Self {
        Self {
            reports: HashMap::new(),
            chunk_chars: DEFAULT_CHUNK_CHARS,
            delay: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Load `year.yaml`, `month.yaml` and `day.yaml` from a directory.
    ///
    /// Missing files are skipped; requests for those modes fail with 404.
    pub fn from_dir(dir: &Path) -> io::Result<Self> {
        let mut transport = Self::new();
        for mode in [Mode::Year, Mode::Month, Mode::Day] {
            let path = dir.join(format!("{}.yaml", mode));
            if path.exists() {
                transport = transport.with_report(mode, fs::read_to_string(&path)?);
            }
        }
        Ok(transport)
    }

    pub fn with_report(mut self, mode: Mode, text: impl Into<String>) -> Self {
        self.reports.insert(mode, text.into());
        self
    }

    pub fn with_chunk_chars(mut self, chunk_chars: usize) -> Self {
        self.chunk_chars = chunk_chars.max(1);
        self
    }

    /// Pause before every chunk.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn has_report(&self, mode: Mode) -> bool {
        self.reports.contains_key(&mode)
    }

    /// Every request received so far, in order.
    pub fn requests(&self) -> Vec<AnalysisRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl StreamTransport for ReplayTransport {
    async fn open(
        &self,
        request: &AnalysisRequest,
        cancel: CancellationToken,
    ) -> Result<ChunkStream, TransportError> {
        self.requests.lock().push(request.clone());

        let text = self
            .reports
            .get(&request.mode)
            .ok_or_else(|| TransportError::Status {
                status: 404,
                body: format!("no {} report to replay", request.mode),
            })?;

        let chunks = split_chunks(text, self.chunk_chars);
        let delay = self.delay;
        let stream = stream::iter(chunks)
            .then(move |chunk| async move {
                if let Some(delay) = delay {
                    tokio::time::sleep(delay).await;
                }
                Ok::<_, TransportError>(chunk)
            })
            .take_until(cancel.cancelled_owned());
        Ok(stream.boxed())
    }
}
