//! Text stream transports.
//!
//! A [`StreamTransport`] turns an [`AnalysisRequest`] into a stream of text
//! fragments. Fragment boundaries are arbitrary; the parser copes with any
//! split. Implementations:
//!
//! - [`HttpTransport`] posts the request to the generator endpoint
//! - [`ReplayTransport`] serves canned reports (offline runs and tests)

pub mod http;
pub mod replay;
pub mod sse;
pub mod utf8;

pub use http::HttpTransport;
pub use replay::ReplayTransport;
pub use sse::{SseDelta, SseDeltaDecoder};
pub use utf8::Utf8ChunkDecoder;

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::session::AnalysisRequest;

/// Errors raised while opening or reading a stream.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The request was superseded or aborted. Never shown to the user.
    #[error("request cancelled")]
    Cancelled,

    #[error("generator returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),
}

impl TransportError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, TransportError::Cancelled)
    }
}

/// Stream of text fragments.
pub type ChunkStream = BoxStream<'static, Result<String, TransportError>>;

/// Opens a text stream for a request.
///
/// Implementations should stop producing fragments once `cancel` fires.
/// Callers also race every read against the token.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    async fn open(
        &self,
        request: &AnalysisRequest,
        cancel: CancellationToken,
    ) -> Result<ChunkStream, TransportError>;
}
