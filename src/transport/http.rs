//! HTTP streaming transport.
//!
//! Posts the [`AnalysisRequest`] as JSON and streams the response body as
//! text. Endpoints that proxy a chat-completions API can be read in SSE mode,
//! in which case only the delta content is forwarded.

use async_trait::async_trait;
use futures::stream::{self, Stream, StreamExt};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::sse::SseDeltaDecoder;
use super::utf8::Utf8ChunkDecoder;
use super::{ChunkStream, StreamTransport, TransportError};
use crate::session::AnalysisRequest;

const USER_AGENT: &str = concat!("kline/", env!("CARGO_PKG_VERSION"));

/// Streams reports from an HTTP endpoint.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    sse: bool,
}

impl HttpTransport {
    /// Build a transport for `endpoint` with an overall request timeout.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            sse: false,
        })
    }

    /// Treat the body as chat-completions server-sent events.
    pub fn with_sse(mut self, sse: bool) -> Self {
        self.sse = sse;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl StreamTransport for HttpTransport {
    async fn open(
        &self,
        request: &AnalysisRequest,
        cancel: CancellationToken,
    ) -> Result<ChunkStream, TransportError> {
        debug!(endpoint = %self.endpoint, mode = %request.mode, "opening stream");
        let send = self.client.post(&self.endpoint).json(request).send();

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TransportError::Cancelled),
            response = send => response.map_err(network_error)?,
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = Box::pin(response.bytes_stream());
        Ok(decode_body(body, self.sse, cancel).boxed())
    }
}

fn network_error(e: reqwest::Error) -> TransportError {
    TransportError::Network(e.to_string())
}

struct BodyState<B> {
    body: B,
    utf8: Utf8ChunkDecoder,
    sse: Option<SseDeltaDecoder>,
    cancel: CancellationToken,
    finished: bool,
}

impl<B> BodyState<B> {
    fn translate(&mut self, text: String) -> String {
        match self.sse.as_mut() {
            Some(decoder) => decoder.push_content(&text),
            None => text,
        }
    }

    fn flush(&mut self) -> String {
        let tail = self.utf8.finish();
        match self.sse.as_mut() {
            Some(decoder) => {
                let mut text = decoder.push_content(&tail);
                text.push_str(&decoder.finish_content());
                text
            }
            None => tail,
        }
    }
}

/// Turn a byte stream into a text stream that stops on cancellation.
fn decode_body<B, T>(
    body: B,
    sse: bool,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<String, TransportError>> + Send + 'static
where
    B: Stream<Item = Result<T, reqwest::Error>> + Unpin + Send + 'static,
    T: AsRef<[u8]> + Send + 'static,
{
    let state = BodyState {
        body,
        utf8: Utf8ChunkDecoder::new(),
        sse: sse.then(SseDeltaDecoder::new),
        cancel,
        finished: false,
    };

    stream::unfold(state, |mut st| async move {
        loop {
            if st.finished {
                return None;
            }
            let next = tokio::select! {
                biased;
                _ = st.cancel.cancelled() => None,
                item = st.body.next() => Some(item),
            };
            let Some(item) = next else {
                st.finished = true;
                return Some((Err(TransportError::Cancelled), st));
            };
            match item {
                Some(Ok(bytes)) => {
                    let decoded = st.utf8.decode(bytes.as_ref());
                    let text = st.translate(decoded);
                    if !text.is_empty() {
                        return Some((Ok(text), st));
                    }
                }
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((Err(network_error(e)), st));
                }
                None => {
                    st.finished = true;
                    let tail = st.flush();
                    if tail.is_empty() {
                        return None;
                    }
                    return Some((Ok(tail), st));
                }
            }
        }
    })
}
