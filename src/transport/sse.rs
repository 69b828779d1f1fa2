//! Chat-completions server-sent events.
//!
//! OpenAI-compatible endpoints stream lines of the form
//! `data: {"choices":[{"delta":{"content":"..."}}]}` and end with
//! `data: [DONE]`. Only the delta content matters here.

use serde_json::Value;
use tracing::trace;

/// One decoded SSE payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseDelta {
    Content(String),
    Done,
}

/// Line-buffered SSE decoder.
#[derive(Debug, Default)]
pub struct SseDeltaDecoder {
    buffer: String,
    done: bool,
}

impl SseDeltaDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// `[DONE]` was seen. Later input is ignored.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feed decoded text, returning the payloads of all complete lines.
    pub fn push(&mut self, text: &str) -> Vec<SseDelta> {
        self.buffer.push_str(text);
        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };
        let tail = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, tail);

        complete[..last_newline]
            .split('\n')
            .filter_map(|line| self.decode_line(line))
            .collect()
    }

    /// Decode a final unterminated line.
    pub fn finish(&mut self) -> Vec<SseDelta> {
        let leftover = std::mem::take(&mut self.buffer);
        self.decode_line(&leftover).into_iter().collect()
    }

    /// Concatenated content of [`push`](Self::push).
    pub fn push_content(&mut self, text: &str) -> String {
        collect_content(self.push(text))
    }

    /// Concatenated content of [`finish`](Self::finish).
    pub fn finish_content(&mut self) -> String {
        collect_content(self.finish())
    }

    fn decode_line(&mut self, line: &str) -> Option<SseDelta> {
        if self.done {
            return None;
        }
        let payload = line.trim_end_matches('\r').strip_prefix("data:")?.trim();
        if payload == "[DONE]" {
            self.done = true;
            return Some(SseDelta::Done);
        }
        let json: Value = match serde_json::from_str(payload) {
            Ok(json) => json,
            Err(e) => {
                trace!(error = %e, "skipping malformed SSE payload");
                return None;
            }
        };
        let content = json
            .pointer("/choices/0/delta/content")
            .and_then(Value::as_str)?;
        (!content.is_empty()).then(|| SseDelta::Content(content.to_string()))
    }
}

fn collect_content(deltas: Vec<SseDelta>) -> String {
    deltas
        .into_iter()
        .filter_map(|d| match d {
            SseDelta::Content(text) => Some(text),
            SseDelta::Done => None,
        })
        .collect()
}
