//! Session lifecycle states.

use serde::Serialize;
use std::fmt;

/// Where the session is in its request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// Nothing submitted yet, or restarted.
    #[default]
    Idle,
    /// Request issued, no data received yet.
    Loading,
    /// At least one chunk received.
    Streaming,
    /// Result (or restored frame) on display.
    Done,
    /// Last request failed or came back empty.
    Error,
}

impl SessionState {
    /// User-facing status label.
    pub fn label(self) -> &'static str {
        match self {
            SessionState::Idle => "待启动",
            SessionState::Loading => "正在连接AI...",
            SessionState::Streaming => "AI解析中",
            SessionState::Done => "再来一次",
            SessionState::Error => "出错了",
        }
    }

    /// A request is outstanding.
    pub fn is_busy(self) -> bool {
        matches!(self, SessionState::Loading | SessionState::Streaming)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Loading => "loading",
            SessionState::Streaming => "streaming",
            SessionState::Done => "done",
            SessionState::Error => "error",
        };
        write!(f, "{}", name)
    }
}
