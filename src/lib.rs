//! Life K-line client core
//!
//! Streams a YAML chart report from an analysis endpoint, surfaces
//! partial results while the text arrives, and drives the
//! year -> month -> day drill-down with back navigation.

pub mod config;
pub mod driver;
pub mod report;
pub mod session;
pub mod transport;

pub use config::Config;
pub use driver::SessionDriver;
pub use report::{ChartPoint, IncrementalRecordParser, Level, PartialResult};
pub use session::{AnalysisSession, SessionError, SessionState};
