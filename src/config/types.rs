//! Configuration type definitions and defaults

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::report::ReportSchema;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    /// Validate all sections.
    pub fn validate(&self) -> Result<(), String> {
        self.endpoint.validate()?;
        self.parser.validate()?;
        self.display.validate()
    }
}

/// Report generator endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// URL the analysis request is POSTed to
    #[serde(default = "default_url")]
    pub url: String,
    /// Overall request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Body is chat-completions SSE rather than plain text
    #[serde(default)]
    pub sse: bool,
}

pub fn default_url() -> String {
    "http://127.0.0.1:8787/api/life-kline".to_string()
}

pub fn default_timeout_secs() -> u64 {
    300
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: default_timeout_secs(),
            sse: false,
        }
    }
}

impl EndpointConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), String> {
        let url = self.url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(format!(
                "endpoint.url '{}' must start with http:// or https://",
                self.url
            ));
        }
        if self.timeout_secs == 0 {
            return Err("endpoint.timeout_secs must be > 0".to_string());
        }
        if self.timeout_secs > 3600 {
            return Err(format!(
                "endpoint.timeout_secs {} exceeds maximum (3600s)",
                self.timeout_secs
            ));
        }
        Ok(())
    }
}

/// Section names of the streamed report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParserConfig {
    #[serde(default = "default_tags_section")]
    pub tags_section: String,
    #[serde(default = "default_records_section")]
    pub records_section: String,
}

pub fn default_tags_section() -> String {
    ReportSchema::default().tags_section
}

pub fn default_records_section() -> String {
    ReportSchema::default().records_section
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            tags_section: default_tags_section(),
            records_section: default_records_section(),
        }
    }
}

impl ParserConfig {
    pub fn schema(&self) -> ReportSchema {
        ReportSchema::new(self.tags_section.clone(), self.records_section.clone())
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.tags_section.trim().is_empty() {
            return Err("parser.tags_section must not be empty".to_string());
        }
        if self.records_section.trim().is_empty() {
            return Err("parser.records_section must not be empty".to_string());
        }
        if self.tags_section == self.records_section {
            return Err(format!(
                "parser.tags_section and parser.records_section are both '{}'",
                self.tags_section
            ));
        }
        Ok(())
    }
}

/// Terminal output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Maximum display width of the reason column
    #[serde(default = "default_reason_width")]
    pub reason_width: usize,
}

pub fn default_reason_width() -> usize {
    36
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            reason_width: default_reason_width(),
        }
    }
}

impl DisplayConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.reason_width < 8 {
            return Err(format!(
                "display.reason_width {} is below minimum (8)",
                self.reason_width
            ));
        }
        Ok(())
    }
}
