//! Chart records and their typed accumulator.
//!
//! A record arrives field by field. [`RecordAccumulator`] collects the known
//! fields by [`RecordField`] and keeps unrecognised names in an extras bucket
//! so nothing the generator sends is lost. [`RecordAccumulator::build`]
//! performs the numeric coercion and rejects records that cannot be keyed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::scalar::{is_exact_integer, ScalarValue};

/// Granularity of a report view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Level {
    /// One record per year of life.
    #[serde(rename = "year")]
    Coarse,
    /// One record per month of a selected year.
    #[serde(rename = "month")]
    Medium,
    /// One record per day of a selected month.
    #[serde(rename = "day")]
    Fine,
}

impl Level {
    /// Wire name of the level (`year`, `month`, `day`).
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Coarse => "year",
            Level::Medium => "month",
            Level::Fine => "day",
        }
    }

    /// The next finer level, if any.
    pub fn finer(self) -> Option<Level> {
        match self {
            Level::Coarse => Some(Level::Medium),
            Level::Medium => Some(Level::Fine),
            Level::Fine => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Field names a record understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordField {
    Age,
    Year,
    Month,
    Day,
    MonthLabel,
    DaYun,
    GanZhi,
    Open,
    Close,
    High,
    Low,
    Score,
    Reason,
}

impl RecordField {
    /// Map a wire name to a field. Names are case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        let field = match name {
            "age" => RecordField::Age,
            "year" => RecordField::Year,
            "month" => RecordField::Month,
            "day" => RecordField::Day,
            "monthLabel" | "monthInChinese" => RecordField::MonthLabel,
            "daYun" => RecordField::DaYun,
            "ganZhi" => RecordField::GanZhi,
            "open" => RecordField::Open,
            "close" => RecordField::Close,
            "high" => RecordField::High,
            "low" => RecordField::Low,
            "score" => RecordField::Score,
            "reason" => RecordField::Reason,
            _ => return None,
        };
        Some(field)
    }

    /// `reason` is the last field of a record and commits it.
    pub fn is_terminal(self) -> bool {
        self == RecordField::Reason
    }
}

/// Why a record was dropped at commit time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordRejection {
    MissingAge,
    MissingYear,
}

impl fmt::Display for RecordRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordRejection::MissingAge => write!(f, "age missing or not an integer"),
            RecordRejection::MissingYear => write!(f, "year missing or not an integer"),
        }
    }
}

/// Collects the fields of one in-progress record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordAccumulator {
    known: BTreeMap<RecordField, ScalarValue>,
    extras: BTreeMap<String, ScalarValue>,
}

impl RecordAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, replacing any earlier value for the same name.
    ///
    /// Returns the recognised field, or `None` if the name went to extras.
    pub fn set(&mut self, name: &str, value: ScalarValue) -> Option<RecordField> {
        match RecordField::from_name(name) {
            Some(field) => {
                self.known.insert(field, value);
                Some(field)
            }
            None => {
                self.extras.insert(name.to_string(), value);
                None
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.known.is_empty() && self.extras.is_empty()
    }

    fn number(&self, field: RecordField) -> f64 {
        self.known
            .get(&field)
            .map(ScalarValue::to_number)
            .unwrap_or(f64::NAN)
    }

    fn text(&self, field: RecordField) -> String {
        self.known
            .get(&field)
            .map(ScalarValue::to_text)
            .unwrap_or_default()
    }

    fn integer(&self, field: RecordField) -> Option<i64> {
        let n = self.number(field);
        is_exact_integer(n).then_some(n as i64)
    }

    fn ordinal(&self, field: RecordField) -> Option<u32> {
        self.integer(field)
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
    }

    /// Coerce the collected fields into a [`ChartPoint`].
    pub fn build(self) -> Result<ChartPoint, RecordRejection> {
        let age = self
            .integer(RecordField::Age)
            .ok_or(RecordRejection::MissingAge)?;
        let year = self
            .integer(RecordField::Year)
            .and_then(|y| i32::try_from(y).ok())
            .ok_or(RecordRejection::MissingYear)?;

        let month_label = self
            .known
            .get(&RecordField::MonthLabel)
            .map(ScalarValue::to_text);

        Ok(ChartPoint {
            age,
            year,
            month: self.ordinal(RecordField::Month),
            day: self.ordinal(RecordField::Day),
            month_label,
            da_yun: self.text(RecordField::DaYun),
            gan_zhi: self.text(RecordField::GanZhi),
            open: self.number(RecordField::Open),
            close: self.number(RecordField::Close),
            high: self.number(RecordField::High),
            low: self.number(RecordField::Low),
            score: self.number(RecordField::Score),
            reason: self.text(RecordField::Reason),
            level: None,
            extras: self.extras,
        })
    }
}

/// One point of the life chart.
///
/// Prices and score are `NaN` when the generator omitted them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub age: i64,
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month_label: Option<String>,
    pub da_yun: String,
    pub gan_zhi: String,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub score: f64,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<Level>,
    #[serde(flatten)]
    pub extras: BTreeMap<String, ScalarValue>,
}

impl ChartPoint {
    /// Stamp the record with the level it was produced for.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    /// The stamped level, or a guess from which date parts are present.
    pub fn infer_level(&self) -> Level {
        self.level.unwrap_or(if self.day.is_some() {
            Level::Fine
        } else if self.month.is_some() {
            Level::Medium
        } else {
            Level::Coarse
        })
    }

    /// Short date key for display (`1990`, `1990-03`, `1990-03-14`).
    pub fn date_key(&self) -> String {
        match (self.month, self.day) {
            (Some(m), Some(d)) => format!("{}-{:02}-{:02}", self.year, m, d),
            (Some(m), None) => format!("{}-{:02}", self.year, m),
            _ => self.year.to_string(),
        }
    }

    /// Whether the candle closed above its open.
    pub fn is_rising(&self) -> bool {
        self.close >= self.open
    }
}
