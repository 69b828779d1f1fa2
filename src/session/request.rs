//! Outbound request shape.
//!
//! Serialised as camelCase JSON:
//!
//! ```json
//! {
//!   "name": "张三", "gender": "male",
//!   "birthDate": "1990-03-14", "birthTime": "08:30",
//!   "mode": "month", "targetYear": 2024,
//!   "selectedYearPoint": { "age": 35, "year": 2024, ... }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::anchor::{CoarseAnchor, MediumAnchor};
use crate::report::Level;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" | "男" => Ok(Gender::Male),
            "female" | "f" | "女" => Ok(Gender::Female),
            other => Err(format!("unknown gender '{}' (expected male or female)", other)),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Male => write!(f, "male"),
            Gender::Female => write!(f, "female"),
        }
    }
}

/// Who the report is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub gender: Gender,
    pub birth_date: String,
    pub birth_time: String,
}

impl Identity {
    pub fn new(gender: Gender, birth_date: impl Into<String>, birth_time: impl Into<String>) -> Self {
        Self {
            name: None,
            gender,
            birth_date: birth_date.into(),
            birth_time: birth_time.into(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Birth date and time are both present.
    pub fn is_complete(&self) -> bool {
        !self.birth_date.trim().is_empty() && !self.birth_time.trim().is_empty()
    }
}

/// Report granularity requested from the generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Year,
    Month,
    Day,
}

impl From<Level> for Mode {
    fn from(level: Level) -> Self {
        match level {
            Level::Coarse => Mode::Year,
            Level::Medium => Mode::Month,
            Level::Fine => Mode::Day,
        }
    }
}

impl From<Mode> for Level {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Year => Level::Coarse,
            Mode::Month => Level::Medium,
            Mode::Day => Level::Fine,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Level::from(*self))
    }
}

/// A request that fails the generator's consistency rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("{mode} request is missing {what}")]
    Missing { mode: Mode, what: &'static str },

    #[error("selected year point is {anchor} but target year is {target}")]
    YearMismatch { anchor: i32, target: i32 },

    #[error("selected month point is {anchor} but target month is {target}")]
    MonthMismatch { anchor: u32, target: u32 },

    #[error("target month {0} is outside 1-12")]
    MonthOutOfRange(u32),
}

/// Payload sent to the stream endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    #[serde(flatten)]
    pub identity: Identity,
    pub mode: Mode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_year: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_month: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_year_point: Option<CoarseAnchor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_month_point: Option<MediumAnchor>,
}

impl AnalysisRequest {
    /// Whole-life yearly report.
    pub fn year(identity: Identity) -> Self {
        Self {
            identity,
            mode: Mode::Year,
            target_year: None,
            target_month: None,
            selected_year_point: None,
            selected_month_point: None,
        }
    }

    /// Monthly report for the anchor's year.
    pub fn month(identity: Identity, coarse: CoarseAnchor) -> Self {
        Self {
            target_year: Some(coarse.year),
            selected_year_point: Some(coarse),
            mode: Mode::Month,
            ..Self::year(identity)
        }
    }

    /// Daily report for the medium anchor's month.
    pub fn day(identity: Identity, coarse: CoarseAnchor, medium: MediumAnchor) -> Self {
        Self {
            target_year: Some(medium.year),
            target_month: Some(medium.month),
            selected_year_point: Some(coarse),
            selected_month_point: Some(medium),
            mode: Mode::Day,
            ..Self::year(identity)
        }
    }

    /// Level of the records this request produces.
    pub fn level(&self) -> Level {
        self.mode.into()
    }

    /// Check the same consistency rules the generator enforces.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.mode == Mode::Year {
            return Ok(());
        }

        let missing = |what| RequestError::Missing {
            mode: self.mode,
            what,
        };
        let target_year = self.target_year.ok_or_else(|| missing("targetYear"))?;
        let coarse = self
            .selected_year_point
            .as_ref()
            .ok_or_else(|| missing("selectedYearPoint"))?;
        if coarse.year != target_year {
            return Err(RequestError::YearMismatch {
                anchor: coarse.year,
                target: target_year,
            });
        }

        if self.mode == Mode::Day {
            let target_month = self.target_month.ok_or_else(|| missing("targetMonth"))?;
            if !(1..=12).contains(&target_month) {
                return Err(RequestError::MonthOutOfRange(target_month));
            }
            let medium = self
                .selected_month_point
                .as_ref()
                .ok_or_else(|| missing("selectedMonthPoint"))?;
            if medium.year != target_year {
                return Err(RequestError::YearMismatch {
                    anchor: medium.year,
                    target: target_year,
                });
            }
            if medium.month != target_month {
                return Err(RequestError::MonthMismatch {
                    anchor: medium.month,
                    target: target_month,
                });
            }
        }
        Ok(())
    }
}
