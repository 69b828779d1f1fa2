//! Anchor points sent as context with drill-down requests.

use serde::{Deserialize, Serialize};

use crate::report::ChartPoint;

/// The year record a month drill was started from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoarseAnchor {
    pub age: i64,
    pub year: i32,
    pub da_yun: String,
    pub gan_zhi: String,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub score: f64,
    pub reason: String,
}

impl From<&ChartPoint> for CoarseAnchor {
    fn from(point: &ChartPoint) -> Self {
        Self {
            age: point.age,
            year: point.year,
            da_yun: point.da_yun.clone(),
            gan_zhi: point.gan_zhi.clone(),
            open: point.open,
            close: point.close,
            high: point.high,
            low: point.low,
            score: point.score,
            reason: point.reason.clone(),
        }
    }
}

/// The month record a day drill was started from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediumAnchor {
    pub year: i32,
    pub month: u32,
    #[serde(rename = "monthInChinese", skip_serializing_if = "Option::is_none")]
    pub month_label: Option<String>,
    pub gan_zhi: String,
    pub open: f64,
    pub close: f64,
    pub high: f64,
    pub low: f64,
    pub score: f64,
    pub reason: String,
}

impl MediumAnchor {
    /// Build from a month record. `None` when the record has no month.
    pub fn from_point(point: &ChartPoint) -> Option<Self> {
        Some(Self {
            year: point.year,
            month: point.month?,
            month_label: point.month_label.clone(),
            gan_zhi: point.gan_zhi.clone(),
            open: point.open,
            close: point.close,
            high: point.high,
            low: point.low,
            score: point.score,
            reason: point.reason.clone(),
        })
    }
}
