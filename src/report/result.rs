//! Accumulated report data for one request.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use super::record::{ChartPoint, Level};
use super::scalar::ScalarValue;

/// Everything parsed so far for one request.
///
/// Grows monotonically while a stream is consumed. Records are unique by
/// `age`; a later record with an already-seen age is dropped, not merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PartialResult {
    pub fields: BTreeMap<String, ScalarValue>,
    pub tags: Vec<String>,
    pub records: Vec<ChartPoint>,
    #[serde(skip)]
    seen_ages: BTreeSet<i64>,
}

impl PartialResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record unless its age was already committed.
    ///
    /// Returns `true` if the record was kept.
    pub fn push_record(&mut self, record: ChartPoint) -> bool {
        if !self.seen_ages.insert(record.age) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: ScalarValue) {
        self.fields.insert(name.into(), value);
    }

    pub fn push_tag(&mut self, tag: impl Into<String>) {
        self.tags.push(tag.into());
    }

    /// Look up a top-level field.
    pub fn field(&self, name: &str) -> Option<&ScalarValue> {
        self.fields.get(name)
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn has_records(&self) -> bool {
        !self.records.is_empty()
    }

    /// Stamp every record with `level`.
    pub fn stamp_level(&mut self, level: Level) {
        for record in &mut self.records {
            record.level = Some(level);
        }
    }

    /// Split into `(fields, tags, records)`.
    pub fn into_parts(self) -> (BTreeMap<String, ScalarValue>, Vec<String>, Vec<ChartPoint>) {
        (self.fields, self.tags, self.records)
    }
}
