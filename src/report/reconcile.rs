//! End-of-stream reconciliation.
//!
//! Once a stream completes, the full text is parsed again with a real YAML
//! parser. That parse is authoritative when it succeeds and is at least as
//! complete as the incremental one; otherwise the incremental result stands.
//! Records from both paths go through the same [`RecordAccumulator`]
//! coercion and age de-duplication, so the two are directly comparable.

use serde_yaml::Value;
use thiserror::Error;
use tracing::debug;

use super::parser::{ParseOutcome, ReportSchema};
use super::record::RecordAccumulator;
use super::result::PartialResult;
use super::scalar::ScalarValue;

/// Why the authoritative parse was rejected.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("report is not valid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("malformed report: {0}")]
    Malformed(String),
}

/// Which parse produced the final result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultSource {
    Authoritative,
    Incremental,
}

/// The result chosen at end of stream.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub result: PartialResult,
    pub source: ResultSource,
}

/// Parse the complete report text.
pub fn parse_authoritative(
    raw: &str,
    schema: &ReportSchema,
) -> Result<PartialResult, ReconcileError> {
    let document: Value = serde_yaml::from_str(raw)?;
    let Value::Mapping(root) = document else {
        return Err(ReconcileError::Malformed(
            "top level is not a mapping".to_string(),
        ));
    };

    let mut result = PartialResult::new();
    for (key, value) in &root {
        let Some(name) = key_name(key) else {
            continue;
        };
        if name == schema.tags_section {
            collect_tags(&mut result, value)?;
        } else if name == schema.records_section {
            collect_records(&mut result, value)?;
        } else if let Some(scalar) = to_scalar(value) {
            result.set_field(name, scalar);
        }
    }
    Ok(result)
}

/// Choose between the authoritative and the incremental result.
pub fn reconcile(outcome: ParseOutcome, schema: &ReportSchema) -> Reconciled {
    let ParseOutcome { raw, partial } = outcome;
    match parse_authoritative(&raw, schema) {
        Ok(full) if full.has_records() && full.record_count() >= partial.record_count() => {
            debug!(records = full.record_count(), "using authoritative parse");
            Reconciled {
                result: full,
                source: ResultSource::Authoritative,
            }
        }
        Ok(full) => {
            debug!(
                authoritative = full.record_count(),
                incremental = partial.record_count(),
                "authoritative parse less complete, keeping incremental result"
            );
            Reconciled {
                result: partial,
                source: ResultSource::Incremental,
            }
        }
        Err(e) => {
            debug!(error = %e, "authoritative parse failed, keeping incremental result");
            Reconciled {
                result: partial,
                source: ResultSource::Incremental,
            }
        }
    }
}

fn key_name(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn to_scalar(value: &Value) -> Option<ScalarValue> {
    match value {
        Value::String(s) => Some(ScalarValue::String(s.clone())),
        Value::Number(n) => n.as_f64().map(ScalarValue::Number),
        Value::Bool(b) => Some(ScalarValue::Bool(*b)),
        Value::Null => Some(ScalarValue::String(String::new())),
        _ => None,
    }
}

fn collect_tags(result: &mut PartialResult, value: &Value) -> Result<(), ReconcileError> {
    match value {
        Value::Null => Ok(()),
        Value::Sequence(items) => {
            for item in items {
                if let Value::String(tag) = item {
                    result.push_tag(tag.clone());
                }
            }
            Ok(())
        }
        _ => Err(ReconcileError::Malformed(
            "tag section is not a list".to_string(),
        )),
    }
}

fn collect_records(result: &mut PartialResult, value: &Value) -> Result<(), ReconcileError> {
    let items = match value {
        Value::Null => return Ok(()),
        Value::Sequence(items) => items,
        _ => {
            return Err(ReconcileError::Malformed(
                "record section is not a list".to_string(),
            ))
        }
    };

    for (index, item) in items.iter().enumerate() {
        let Value::Mapping(fields) = item else {
            return Err(ReconcileError::Malformed(format!(
                "record {} is not a mapping",
                index
            )));
        };
        let mut accumulator = RecordAccumulator::new();
        for (key, value) in fields {
            if let (Some(name), Some(scalar)) = (key_name(key), to_scalar(value)) {
                accumulator.set(&name, scalar);
            }
        }
        match accumulator.build() {
            Ok(record) => {
                result.push_record(record);
            }
            Err(reason) => debug!(index, %reason, "authoritative parse dropped record"),
        }
    }
    Ok(())
}
