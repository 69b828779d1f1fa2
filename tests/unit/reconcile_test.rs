//! Unit tests for end-of-stream reconciliation

use pretty_assertions::assert_eq;

use kline::report::{parse_authoritative, reconcile, ReportSchema, ResultSource};

use crate::helpers::{load_fixture, parse_in_chunks};

#[test]
fn well_formed_report_uses_authoritative_parse() {
    let text = load_fixture("year.yaml");
    let (outcome, _) = parse_in_chunks(&text, 16);
    let incremental = outcome.partial.clone();

    let reconciled = reconcile(outcome, &ReportSchema::default());
    assert_eq!(reconciled.source, ResultSource::Authoritative);
    assert_eq!(reconciled.result.records, incremental.records);
    assert_eq!(reconciled.result.tags, incremental.tags);
    assert_eq!(reconciled.result.fields, incremental.fields);
}

#[test]
fn authoritative_parse_reads_every_fixture() {
    let schema = ReportSchema::default();
    for (name, expected) in [("year.yaml", 4), ("month.yaml", 3), ("day.yaml", 2)] {
        let result = parse_authoritative(&load_fixture(name), &schema).unwrap();
        assert_eq!(result.record_count(), expected, "{}", name);
    }
}

#[test]
fn broken_yaml_keeps_incremental_result() {
    // Unquoted colon-space inside a value is not valid YAML.
    let text = "chartPoints:\n  - age: 1\n    year: 1990\n    reason: 子时: 吉\n  - age: 2\n    year: 1991\n    reason: 平\n";
    let (outcome, _) = parse_in_chunks(text, 3);
    assert!(parse_authoritative(text, &ReportSchema::default()).is_err());

    let reconciled = reconcile(outcome, &ReportSchema::default());
    assert_eq!(reconciled.source, ResultSource::Incremental);
    assert_eq!(reconciled.result.record_count(), 2);
    assert_eq!(reconciled.result.records[0].reason, "子时: 吉");
}

#[test]
fn truncated_stream_keeps_more_complete_incremental_result() {
    let text = load_fixture("year.yaml");
    // Stop halfway through the last record, leaving an open quote behind.
    let cut = text.find("    year: 1993").unwrap();
    let truncated = format!("{}    reason: \"未完", &text[..cut]);

    let (outcome, _) = parse_in_chunks(&truncated, 10);
    let reconciled = reconcile(outcome, &ReportSchema::default());
    assert_eq!(reconciled.source, ResultSource::Incremental);
    assert_eq!(reconciled.result.record_count(), 3);
}

#[test]
fn top_level_list_is_malformed() {
    let err = parse_authoritative("- a\n- b\n", &ReportSchema::default()).unwrap_err();
    assert!(err.to_string().contains("mapping"));
}
