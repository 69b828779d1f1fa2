//! Unit tests for the streaming report parser

use pretty_assertions::assert_eq;

use kline::report::{
    reconcile, IncrementalRecordParser, Level, ParseEvent, ReportSchema, ResultSource,
    ScalarValue,
};

use crate::helpers::{load_fixture, parse_in_chunks};

// ============================================================================
// Yearly report
// ============================================================================

#[test]
fn year_fixture_yields_fields_tags_and_records() {
    let text = load_fixture("year.yaml");
    let (outcome, _) = parse_in_chunks(&text, 64);
    let partial = outcome.partial;

    assert_eq!(partial.tags, vec!["庚午", "辛巳", "甲子", "乙亥"]);
    assert_eq!(
        partial.field("summary").map(ScalarValue::to_text),
        Some("一生起伏有度，中年后渐入佳境".to_string())
    );
    assert_eq!(
        partial.field("wealthScore"),
        Some(&ScalarValue::Number(7.5))
    );

    let years: Vec<i32> = partial.records.iter().map(|r| r.year).collect();
    assert_eq!(years, vec![1990, 1991, 1992, 1993]);
    assert_eq!(partial.records[2].gan_zhi, "壬申");
    assert_eq!(partial.records[2].reason, "印星得力，身体转健");
    assert_eq!(partial.records[3].close, 64.0);
}

#[test]
fn result_does_not_depend_on_chunk_size() {
    let text = load_fixture("year.yaml");
    let (whole, whole_events) = parse_in_chunks(&text, usize::MAX);
    for size in [1, 2, 3, 7, 13, 64] {
        let (outcome, events) = parse_in_chunks(&text, size);
        assert_eq!(outcome, whole, "chunk size {}", size);
        assert_eq!(events, whole_events, "chunk size {}", size);
    }
}

#[test]
fn events_arrive_in_document_order() {
    let text = load_fixture("year.yaml");
    let (_, events) = parse_in_chunks(&text, 5);

    let tags_at = events
        .iter()
        .position(|e| matches!(e, ParseEvent::Tags(_)))
        .unwrap();
    let summary_at = events
        .iter()
        .position(|e| matches!(e, ParseEvent::Field { name, .. } if name == "summary"))
        .unwrap();
    let first_record_at = events
        .iter()
        .position(|e| matches!(e, ParseEvent::Record(_)))
        .unwrap();

    assert!(tags_at < summary_at);
    assert!(summary_at < first_record_at);
    let records = events
        .iter()
        .filter(|e| matches!(e, ParseEvent::Record(_)))
        .count();
    assert_eq!(records, 4);
}

#[test]
fn partial_is_visible_mid_stream() {
    let text = load_fixture("year.yaml");
    let cut = text.find("  - age: 3").unwrap();

    let mut parser = IncrementalRecordParser::new();
    parser.push(&text[..cut], &mut ());
    assert_eq!(parser.partial().record_count(), 2);
    assert_eq!(parser.partial().tags.len(), 4);

    parser.push(&text[cut..], &mut ());
    let outcome = parser.finish(&mut ());
    assert_eq!(outcome.partial.record_count(), 4);
    assert_eq!(outcome.raw, text);
}

#[test]
fn minimal_report_in_one_chunk() {
    let text = "summary: \"测试\"\nsummaryScore: 8\nbazi:\n  - \"甲子\"\nchartPoints:\n  - age: 1\n    year: 2000\n    daYun: \"童限\"\n    ganZhi: \"甲子\"\n    open: 10\n    close: 20\n    high: 30\n    low: 5\n    score: 15\n    reason: \"稳步\"\n";
    let mut parser = IncrementalRecordParser::new();
    parser.push(text, &mut ());
    let outcome = parser.finish(&mut ());
    let partial = &outcome.partial;

    assert_eq!(partial.field("summary"), Some(&ScalarValue::from("测试")));
    assert_eq!(partial.field("summaryScore"), Some(&ScalarValue::Number(8.0)));
    assert_eq!(partial.tags, vec!["甲子"]);
    assert_eq!(partial.records.len(), 1);
    assert_eq!(partial.records[0].age, 1);
    assert_eq!(partial.records[0].year, 2000);
    assert_eq!(partial.records[0].da_yun, "童限");
    assert_eq!(partial.records[0].reason, "稳步");

    let reconciled = reconcile(outcome.clone(), &ReportSchema::default());
    assert_eq!(reconciled.source, ResultSource::Authoritative);
    assert_eq!(reconciled.result, outcome.partial);
}

// ============================================================================
// Monthly and daily reports
// ============================================================================

#[test]
fn month_fixture_reads_chinese_month_label() {
    let text = load_fixture("month.yaml");
    let (outcome, _) = parse_in_chunks(&text, 9);
    let records = outcome.partial.records;

    assert_eq!(records.len(), 3);
    assert_eq!(records[1].month, Some(2));
    assert_eq!(records[1].month_label.as_deref(), Some("二月"));
    assert_eq!(records[1].infer_level(), Level::Medium);
    assert_eq!(records[1].date_key(), "1991-02");
}

#[test]
fn day_fixture_has_full_dates() {
    let text = load_fixture("day.yaml");
    let (outcome, _) = parse_in_chunks(&text, 11);
    let records = outcome.partial.records;

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].date_key(), "1991-02-01");
    assert_eq!(records[1].infer_level(), Level::Fine);
    assert!(!records[1].is_rising());
}

// ============================================================================
// Schema and edge cases
// ============================================================================

#[test]
fn custom_schema_renames_sections() {
    let text = "pillars:\n  - 甲子\npoints:\n  - age: 1\n    year: 2000\n    reason: x\n";
    let mut parser =
        IncrementalRecordParser::with_schema(ReportSchema::new("pillars", "points"));
    parser.push(text, &mut ());
    let partial = parser.finish(&mut ()).partial;

    assert_eq!(partial.tags, vec!["甲子"]);
    assert_eq!(partial.record_count(), 1);
}

#[test]
fn records_without_year_are_dropped() {
    let text = "chartPoints:\n  - age: 1\n    reason: no year\n  - age: 2\n    year: 1991\n    reason: ok\n";
    let (outcome, _) = parse_in_chunks(text, 4);
    let ages: Vec<i64> = outcome.partial.records.iter().map(|r| r.age).collect();
    assert_eq!(ages, vec![2]);
}

#[test]
fn last_record_commits_at_end_of_input_without_reason() {
    let text = "chartPoints:\n  - age: 1\n    year: 1990\n    close: 51";
    let (outcome, _) = parse_in_chunks(text, 6);
    let records = outcome.partial.records;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].close, 51.0);
    assert!(records[0].open.is_nan());
}

#[test]
fn empty_input_yields_empty_result() {
    let (outcome, events) = parse_in_chunks("", 8);
    assert!(!outcome.partial.has_records());
    assert!(outcome.partial.fields.is_empty());
    assert!(events.is_empty());
}
