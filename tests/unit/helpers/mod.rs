//! Test helper utilities

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;

use kline::report::{ChartPoint, IncrementalRecordParser, ParseEvent, ParseOutcome};
use kline::session::{Gender, Identity};
use kline::transport::replay::split_chunks;

/// Get the path to the fixtures directory
pub fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Load a fixture file's contents
pub fn load_fixture(name: &str) -> String {
    let path = fixtures_dir().join(name);
    fs::read_to_string(&path).unwrap_or_else(|_| panic!("Failed to load fixture: {}", name))
}

/// Run a text through the default parser in `chunk_chars` pieces.
pub fn parse_in_chunks(text: &str, chunk_chars: usize) -> (ParseOutcome, Vec<ParseEvent>) {
    let mut parser = IncrementalRecordParser::new();
    let mut events = Vec::new();
    for chunk in split_chunks(text, chunk_chars) {
        parser.push(&chunk, &mut events);
    }
    let outcome = parser.finish(&mut events);
    (outcome, events)
}

/// The identity the fixtures were generated for.
pub fn fixture_identity() -> Identity {
    Identity::new(Gender::Male, "1990-05-12", "08:30").with_name("张三")
}

/// Find the record for a year (and month).
pub fn record_for(records: &[ChartPoint], year: i32, month: Option<u32>) -> ChartPoint {
    records
        .iter()
        .find(|r| r.year == year && (month.is_none() || r.month == month))
        .cloned()
        .unwrap_or_else(|| panic!("no record for {} {:?}", year, month))
}
