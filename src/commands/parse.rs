//! Parse command handler
//!
//! Replays a saved report through the streaming parser:
//! 1. Load config for the report schema
//! 2. Split the file into fixed-size chunks
//! 3. Print fields, tags and records as they are committed
//! 4. Reconcile and print the final result

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};

use kline::report::{
    reconcile, ChartPoint, IncrementalRecordParser, ParseObserver, ResultSource, ScalarValue,
};
use kline::transport::replay::split_chunks;
use kline::Config;

use super::{render_records, render_summary, truncate_display};

/// Prints parser progress as it happens.
struct ProgressPrinter {
    enabled: bool,
    reason_width: usize,
}

impl ParseObserver for ProgressPrinter {
    fn on_field(&mut self, name: &str, value: &ScalarValue) {
        if self.enabled {
            println!("field   {} = {}", name, truncate_display(&value.to_text(), 60));
        }
    }

    fn on_tags(&mut self, tags: &[String]) {
        if self.enabled {
            println!("tags    {}", tags.join(" "));
        }
    }

    fn on_record(&mut self, record: &ChartPoint) {
        if self.enabled {
            println!(
                "record  #{} {} {} {}",
                record.age,
                record.date_key(),
                record.gan_zhi,
                truncate_display(&record.reason, self.reason_width)
            );
        }
    }
}

/// Replay a report file through the parser.
pub fn handle(file: &Path, chunk_size: usize, json: bool) -> Result<()> {
    let config = Config::load()?;
    let schema = config.parser.schema();

    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read report file: {:?}", file))?;

    let mut printer = ProgressPrinter {
        enabled: !json,
        reason_width: config.display.reason_width,
    };
    let mut parser = IncrementalRecordParser::with_schema(schema.clone());
    for chunk in split_chunks(&text, chunk_size) {
        parser.push(&chunk, &mut printer);
    }
    let outcome = parser.finish(&mut printer);
    let reconciled = reconcile(outcome, &schema);
    let result = reconciled.result;

    if !result.has_records() {
        bail!("No chart records found in {:?}", file);
    }

    let source = match reconciled.source {
        ResultSource::Authoritative => "authoritative",
        ResultSource::Incremental => "incremental",
    };

    if json {
        let doc = serde_json::json!({
            "source": source,
            "fields": result.fields,
            "tags": result.tags,
            "records": result.records,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    println!();
    println!(
        "Reconciled from {} parse: {} records",
        source,
        result.record_count()
    );
    print!("{}", render_summary(&result.fields, &result.tags));
    print!(
        "{}",
        render_records(&result.records, config.display.reason_width)
    );
    Ok(())
}
