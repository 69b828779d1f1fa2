//! Incremental parser for the streamed report.
//!
//! The generator emits a restricted YAML document: flat top-level scalars,
//! one list of string tags and one list of flat record mappings. The
//! document arrives as arbitrary text fragments, so the parser keeps a line
//! buffer and only interprets complete lines.
//!
//! # Design
//!
//! The parser is sans-IO. Callers feed text with [`IncrementalRecordParser::push`]
//! and receive progress through a [`ParseObserver`]. The result is the same
//! no matter how the input was split into chunks, because nothing is decided
//! until a full line (or the end of input) is available.
//!
//! ```text
//! summary: 一生平稳          <- top-level field
//! bazi:                      <- tag section
//!   - 庚午
//! chartPoints:               <- record section
//!   - age: 1                 <- new record
//!     year: 1990
//!     reason: 起运           <- terminal field, commits the record
//! ```

use tracing::trace;

use super::record::{ChartPoint, RecordAccumulator};
use super::result::PartialResult;
use super::scalar::{decode_scalar, split_key_value, ScalarValue};

/// Section names used by the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSchema {
    /// List of string tags (the four pillars).
    pub tags_section: String,
    /// List of chart records.
    pub records_section: String,
}

impl Default for ReportSchema {
    fn default() -> Self {
        Self {
            tags_section: "bazi".to_string(),
            records_section: "chartPoints".to_string(),
        }
    }
}

impl ReportSchema {
    pub fn new(tags_section: impl Into<String>, records_section: impl Into<String>) -> Self {
        Self {
            tags_section: tags_section.into(),
            records_section: records_section.into(),
        }
    }

    fn section_for(&self, name: &str) -> Option<Section> {
        if name == self.tags_section {
            Some(Section::Tags)
        } else if name == self.records_section {
            Some(Section::Records)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Tags,
    Records,
}

/// Receives parse progress as it happens.
///
/// All methods default to no-ops so implementors only override what they
/// care about.
pub trait ParseObserver {
    /// A top-level scalar was set.
    fn on_field(&mut self, _name: &str, _value: &ScalarValue) {}

    /// The tag list grew. Receives the whole list.
    fn on_tags(&mut self, _tags: &[String]) {}

    /// A record was committed.
    fn on_record(&mut self, _record: &ChartPoint) {}
}

impl ParseObserver for () {}

/// A recorded observer callback.
#[derive(Debug, Clone, PartialEq)]
pub enum ParseEvent {
    Field { name: String, value: ScalarValue },
    Tags(Vec<String>),
    Record(ChartPoint),
}

impl ParseObserver for Vec<ParseEvent> {
    fn on_field(&mut self, name: &str, value: &ScalarValue) {
        self.push(ParseEvent::Field {
            name: name.to_string(),
            value: value.clone(),
        });
    }

    fn on_tags(&mut self, tags: &[String]) {
        self.push(ParseEvent::Tags(tags.to_vec()));
    }

    fn on_record(&mut self, record: &ChartPoint) {
        self.push(ParseEvent::Record(record.clone()));
    }
}

/// Final output of a parse pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    /// The full input text, verbatim.
    pub raw: String,
    /// Everything the incremental pass extracted.
    pub partial: PartialResult,
}

/// Line-oriented streaming parser.
///
/// # Example
///
/// ```
/// use kline::report::{IncrementalRecordParser, ParseEvent};
///
/// let mut parser = IncrementalRecordParser::new();
/// let mut events: Vec<ParseEvent> = Vec::new();
/// parser.push("chartPoints:\n  - age: 1\n    ye", &mut events);
/// parser.push("ar: 1990\n    reason: ok\n", &mut events);
/// let outcome = parser.finish(&mut events);
/// assert_eq!(outcome.partial.records.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct IncrementalRecordParser {
    schema: ReportSchema,
    raw: String,
    buffer: String,
    section: Option<Section>,
    current: Option<RecordAccumulator>,
    partial: PartialResult,
}

impl IncrementalRecordParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(schema: ReportSchema) -> Self {
        Self {
            schema,
            ..Self::default()
        }
    }

    pub fn schema(&self) -> &ReportSchema {
        &self.schema
    }

    /// Everything extracted so far.
    pub fn partial(&self) -> &PartialResult {
        &self.partial
    }

    /// All text pushed so far.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Feed a fragment of the stream. Never fails.
    pub fn push<O: ParseObserver + ?Sized>(&mut self, chunk: &str, observer: &mut O) {
        if chunk.is_empty() {
            return;
        }
        self.raw.push_str(chunk);
        self.buffer.push_str(chunk);

        let Some(last_newline) = self.buffer.rfind('\n') else {
            return;
        };
        let tail = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, tail);

        for line in complete[..last_newline].split('\n') {
            self.process_line(strip_cr(line), observer);
        }
    }

    /// Flush the held-back fragment and commit any open record.
    pub fn finish<O: ParseObserver + ?Sized>(mut self, observer: &mut O) -> ParseOutcome {
        let leftover = std::mem::take(&mut self.buffer);
        if !leftover.trim().is_empty() {
            self.process_line(strip_cr(&leftover), observer);
        }
        self.commit(observer);

        ParseOutcome {
            raw: self.raw,
            partial: self.partial,
        }
    }

    fn process_line<O: ParseObserver + ?Sized>(&mut self, line: &str, observer: &mut O) {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return;
        }

        let indented = line.starts_with([' ', '\t']);
        if !indented && !trimmed.starts_with('-') {
            match section_header(trimmed) {
                Some(name) => match self.schema.section_for(name) {
                    Some(section) => {
                        trace!(section = name, "entering section");
                        self.section = Some(section);
                        return;
                    }
                    None => self.section = None,
                },
                None => self.section = None,
            }
        }

        match self.section {
            Some(Section::Tags) => self.process_tag_line(trimmed, observer),
            Some(Section::Records) => self.process_record_line(trimmed, observer),
            None => self.process_field_line(trimmed, observer),
        }
    }

    fn process_tag_line<O: ParseObserver + ?Sized>(&mut self, trimmed: &str, observer: &mut O) {
        let Some(item) = list_item(trimmed) else {
            trace!(line = trimmed, "skipping non-item line in tag section");
            return;
        };
        match decode_scalar(item) {
            ScalarValue::String(tag) => {
                self.partial.push_tag(tag);
                observer.on_tags(&self.partial.tags);
            }
            other => trace!(value = %other, "skipping non-string tag"),
        }
    }

    fn process_record_line<O: ParseObserver + ?Sized>(
        &mut self,
        trimmed: &str,
        observer: &mut O,
    ) {
        if let Some(rest) = list_item(trimmed) {
            self.commit(observer);
            self.current = Some(RecordAccumulator::new());
            if !rest.is_empty() {
                self.apply_record_field(rest, observer);
            }
        } else if self.current.is_some() {
            self.apply_record_field(trimmed, observer);
        } else {
            trace!(line = trimmed, "skipping field outside of a record");
        }
    }

    fn apply_record_field<O: ParseObserver + ?Sized>(&mut self, text: &str, observer: &mut O) {
        let Some((key, raw_value)) = split_key_value(text) else {
            trace!(line = text, "skipping record line without key");
            return;
        };
        let Some(current) = self.current.as_mut() else {
            return;
        };
        let field = current.set(key, decode_scalar(raw_value));
        if field.is_some_and(|f| f.is_terminal()) {
            self.commit(observer);
        }
    }

    fn process_field_line<O: ParseObserver + ?Sized>(&mut self, trimmed: &str, observer: &mut O) {
        let Some((key, raw_value)) = split_key_value(trimmed) else {
            trace!(line = trimmed, "skipping line without key");
            return;
        };
        let value = decode_scalar(raw_value);
        observer.on_field(key, &value);
        self.partial.set_field(key, value);
    }

    fn commit<O: ParseObserver + ?Sized>(&mut self, observer: &mut O) {
        let Some(accumulator) = self.current.take() else {
            return;
        };
        if accumulator.is_empty() {
            return;
        }
        match accumulator.build() {
            Ok(record) => {
                let age = record.age;
                if self.partial.push_record(record) {
                    if let Some(committed) = self.partial.records.last() {
                        observer.on_record(committed);
                    }
                } else {
                    trace!(age, "dropping record with duplicate age");
                }
            }
            Err(reason) => trace!(%reason, "dropping record"),
        }
    }
}

fn strip_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}

/// Name of a `name:` header line with nothing after the colon.
fn section_header(trimmed: &str) -> Option<&str> {
    let (key, rest) = split_key_value(trimmed)?;
    let rest = rest.trim();
    (rest.is_empty() || rest.starts_with('#')).then_some(key)
}

/// Text after the leading `-` markers of a list item.
fn list_item(trimmed: &str) -> Option<&str> {
    if !trimmed.starts_with('-') {
        return None;
    }
    Some(trimmed.trim_start_matches('-').trim_start())
}
