//! Command handlers for the kline CLI.
//!
//! Each submodule handles a specific CLI command or command group.
//! The main dispatch logic remains in main.rs.

pub mod analyze;
pub mod config;
pub mod parse;

use std::collections::BTreeMap;
use std::fmt::Write as _;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use kline::report::{filled_cards, is_exact_integer, ChartPoint, ScalarValue};

/// Truncate a string to a maximum display width, adding ellipsis if needed.
///
/// Width is measured in terminal columns, so CJK characters count as two.
pub fn truncate_display(s: &str, max_width: usize) -> String {
    if s.width() <= max_width {
        return s.to_string();
    }
    let budget = if max_width > 3 { max_width - 3 } else { max_width };
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w > budget {
            break;
        }
        out.push(ch);
        used += w;
    }
    if max_width > 3 {
        out.push_str("...");
    }
    out
}

/// Pad a string with spaces to a display width.
pub fn pad_display(s: &str, width: usize) -> String {
    let current = s.width();
    if current >= width {
        s.to_string()
    } else {
        format!("{}{}", s, " ".repeat(width - current))
    }
}

/// Format a price or score, `-` when missing.
pub fn format_number(n: f64) -> String {
    if n.is_nan() {
        "-".to_string()
    } else if is_exact_integer(n) {
        format!("{}", n as i64)
    } else {
        format!("{:.1}", n)
    }
}

/// One line per record: date, pillar, OHLC, score, trend and reason.
pub fn render_records(records: &[ChartPoint], reason_width: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} {:>6} {:>6} {:>6} {:>6} {:>5}   reason",
        pad_display("date", 10),
        pad_display("ganZhi", 6),
        "open",
        "close",
        "high",
        "low",
        "score"
    );
    for record in records {
        let trend = if record.close.is_nan() || record.open.is_nan() {
            ' '
        } else if record.is_rising() {
            '▲'
        } else {
            '▼'
        };
        let _ = writeln!(
            out,
            "{} {} {:>6} {:>6} {:>6} {:>6} {:>5} {} {}",
            pad_display(&record.date_key(), 10),
            pad_display(&truncate_display(&record.gan_zhi, 6), 6),
            format_number(record.open),
            format_number(record.close),
            format_number(record.high),
            format_number(record.low),
            format_number(record.score),
            trend,
            truncate_display(&record.reason, reason_width)
        );
    }
    out
}

/// Tags and trait cards of a yearly report.
pub fn render_summary(fields: &BTreeMap<String, ScalarValue>, tags: &[String]) -> String {
    let mut out = String::new();
    if !tags.is_empty() {
        let _ = writeln!(out, "八字: {}", tags.join(" "));
    }

    for card in filled_cards(fields) {
        match card.score {
            Some(score) => {
                let _ = writeln!(
                    out,
                    "{} [{}]: {}",
                    card.card.label,
                    format_number(score),
                    card.text
                );
            }
            None => {
                let _ = writeln!(out, "{}: {}", card.card.label, card.text);
            }
        }
    }
    out
}
