//! Scalar decoding for the restricted report format.
//!
//! Values on a `key: value` line are decoded into a [`ScalarValue`]:
//! 1. A trailing ` # comment` outside quotes is stripped
//! 2. Matching `"..."` / `'...'` wrappers are removed and unescaped
//! 3. `[+-]digits(.digits)` becomes a number
//! 4. Exactly `true` / `false` becomes a boolean
//! 5. Anything else is a bare string

use serde::Serialize;
use std::fmt;

/// A decoded scalar value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ScalarValue {
    String(String),
    Number(f64),
    Bool(bool),
}

impl ScalarValue {
    /// Borrow the string payload, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScalarValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric coercion with loose-typing semantics.
    ///
    /// Strings are parsed after trimming (empty string is `0`), booleans map
    /// to `1`/`0`, anything unparseable is `NaN`.
    pub fn to_number(&self) -> f64 {
        match self {
            ScalarValue::Number(n) => *n,
            ScalarValue::Bool(true) => 1.0,
            ScalarValue::Bool(false) => 0.0,
            ScalarValue::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse::<f64>().unwrap_or(f64::NAN)
                }
            }
        }
    }

    /// Text coercion: strings as-is, numbers without a trailing `.0`.
    pub fn to_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ScalarValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScalarValue::String(s) => write!(f, "{}", s),
            ScalarValue::Number(n) if is_exact_integer(*n) => write!(f, "{}", *n as i64),
            ScalarValue::Number(n) => write!(f, "{}", n),
            ScalarValue::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// Whole numbers that `f64` represents exactly (`|n| < 2^53`).
pub fn is_exact_integer(n: f64) -> bool {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    n.fract() == 0.0 && n.abs() < MAX_EXACT
}

impl From<&str> for ScalarValue {
    fn from(s: &str) -> Self {
        ScalarValue::String(s.to_string())
    }
}

impl From<f64> for ScalarValue {
    fn from(n: f64) -> Self {
        ScalarValue::Number(n)
    }
}

/// Split a line at its first `:` into a trimmed key and the raw remainder.
///
/// Returns `None` when there is no colon or the key is empty. Surrounding
/// quotes on the key are removed.
pub fn split_key_value(line: &str) -> Option<(&str, &str)> {
    let idx = line.find(':')?;
    let key = unquote_key(line[..idx].trim());
    if key.is_empty() {
        return None;
    }
    Some((key, &line[idx + 1..]))
}

fn unquote_key(key: &str) -> &str {
    for quote in ['"', '\''] {
        if key.len() >= 2 && key.starts_with(quote) && key.ends_with(quote) {
            return &key[1..key.len() - 1];
        }
    }
    key
}

/// Decode a raw value into a [`ScalarValue`].
pub fn decode_scalar(raw: &str) -> ScalarValue {
    let value = strip_comment(raw.trim());

    if value.is_empty() {
        return ScalarValue::String(String::new());
    }
    if let Some(inner) = wrapped(value, '"') {
        return ScalarValue::String(unescape_double(inner));
    }
    if let Some(inner) = wrapped(value, '\'') {
        return ScalarValue::String(inner.replace("''", "'"));
    }
    if is_number(value) {
        if let Ok(n) = value.parse::<f64>() {
            return ScalarValue::Number(n);
        }
    }
    match value {
        "true" => ScalarValue::Bool(true),
        "false" => ScalarValue::Bool(false),
        _ => ScalarValue::String(value.to_string()),
    }
}

/// Remove a trailing comment. Input must already be trimmed.
///
/// A `#` starts a comment at the beginning of the value or after whitespace.
/// For quoted values only text after the closing quote is considered.
fn strip_comment(value: &str) -> &str {
    let scan_from = match value.chars().next() {
        Some(q @ ('"' | '\'')) => match closing_quote(value, q) {
            Some(end) => end + 1,
            None => return value,
        },
        _ => 0,
    };

    let bytes = value.as_bytes();
    for (i, ch) in value[scan_from..].char_indices() {
        let pos = scan_from + i;
        if ch == '#' && (pos == 0 || bytes[pos - 1].is_ascii_whitespace()) {
            return value[..pos].trim_end();
        }
    }
    value
}

/// Byte index of the quote that closes the one at position 0.
fn closing_quote(value: &str, quote: char) -> Option<usize> {
    let mut escaped = false;
    let mut chars = value.char_indices().skip(1).peekable();
    while let Some((i, ch)) = chars.next() {
        if quote == '"' {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                return Some(i);
            }
        } else if ch == '\'' {
            // '' is an escaped single quote
            if matches!(chars.peek(), Some((_, '\''))) {
                chars.next();
            } else {
                return Some(i);
            }
        }
    }
    None
}

fn wrapped(value: &str, quote: char) -> Option<&str> {
    if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
        Some(&value[1..value.len() - 1])
    } else {
        None
    }
}

fn unescape_double(inner: &str) -> String {
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// `[+-]?\d+(\.\d+)?`
fn is_number(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    all_digits(int_part) && frac_part.map_or(true, all_digits)
}
