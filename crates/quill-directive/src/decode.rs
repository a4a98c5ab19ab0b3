//! Parameter decoding.
//!
//! A parameter body that parses as JSON becomes structured data. Anything else is
//! plain text with per-line indentation removed.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Leading whitespace of every line. Blank lines are swallowed along with it.
static LEADING_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^\s+").unwrap());

/// Trailing spaces and tabs of every line.
static TRAILING_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)[ \t]+$").unwrap());

/// Decode a parameter body.
///
/// # Example
///
/// ```
/// use quill_directive::decode;
/// use serde_json::json;
///
/// assert_eq!(decode(r#"{"a": 1}"#), json!({"a": 1}));
/// assert_eq!(decode("  hello  \n  world"), json!("hello\nworld"));
/// ```
#[must_use]
pub fn decode(content: &str) -> Value {
    serde_json::from_str(content).unwrap_or_else(|_| Value::String(normalize_text(content)))
}

/// Strip per-line indentation and trailing blanks from plain-text parameters.
fn normalize_text(content: &str) -> String {
    let stripped = LEADING_WS.replace_all(content, "");
    TRAILING_WS.replace_all(&stripped, "").into_owned()
}
