//! Directive grammar.
//!
//! Two shapes are recognized:
//!
//! - **Block**: `@name:` body `@end-name` (or `@end-command`), spanning lines.
//! - **Line**: `@name::` body `;`.
//!
//! Both may be wrapped in comment markers (`//:`, `/*:` ... `*/`, `<!--:` ... `-->`).
//!
//! Each shape has a scanning variant that enumerates occurrences in a document and a
//! strict variant anchored to both ends of a single occurrence. The block closer has to
//! repeat the opening name, so it is compiled per name instead of relying on a
//! back-reference.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// Command name: lowercase alphanumeric segments joined by single hyphens.
const NAME: &str = r"[a-z][a-z0-9]+(?:-[a-z][a-z0-9]+)*";

/// Block opener, unanchored: optional HTML wrapper, optional `//:` or `/*:`, `@name:`.
static BLOCK_OPEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?:<!--:\s*)?(?:(?://|/\*):\s*)?@({NAME}):")).unwrap()
});

/// Block opener anchored to the start of an occurrence.
static BLOCK_OPEN_STRICT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?:<!--:\s*)?(?:(?://|/\*):\s*)?@({NAME}):")).unwrap()
});

/// Line form, unanchored. A `\;` inside the body does not terminate it.
static LINE_SCAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?s)(?:<!--:\s*)?(?:\s*//:\s*)?@({NAME})::\s*((?:\\.|[^;\\])+?)\s*;(?:\s*-->\s*)?"
    ))
    .unwrap()
});

/// Line form anchored to both ends of an occurrence.
static LINE_STRICT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?s)^(?:<!--:\s*)?(?:\s*//:\s*)?@({NAME})::\s*(.+?)\s*;(?:\s*-->\s*)?$"
    ))
    .unwrap()
});

/// Which of the two directive shapes an occurrence uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DirectiveForm {
    /// `@name:` ... `@end-name`
    Block,
    /// `@name::` ... `;`
    Line,
}

/// Compile the body-and-closer part of a block directive for `name`.
///
/// The returned pattern starts right after the opener's colon. With `strict`, it is
/// also anchored to the end of the input.
fn block_closer(name: &str, strict: bool) -> Result<Regex, regex::Error> {
    let end = if strict { "$" } else { "" };
    Regex::new(&format!(
        r"(?s)^\s*(.+?)\s*(?:\s*//:\s*)?@end-(?:{}|command)(?:\s*\*/\s*)?(?:\s*-->\s*)?{end}",
        regex::escape(name)
    ))
}

/// One scanned occurrence: the whole match and the parameter text inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Occurrence {
    pub(crate) span: Range<usize>,
    pub(crate) body: Range<usize>,
}

/// Find every block occurrence in `text`, left to right.
///
/// An opener without a matching closer is skipped and scanning resumes right after
/// its first character. Closers are compiled once per name for the whole scan.
pub(crate) fn scan_blocks(text: &str) -> Result<Vec<Occurrence>, regex::Error> {
    let mut closers: HashMap<&str, Regex> = HashMap::new();
    let mut found = Vec::new();
    let mut pos = 0;

    while pos < text.len() {
        let Some(open) = BLOCK_OPEN.captures_at(text, pos) else {
            break;
        };
        let (Some(whole), Some(name)) = (open.get(0), open.get(1)) else {
            break;
        };

        let closer = match closers.entry(name.as_str()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(block_closer(name.as_str(), false)?),
        };
        let offset = whole.end();
        let close = closer.captures(&text[offset..]);
        if let Some((all, body)) = close.as_ref().and_then(|c| Some((c.get(0)?, c.get(1)?))) {
            let end = offset + all.end();
            found.push(Occurrence {
                span: whole.start()..end,
                body: offset + body.start()..offset + body.end(),
            });
            pos = end;
        } else {
            pos = next_char_boundary(text, whole.start());
        }
    }

    Ok(found)
}

/// Find every line occurrence in `text`, left to right.
pub(crate) fn scan_lines(text: &str) -> Vec<Occurrence> {
    LINE_SCAN
        .captures_iter(text)
        .filter_map(|caps| {
            Some(Occurrence {
                span: caps.get(0)?.range(),
                body: caps.get(2)?.range(),
            })
        })
        .collect()
}

/// Split a single block occurrence into `(name, body)`.
///
/// `text` must be the whole occurrence; leading or trailing text makes it fail.
pub fn match_block(text: &str) -> Option<(&str, &str)> {
    let open = BLOCK_OPEN_STRICT.captures(text)?;
    let name = open.get(1)?.as_str();
    let rest = &text[open.get(0)?.end()..];

    let closer = block_closer(name, true).ok()?;
    let body = closer.captures(rest)?.get(1)?.as_str();
    Some((name, body))
}

/// Split a single line occurrence into `(name, body)`.
pub fn match_line(text: &str) -> Option<(&str, &str)> {
    let caps = LINE_STRICT.captures(text)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// Split a single occurrence of either shape, block form first.
pub fn match_directive(text: &str) -> Option<(DirectiveForm, &str, &str)> {
    if let Some((name, body)) = match_block(text) {
        return Some((DirectiveForm::Block, name, body));
    }
    match_line(text).map(|(name, body)| (DirectiveForm::Line, name, body))
}

/// Whether `text`, as a whole, is a single directive of either shape.
pub fn is_directive(text: &str) -> bool {
    match_directive(text).is_some()
}

fn next_char_boundary(text: &str, index: usize) -> usize {
    text[index..]
        .chars()
        .next()
        .map_or(text.len(), |c| index + c.len_utf8())
}
