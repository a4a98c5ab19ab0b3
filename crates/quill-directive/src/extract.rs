//! Directive extraction.
//!
//! Scans a document for block and line occurrences and splits each into a
//! [`DirectiveToken`]. Block tokens come first, then line tokens, each group in
//! document order.

use std::ops::Range;

use crate::DirectiveError;
use crate::pattern::{self, DirectiveForm, Occurrence};

/// One directive occurrence, split but not yet decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DirectiveToken {
    /// The trimmed occurrence, after tab normalization for block tokens.
    pub raw_span: String,
    /// Command name as written (`my-command`).
    pub command_name: String,
    /// Parameter text between the tags, undecoded.
    pub content: String,
    /// Shape of the occurrence.
    pub form: DirectiveForm,
    /// Byte range of the trimmed occurrence in the source text.
    pub span: Range<usize>,
    /// Byte range of the parameter text in the source text, tabs included.
    pub content_span: Range<usize>,
}

/// Extraction options.
///
/// # Example
///
/// ```
/// use quill_directive::Extractor;
///
/// let tokens = Extractor::new().extract("@note:: remember;").unwrap();
/// assert_eq!(tokens.len(), 1);
/// assert_eq!(tokens[0].command_name, "note");
/// assert_eq!(tokens[0].content, "remember");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extractor {
    strip_tabs: bool,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    /// Create an extractor with default options (tab stripping enabled).
    #[must_use]
    pub fn new() -> Self {
        Self { strip_tabs: true }
    }

    /// Enable or disable removal of tab characters from block occurrences.
    ///
    /// Indented multi-line blocks otherwise keep their indentation tabs in both the
    /// token and its parameter.
    #[must_use]
    pub fn with_strip_tabs(mut self, strip_tabs: bool) -> Self {
        self.strip_tabs = strip_tabs;
        self
    }

    /// Whether block occurrences are tab-normalized.
    #[must_use]
    pub fn strip_tabs(&self) -> bool {
        self.strip_tabs
    }

    /// Extract all directive tokens from `text`.
    ///
    /// Returns an empty list when `text` holds no directives.
    ///
    /// # Errors
    ///
    /// Returns [`DirectiveError::Grammar`] if a scanned occurrence cannot be split by
    /// the strict patterns.
    pub fn extract(&self, text: &str) -> Result<Vec<DirectiveToken>, DirectiveError> {
        let blocks = pattern::scan_blocks(text)?;
        let lines = pattern::scan_lines(text);

        let mut tokens = Vec::with_capacity(blocks.len() + lines.len());

        for found in blocks {
            let occurrence = &text[found.span.clone()];
            let normalized = if self.strip_tabs {
                occurrence.replace('\t', "")
            } else {
                occurrence.to_owned()
            };
            tokens.push(split(&normalized, text, found)?);
        }

        for found in lines {
            let occurrence = &text[found.span.clone()];
            tokens.push(split(occurrence, text, found)?);
        }

        Ok(tokens)
    }
}

/// Extract directive tokens with default options.
///
/// # Errors
///
/// See [`Extractor::extract`].
pub fn extract(text: &str) -> Result<Vec<DirectiveToken>, DirectiveError> {
    Extractor::new().extract(text)
}

fn split(
    occurrence: &str,
    text: &str,
    found: Occurrence,
) -> Result<DirectiveToken, DirectiveError> {
    let raw_span = occurrence.trim();
    let (form, name, body) =
        pattern::match_directive(raw_span).ok_or_else(|| DirectiveError::Grammar {
            occurrence: raw_span.to_owned(),
        })?;

    Ok(DirectiveToken {
        raw_span: raw_span.to_owned(),
        command_name: name.to_owned(),
        content: body.to_owned(),
        form,
        span: trimmed_range(text, found.span),
        content_span: found.body,
    })
}

/// Narrow `range` to exclude surrounding whitespace.
fn trimmed_range(text: &str, range: Range<usize>) -> Range<usize> {
    let slice = &text[range.clone()];
    let start = range.start + (slice.len() - slice.trim_start().len());
    let end = range.end - (slice.len() - slice.trim_end().len());
    start..end.max(start)
}
