//! Directive error types.

/// Error raised when the directive grammar contradicts itself.
///
/// Malformed input never produces this: text without directives yields nothing,
/// non-JSON parameters fall back to text and unknown commands fall back to echoing
/// their parameter. These variants indicate a bug in the grammar.
#[derive(Debug, thiserror::Error)]
pub enum DirectiveError {
    /// An occurrence found by a scanning pattern does not re-match either strict pattern.
    #[error("Scanned occurrence does not re-match the strict grammar: {occurrence:?}")]
    Grammar {
        /// The trimmed occurrence text.
        occurrence: String,
    },
    /// A per-name closing pattern failed to compile.
    #[error("Invalid directive pattern: {0}")]
    Pattern(#[from] regex::Error),
}
