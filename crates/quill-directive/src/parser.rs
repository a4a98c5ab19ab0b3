//! Text to resolved directives.

use std::fmt;
use std::sync::Arc;

use crate::{CommandResolver, Directive, DirectiveError, DirectiveGroup, Extractor};

/// Extracts directives from text and binds each to its command.
///
/// The parser is cheap to clone; every [`Directive`] it produces keeps a copy so that
/// chaining and [`Directive::rebuild`] can re-extract with the same options and
/// resolver.
///
/// # Example
///
/// ```
/// use quill_directive::{CommandRegistry, DirectiveParser};
/// use serde_json::{Value, json};
///
/// let registry = CommandRegistry::new().with_fn("upper", |v: Value| {
///     json!(v.as_str().unwrap_or_default().to_uppercase())
/// });
/// let parser = DirectiveParser::new(registry);
///
/// let directives = parser.parse("// @upper: hello @end-upper").unwrap();
/// assert_eq!(directives.len(), 1);
/// assert_eq!(directives[0].command(), "upper");
/// assert_eq!(directives[0].execute(None), json!("HELLO"));
/// ```
#[derive(Clone)]
pub struct DirectiveParser {
    extractor: Extractor,
    resolver: Arc<dyn CommandResolver>,
}

impl DirectiveParser {
    /// Create a parser that owns `resolver`.
    pub fn new<R: CommandResolver + 'static>(resolver: R) -> Self {
        Self::from_shared(Arc::new(resolver))
    }

    /// Create a parser over a shared resolver.
    ///
    /// Use this when commands are registered after parsing.
    pub fn from_shared(resolver: Arc<dyn CommandResolver>) -> Self {
        Self {
            extractor: Extractor::new(),
            resolver,
        }
    }

    /// Replace the extraction options.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Extractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Extraction options in use.
    #[must_use]
    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Resolver in use.
    #[must_use]
    pub fn resolver(&self) -> &Arc<dyn CommandResolver> {
        &self.resolver
    }

    /// Extract and resolve every directive in `text`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectiveError`] only on grammar inconsistencies.
    pub fn parse(&self, text: &str) -> Result<Vec<Directive>, DirectiveError> {
        let tokens = self.extractor.extract(text)?;
        let raw: Arc<str> = Arc::from(text);

        Ok(tokens
            .into_iter()
            .map(|token| Directive::from_token(Arc::clone(&raw), token, self.clone()))
            .collect())
    }

    /// Parse `text` and group the result by command name.
    ///
    /// # Errors
    ///
    /// See [`parse`](Self::parse).
    pub fn parse_group(&self, text: &str) -> Result<DirectiveGroup, DirectiveError> {
        self.parse(text).map(DirectiveGroup::new)
    }
}

impl fmt::Debug for DirectiveParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectiveParser")
            .field("extractor", &self.extractor)
            .finish_non_exhaustive()
    }
}
