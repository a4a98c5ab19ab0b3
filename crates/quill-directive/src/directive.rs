//! The resolved directive.

use std::fmt;
use std::ops::Range;
use std::sync::Arc;

use serde_json::Value;

use crate::extract::DirectiveToken;
use crate::pattern::DirectiveForm;
use crate::registry::camel_case;
use crate::{Command, DirectiveError, DirectiveParser, decode};

/// How a directive's command was bound at construction.
#[derive(Clone)]
pub(crate) enum Resolution {
    /// The resolver returned a command.
    Resolved(Arc<dyn Command>),
    /// Nothing was registered; resolution is retried on every call.
    Fallback,
}

/// A pending change staged by [`Directive::change`], [`Directive::clear`] or
/// [`Directive::collapse`], applied by [`Directive::rebuild`].
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Staged {
    raw: Option<String>,
    parameter: Option<Value>,
    name: String,
}

/// New content for [`Directive::change`].
#[derive(Debug, Clone, PartialEq)]
pub enum Content {
    /// Replace the parameter text in the raw document and stage it as the parameter.
    Text(String),
    /// Stage a structured parameter; the raw document is left alone.
    Value(Value),
    /// Replace this directive's occurrence with another directive's occurrence.
    Directive(Box<Directive>),
}

impl From<&str> for Content {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for Content {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Value> for Content {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<Directive> for Content {
    fn from(directive: Directive) -> Self {
        Self::Directive(Box::new(directive))
    }
}

impl From<&Directive> for Content {
    fn from(directive: &Directive) -> Self {
        Self::Directive(Box::new(directive.clone()))
    }
}

/// One directive occurrence bound to its command.
///
/// A directive is immutable. The transition methods ([`change`](Self::change),
/// [`clear`](Self::clear), [`collapse`](Self::collapse)) return a copy carrying a
/// staged edit; [`rebuild`](Self::rebuild) re-extracts the edited text to produce the
/// resulting directive. Each transition starts from the directive's own raw text, so
/// staging again replaces an earlier staging.
#[derive(Clone)]
pub struct Directive {
    pub(crate) raw: Arc<str>,
    pub(crate) matcher: String,
    pub(crate) content: String,
    pub(crate) command_name: String,
    pub(crate) command: String,
    pub(crate) parameter: Value,
    pub(crate) form: DirectiveForm,
    pub(crate) span: Range<usize>,
    pub(crate) content_span: Range<usize>,
    pub(crate) resolution: Resolution,
    pub(crate) parser: DirectiveParser,
    pub(crate) staged: Option<Staged>,
}

impl Directive {
    pub(crate) fn from_token(
        raw: Arc<str>,
        token: DirectiveToken,
        parser: DirectiveParser,
    ) -> Self {
        let command = camel_case(&token.command_name);
        let parameter = decode(&token.content);

        let resolution = match parser.resolver().resolve(&command) {
            Some(resolved) => Resolution::Resolved(resolved),
            None => {
                tracing::warn!(command = %command, "Command is not registered");
                Resolution::Fallback
            }
        };

        Self {
            raw,
            matcher: token.raw_span,
            content: token.content,
            command_name: token.command_name,
            command,
            parameter,
            form: token.form,
            span: token.span,
            content_span: token.content_span,
            resolution,
            parser,
            staged: None,
        }
    }

    /// The full text this directive was extracted from.
    #[must_use]
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The matched occurrence.
    #[must_use]
    pub fn matcher(&self) -> &str {
        &self.matcher
    }

    /// The parameter text as written, before decoding.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Command name as written (`page-title`).
    #[must_use]
    pub fn command_name(&self) -> &str {
        &self.command_name
    }

    /// Camel-case command name used for resolution and grouping (`pageTitle`).
    #[must_use]
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Decoded parameter.
    #[must_use]
    pub fn parameter(&self) -> &Value {
        &self.parameter
    }

    /// Shape of the occurrence.
    #[must_use]
    pub fn form(&self) -> DirectiveForm {
        self.form
    }

    /// Byte range of the occurrence within [`raw`](Self::raw).
    #[must_use]
    pub fn span(&self) -> Range<usize> {
        self.span.clone()
    }

    /// Whether a command was found when the directive was constructed.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self.resolution, Resolution::Resolved(_))
    }

    /// Whether a transition has been staged.
    #[must_use]
    pub fn is_staged(&self) -> bool {
        self.staged.is_some()
    }

    /// Run the command once with `parameter`, or with the decoded parameter.
    ///
    /// Nested directives inside the parameter are not looked at; see
    /// [`chain`](Self::chain). An unresolved command is looked up again; if it is
    /// still missing, the directive's own parameter is returned unchanged.
    #[must_use]
    pub fn execute(&self, parameter: Option<Value>) -> Value {
        let parameter = parameter.unwrap_or_else(|| self.parameter.clone());

        match &self.resolution {
            Resolution::Resolved(command) => command.call(parameter),
            Resolution::Fallback => {
                if let Some(command) = self.parser.resolver().resolve(&self.command) {
                    return command.call(parameter);
                }
                tracing::warn!(
                    command = %self.command,
                    "Command is not registered, returning parameter"
                );
                self.parameter.clone()
            }
        }
    }

    /// Stage new content for this directive.
    ///
    /// This does not execute anything; call [`rebuild`](Self::rebuild) on the result
    /// to re-extract the edited text.
    #[must_use]
    pub fn change(&self, content: impl Into<Content>) -> Self {
        let staged = match content.into() {
            Content::Text(text) => Staged {
                raw: Some(self.replace_content(&text)),
                parameter: Some(Value::String(text)),
                name: self.command.clone(),
            },
            Content::Value(value) => Staged {
                raw: None,
                parameter: Some(value),
                name: self.command.clone(),
            },
            Content::Directive(other) => Staged {
                raw: Some(self.replace_occurrence(&other.matcher)),
                parameter: None,
                name: other.command.clone(),
            },
        };
        self.with_staged(staged)
    }

    /// Stage an empty parameter. Same as `change("")`.
    #[must_use]
    pub fn clear(&self) -> Self {
        self.change("")
    }

    /// Stage removal of this directive's occurrence from the raw text.
    #[must_use]
    pub fn collapse(&self) -> Self {
        self.with_staged(Staged {
            raw: Some(self.replace_occurrence("")),
            parameter: None,
            name: self.command.clone(),
        })
    }

    /// The raw text with any staged edit applied.
    #[must_use]
    pub fn consume(&self) -> &str {
        self.staged
            .as_ref()
            .and_then(|staged| staged.raw.as_deref())
            .unwrap_or(&self.raw)
    }

    /// Re-extract the (possibly edited) raw text and return the resulting directive.
    ///
    /// The staged name is looked up in the new extraction; the occurrence starting
    /// where this one started wins, otherwise the first occurrence of that name. A
    /// staged parameter overrides the re-extracted one. Returns `None` when the name
    /// no longer occurs, which is the usual outcome of [`collapse`](Self::collapse).
    ///
    /// # Errors
    ///
    /// Returns [`DirectiveError`] only on grammar inconsistencies.
    pub fn rebuild(&self) -> Result<Option<Self>, DirectiveError> {
        let (name, parameter) = match &self.staged {
            Some(staged) => (staged.name.as_str(), staged.parameter.clone()),
            None => (self.command.as_str(), None),
        };

        let group = self.parser.parse_group(self.consume())?;
        let Some(entry) = group.get(name) else {
            tracing::debug!(command = %name, "Staged directive no longer present");
            return Ok(None);
        };

        let mut rebuilt = entry
            .iter()
            .find(|d| d.span.start == self.span.start)
            .unwrap_or_else(|| entry.first())
            .clone();
        if let Some(parameter) = parameter {
            rebuilt.parameter = parameter;
        }
        Ok(Some(rebuilt))
    }

    fn with_staged(&self, staged: Staged) -> Self {
        let mut next = self.clone();
        next.staged = Some(staged);
        next
    }

    /// Raw text with this occurrence replaced by `replacement`.
    fn replace_occurrence(&self, replacement: &str) -> String {
        match (self.raw.get(..self.span.start), self.raw.get(self.span.end..)) {
            (Some(before), Some(after)) => format!("{before}{replacement}{after}"),
            _ => self.raw.replacen(&self.matcher, replacement, 1),
        }
    }

    /// Raw text with the parameter text replaced by `replacement`.
    ///
    /// The source range is used rather than [`content`](Self::content), which may
    /// have lost its indentation tabs.
    fn replace_content(&self, replacement: &str) -> String {
        let range = &self.content_span;
        match (self.raw.get(..range.start), self.raw.get(range.end..)) {
            (Some(before), Some(after)) => format!("{before}{replacement}{after}"),
            _ => self.raw.replacen(&self.content, replacement, 1),
        }
    }
}

impl fmt::Debug for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Directive")
            .field("command", &self.command)
            .field("command_name", &self.command_name)
            .field("form", &self.form)
            .field("parameter", &self.parameter)
            .field("matcher", &self.matcher)
            .field("content", &self.content)
            .field("span", &self.span)
            .field("content_span", &self.content_span)
            .field("resolved", &self.is_resolved())
            .field("staged", &self.staged)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Directive {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
            && self.matcher == other.matcher
            && self.content == other.content
            && self.command_name == other.command_name
            && self.command == other.command
            && self.parameter == other.parameter
            && self.form == other.form
            && self.span == other.span
            && self.content_span == other.content_span
            && self.is_resolved() == other.is_resolved()
            && self.staged == other.staged
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Directive {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("Directive", 7)?;
        state.serialize_field("command", &self.command)?;
        state.serialize_field("name", &self.command_name)?;
        state.serialize_field("form", &self.form)?;
        state.serialize_field("parameter", &self.parameter)?;
        state.serialize_field("match", &self.matcher)?;
        state.serialize_field("content", &self.content)?;
        state.serialize_field("span", &self.span)?;
        state.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CommandRegistry;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn upper(v: Value) -> Value {
        json!(v.as_str().unwrap_or_default().to_uppercase())
    }

    fn parser() -> DirectiveParser {
        DirectiveParser::new(CommandRegistry::new().with_fn("upper", upper))
    }

    fn first(text: &str) -> Directive {
        parser().parse(text).unwrap().remove(0)
    }

    #[test]
    fn test_fields() {
        let directive = first("// @upper: hello @end-upper");
        assert_eq!(directive.command(), "upper");
        assert_eq!(directive.command_name(), "upper");
        assert_eq!(directive.parameter(), &json!("hello"));
        assert_eq!(directive.matcher(), "@upper: hello @end-upper");
        assert_eq!(directive.content(), "hello");
        assert_eq!(directive.raw(), "// @upper: hello @end-upper");
        assert_eq!(directive.form(), DirectiveForm::Block);
        assert!(directive.is_resolved());
    }

    #[test]
    fn test_execute() {
        let directive = first("// @upper: hello @end-upper");
        assert_eq!(directive.execute(None), json!("HELLO"));
        assert_eq!(directive.execute(Some(json!("other"))), json!("OTHER"));
    }

    #[test]
    fn test_structured_parameter() {
        let directive = first("@set:: {\"x\":1};");
        assert_eq!(directive.parameter(), &json!({"x": 1}));
    }

    #[test]
    fn test_hyphenated_command_is_camel_cased() {
        let directive = first("@page-title:: Home;");
        assert_eq!(directive.command_name(), "page-title");
        assert_eq!(directive.command(), "pageTitle");
    }

    #[test]
    fn test_unresolved_returns_own_parameter() {
        let directive = first("@missing:: keep me;");
        assert!(!directive.is_resolved());
        assert_eq!(directive.execute(None), json!("keep me"));
        assert_eq!(directive.execute(Some(json!("ignored"))), json!("keep me"));
    }

    #[test]
    fn test_unresolved_picks_up_late_registration() {
        let registry = Arc::new(CommandRegistry::new());
        let shared: Arc<CommandRegistry> = Arc::clone(&registry);
        let parser = DirectiveParser::from_shared(shared);
        let directive = parser.parse("@later:: value;").unwrap().remove(0);
        assert!(!directive.is_resolved());

        registry.register_fn("later", upper);
        assert_eq!(directive.execute(None), json!("VALUE"));
    }

    #[test]
    fn test_change_text_stages_raw_and_parameter() {
        let directive = first("a @upper:: hello; b");
        let changed = directive.change("bye");
        assert!(changed.is_staged());
        assert!(!directive.is_staged());
        assert_eq!(changed.consume(), "a @upper:: bye; b");
        assert_eq!(directive.consume(), "a @upper:: hello; b");

        let rebuilt = changed.rebuild().unwrap().unwrap();
        assert_eq!(rebuilt.parameter(), &json!("bye"));
        assert_eq!(rebuilt.raw(), "a @upper:: bye; b");
        assert_eq!(rebuilt.execute(None), json!("BYE"));
    }

    #[test]
    fn test_change_text_stays_inside_occurrence() {
        let text = "hello world @upper:: hello;";
        let directive = first(text);
        let changed = directive.change("bye");
        assert_eq!(changed.consume(), "hello world @upper:: bye;");
    }

    #[test]
    fn test_change_text_in_tab_indented_block() {
        let text = "/*:\n\t@doc:\n\t\tline one\n\t\tline two\n\t@end-doc\n*/";
        let directive = first(text);
        assert_eq!(directive.content(), "line one\nline two");

        let changed = directive.change("new body");
        assert_eq!(
            changed.consume(),
            "/*:\n\t@doc:\n\t\tnew body\n\t@end-doc\n*/"
        );

        let rebuilt = changed.rebuild().unwrap().unwrap();
        assert_eq!(rebuilt.content(), "new body");
        assert_eq!(rebuilt.parameter(), &json!("new body"));
    }

    #[test]
    fn test_change_value_keeps_raw() {
        let directive = first("@upper:: hello;");
        let changed = directive.change(json!({"k": true}));
        assert_eq!(changed.consume(), "@upper:: hello;");

        let rebuilt = changed.rebuild().unwrap().unwrap();
        assert_eq!(rebuilt.parameter(), &json!({"k": true}));
    }

    #[test]
    fn test_change_directive_replaces_occurrence() {
        let directive = first("x @upper:: hello; y");
        let other = first("@note:: swapped;");
        let changed = directive.change(&other);
        assert_eq!(changed.consume(), "x @note:: swapped; y");

        let rebuilt = changed.rebuild().unwrap().unwrap();
        assert_eq!(rebuilt.command(), "note");
        assert_eq!(rebuilt.parameter(), &json!("swapped"));
    }

    #[test]
    fn test_clear() {
        let directive = first("@upper: hello @end-upper");
        let cleared = directive.clear();
        assert_eq!(cleared.consume(), "@upper:  @end-upper");

        let rebuilt = cleared.rebuild().unwrap().unwrap();
        assert_eq!(rebuilt.parameter(), &json!(""));
    }

    #[test]
    fn test_collapse() {
        let directive = first("keep /*: @upper: gone @end-upper */ this");
        let collapsed = directive.collapse();
        assert_eq!(collapsed.consume(), "keep  this");
        assert_eq!(collapsed.rebuild().unwrap(), None);
    }

    #[test]
    fn test_rebuild_without_staging_returns_same_directive() {
        let directive = first("@upper:: hello;");
        assert_eq!(directive.rebuild().unwrap(), Some(directive));
    }

    #[test]
    fn test_rebuild_prefers_same_position() {
        let directives = parser().parse("@upper:: one; @upper:: two;").unwrap();
        let rebuilt = directives[1].change("three").rebuild().unwrap().unwrap();
        assert_eq!(rebuilt.raw(), "@upper:: one; @upper:: three;");
        assert_eq!(rebuilt.span().start, directives[1].span().start);
        assert_eq!(rebuilt.parameter(), &json!("three"));
    }

    #[test]
    fn test_directive_equality_ignores_parser() {
        let a = first("@upper:: hello;");
        let b = DirectiveParser::new(CommandRegistry::new().with_fn("upper", upper))
            .parse("@upper:: hello;")
            .unwrap()
            .remove(0);
        assert_eq!(a, b);
    }
}
