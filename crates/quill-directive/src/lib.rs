//! Embedded directive extraction and chained execution.
//!
//! Directives are command invocations embedded in ordinary text, typically inside
//! comments. Two forms are recognized:
//!
//! ```text
//! /* @page-title: Getting started @end-page-title */
//! <!-- @upper:: hello; -->
//! ```
//!
//! A block runs from `@name:` to `@end-name` (or `@end-command`); a line runs from
//! `@name::` to the first unescaped `;`. The parameter between the tags is decoded as
//! JSON when possible and as indentation-stripped text otherwise.
//!
//! # Architecture
//!
//! - [`Extractor`] finds occurrences and splits them into [`DirectiveToken`]s
//! - [`DirectiveParser`] decodes parameters and binds each token to a [`Command`]
//!   through a caller-supplied [`CommandResolver`]
//! - [`Directive`] executes, chains nested directives, and stages edits of its
//!   source text
//! - [`DirectiveGroup`] indexes one extraction pass by command name
//!
//! # Example
//!
//! ```
//! use quill_directive::{CommandRegistry, DirectiveParser};
//! use serde_json::{Value, json};
//!
//! let registry = CommandRegistry::new()
//!     .with_fn("upper", |v: Value| json!(v.as_str().unwrap_or_default().to_uppercase()))
//!     .with_fn("trim", |v: Value| json!(v.as_str().unwrap_or_default().trim()));
//! let parser = DirectiveParser::new(registry);
//!
//! let directives = parser.parse("// @upper: @trim:: hello ; @end-upper").unwrap();
//! assert_eq!(directives[0].execute(None), json!("@TRIM:: HELLO ;"));
//! assert_eq!(directives[0].chain(None).unwrap(), json!("HELLO"));
//! ```

mod chain;
mod decode;
mod directive;
mod error;
mod extract;
mod group;
mod parser;
pub mod pattern;
mod registry;

pub use chain::ChainState;
pub use decode::decode;
pub use directive::{Content, Directive};
pub use error::DirectiveError;
pub use extract::{DirectiveToken, Extractor, extract};
pub use group::{DirectiveGroup, GroupEntry, alias, group};
pub use parser::DirectiveParser;
pub use pattern::{DirectiveForm, is_directive};
pub use registry::{Command, CommandRegistry, CommandResolver, FnCommand, camel_case};
