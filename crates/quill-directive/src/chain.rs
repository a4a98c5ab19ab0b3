//! Chained execution of nested directives.
//!
//! A parameter can itself be a directive:
//!
//! ```text
//! @upper: @trim:: hello ; @end-upper
//! ```
//!
//! Chaining walks down through such parameters, then executes from the innermost
//! directive outwards, feeding each result to the next level as its parameter.
//! Only the first directive found at each level is followed; siblings are ignored.

use serde_json::Value;

use crate::{Directive, DirectiveError, pattern};

/// Per-call chaining state.
///
/// Tracks which commands have started a chain so that a command whose result
/// reproduces its own directive syntax is executed instead of expanded again.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChainState {
    tracked: Vec<String>,
}

impl ChainState {
    /// Create an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The command that most recently started a chain.
    #[must_use]
    pub fn tracked_name(&self) -> Option<&str> {
        self.tracked.last().map(String::as_str)
    }

    /// Whether `command` has already started a chain in this call.
    #[must_use]
    pub fn is_tracked(&self, command: &str) -> bool {
        self.tracked.iter().any(|name| name == command)
    }

    fn track(&mut self, command: &str) {
        self.tracked.push(command.to_owned());
    }
}

/// Directive text held by `parameter`, if it is text forming a whole directive.
fn nested_text(parameter: &Value) -> Option<&str> {
    parameter.as_str().filter(|text| pattern::is_directive(text))
}

impl Directive {
    /// Execute this directive, first resolving directives nested in its parameter.
    ///
    /// Falls back to a single [`execute`](Self::execute) when the parameter holds no
    /// directive.
    ///
    /// # Errors
    ///
    /// Returns [`DirectiveError`] only on grammar inconsistencies while re-extracting
    /// nested parameters.
    pub fn chain(&self, parameter: Option<Value>) -> Result<Value, DirectiveError> {
        self.chain_with(parameter, &mut ChainState::new())
    }

    /// [`chain`](Self::chain) with caller-provided state.
    ///
    /// # Errors
    ///
    /// See [`chain`](Self::chain).
    pub fn chain_with(
        &self,
        parameter: Option<Value>,
        state: &mut ChainState,
    ) -> Result<Value, DirectiveError> {
        let effective = parameter.as_ref().unwrap_or(&self.parameter);

        let Some(text) = nested_text(effective).map(str::to_owned) else {
            return Ok(self.execute(parameter));
        };
        if state.is_tracked(&self.command) {
            tracing::debug!(command = %self.command, "Command already chaining, executing once");
            return Ok(self.execute(parameter));
        }
        state.track(&self.command);

        // Outermost first; each entry's parameter holds the next one.
        let mut stack = vec![self.clone()];
        let mut next = Some(text);
        while let Some(source) = next.take() {
            let Some(nested) = self.parser.parse(&source)?.into_iter().next() else {
                break;
            };
            next = nested_text(&nested.parameter).map(str::to_owned);
            stack.push(nested);
        }
        tracing::debug!(command = %self.command, depth = stack.len(), "Chain resolved");

        let mut result = stack
            .last()
            .map_or(Value::Null, |innermost| innermost.parameter.clone());
        for directive in stack.iter().rev() {
            result = directive.chain_with(Some(result), state)?;
        }

        Ok(result)
    }
}
