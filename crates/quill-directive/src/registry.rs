//! Command resolution.
//!
//! A directive's command name is looked up through a [`CommandResolver`]. The
//! resolver is injected by the caller; [`CommandRegistry`] is the in-memory
//! implementation.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

/// An invocable command.
///
/// # Thread Safety
///
/// Commands are shared between directives through `Arc`, so they must be `Send + Sync`.
///
/// # Example
///
/// ```
/// use quill_directive::Command;
/// use serde_json::Value;
///
/// struct Upper;
///
/// impl Command for Upper {
///     fn name(&self) -> &str { "upper" }
///
///     fn call(&self, parameter: Value) -> Value {
///         match parameter {
///             Value::String(s) => Value::String(s.to_uppercase()),
///             other => other,
///         }
///     }
/// }
/// ```
pub trait Command: Send + Sync {
    /// Command name in camel-case form (e.g., "upper", "pageTitle").
    fn name(&self) -> &str;

    /// Run the command on a decoded parameter.
    fn call(&self, parameter: Value) -> Value;
}

/// Looks up commands by camel-case name.
///
/// Resolution must be idempotent: unresolved directives retry it every time they
/// are executed so that commands registered later are picked up.
pub trait CommandResolver: Send + Sync {
    /// Return the command registered under `name`, if any.
    fn resolve(&self, name: &str) -> Option<Arc<dyn Command>>;
}

/// Adapter turning a closure into a [`Command`].
pub struct FnCommand<F> {
    name: String,
    func: F,
}

impl<F> FnCommand<F>
where
    F: Fn(Value) -> Value + Send + Sync,
{
    /// Wrap `func` under `name`.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Command for FnCommand<F>
where
    F: Fn(Value) -> Value + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, parameter: Value) -> Value {
        (self.func)(parameter)
    }
}

/// In-memory command registry.
///
/// Commands can be added while building the registry or later through a shared
/// reference; directives that failed to resolve earlier see late registrations.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use quill_directive::{CommandRegistry, CommandResolver};
/// use serde_json::{Value, json};
///
/// let registry = Arc::new(CommandRegistry::new());
/// assert!(registry.resolve("double").is_none());
///
/// registry.register_fn("double", |v: Value| json!(v.as_i64().unwrap_or(0) * 2));
/// let double = registry.resolve("double").unwrap();
/// assert_eq!(double.call(json!(21)), json!(42));
/// ```
#[derive(Default)]
pub struct CommandRegistry {
    commands: RwLock<HashMap<String, Arc<dyn Command>>>,
}

impl CommandRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a command.
    #[must_use]
    pub fn with_command<C: Command + 'static>(self, command: C) -> Self {
        self.register(command);
        self
    }

    /// Register a closure under `name`.
    #[must_use]
    pub fn with_fn<F>(self, name: &str, func: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.register_fn(name, func);
        self
    }

    /// Register a command through a shared reference, replacing any previous one.
    pub fn register<C: Command + 'static>(&self, command: C) {
        self.insert(Arc::new(command));
    }

    /// Register a closure under `name` through a shared reference.
    pub fn register_fn<F>(&self, name: &str, func: F)
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.insert(Arc::new(FnCommand::new(name, func)));
    }

    /// Register an already shared command.
    pub fn insert(&self, command: Arc<dyn Command>) {
        let name = command.name().to_owned();
        self.commands
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name, command);
    }

    /// Whether a command is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(name)
    }

    /// Registered command names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }
}

impl CommandResolver for CommandRegistry {
    fn resolve(&self, name: &str) -> Option<Arc<dyn Command>> {
        self.commands
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .map(Arc::clone)
    }
}

impl fmt::Debug for CommandRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandRegistry")
            .field("commands", &self.names())
            .finish()
    }
}

/// Convert a hyphenated command name to the camel-case form used for resolution.
///
/// ```
/// use quill_directive::camel_case;
///
/// assert_eq!(camel_case("upper"), "upper");
/// assert_eq!(camel_case("page-title"), "pageTitle");
/// ```
#[must_use]
pub fn camel_case(name: &str) -> String {
    let mut result = String::with_capacity(name.len());
    let mut upper_next = false;

    for c in name.chars() {
        if c == '-' {
            upper_next = true;
        } else if upper_next {
            result.extend(c.to_uppercase());
            upper_next = false;
        } else {
            result.push(c);
        }
    }

    result
}
