//! Commands available to `quill run`.
//!
//! Built-in text commands are registered first; commands declared in `quill.toml`
//! are registered on top and replace built-ins of the same name.

use std::io::Write;
use std::process::{Command as Process, Output as ProcessOutput, Stdio};

use quill_config::{CommandConfig, Config};
use quill_directive::{Command, CommandRegistry, camel_case};
use serde_json::Value;

/// Apply `f` to text parameters; other values pass through.
fn on_text(f: fn(&str) -> String) -> impl Fn(Value) -> Value + Send + Sync + 'static {
    move |parameter| match parameter {
        Value::String(text) => Value::String(f(&text)),
        other => other,
    }
}

/// Serialize any parameter to a compact JSON string.
fn to_json(parameter: Value) -> Value {
    Value::String(parameter.to_string())
}

/// Registry with the built-in commands and every command from `config`.
pub(crate) fn registry(config: &Config) -> CommandRegistry {
    let registry = CommandRegistry::new()
        .with_fn("upper", on_text(str::to_uppercase))
        .with_fn("lower", on_text(str::to_lowercase))
        .with_fn("trim", on_text(|text: &str| text.trim().to_owned()))
        .with_fn("json", to_json);

    for (name, command) in &config.commands {
        registry.register(ProcessCommand::new(name, command));
    }
    registry
}

/// Runs an external program with the parameter on stdin.
///
/// Text parameters are written as is, anything else as JSON. The trimmed stdout is
/// the result. When the program cannot be started or exits unsuccessfully, the
/// parameter is returned unchanged.
#[derive(Debug)]
pub(crate) struct ProcessCommand {
    name: String,
    program: String,
    args: Vec<String>,
}

impl ProcessCommand {
    pub(crate) fn new(name: &str, config: &CommandConfig) -> Self {
        Self {
            name: camel_case(name),
            program: config.program.clone(),
            args: config.args.clone(),
        }
    }

    fn spawn(&self, input: &str) -> std::io::Result<ProcessOutput> {
        let mut child = Process::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Feed stdin concurrently so a chatty program cannot block on a full pipe.
        std::thread::scope(|scope| {
            if let Some(mut stdin) = child.stdin.take() {
                scope.spawn(move || {
                    let _ = stdin.write_all(input.as_bytes());
                });
            }
            child.wait_with_output()
        })
    }
}

impl Command for ProcessCommand {
    fn name(&self) -> &str {
        &self.name
    }

    fn call(&self, parameter: Value) -> Value {
        let input = match &parameter {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        };

        match self.spawn(&input) {
            Ok(output) if output.status.success() => {
                Value::String(String::from_utf8_lossy(&output.stdout).trim().to_owned())
            }
            Ok(output) => {
                tracing::warn!(
                    command = %self.name,
                    program = %self.program,
                    status = %output.status,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "Command failed, returning parameter"
                );
                parameter
            }
            Err(e) => {
                tracing::warn!(
                    command = %self.name,
                    program = %self.program,
                    error = %e,
                    "Failed to start command, returning parameter"
                );
                parameter
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use quill_directive::CommandResolver;
    use serde_json::json;

    fn call(registry: &CommandRegistry, name: &str, parameter: Value) -> Value {
        registry.resolve(name).unwrap().call(parameter)
    }

    fn process(program: &str, args: &[&str]) -> CommandConfig {
        CommandConfig {
            program: program.to_owned(),
            args: args.iter().map(|&a| a.to_owned()).collect(),
        }
    }

    #[test]
    fn test_builtins() {
        let registry = registry(&Config::default());
        assert_eq!(registry.names(), vec!["json", "lower", "trim", "upper"]);
        assert_eq!(call(&registry, "upper", json!("abc")), json!("ABC"));
        assert_eq!(call(&registry, "lower", json!("ABC")), json!("abc"));
        assert_eq!(call(&registry, "trim", json!("  abc ")), json!("abc"));
        assert_eq!(call(&registry, "upper", json!(3)), json!(3));
        assert_eq!(call(&registry, "json", json!({"a": 1})), json!(r#"{"a":1}"#));
    }

    #[test]
    fn test_config_commands_are_camel_cased() {
        let mut config = Config::default();
        config
            .commands
            .insert("page-title".to_owned(), process("cat", &[]));
        let registry = registry(&config);
        assert!(registry.contains("pageTitle"));
    }

    #[test]
    fn test_missing_program_returns_parameter() {
        let command = ProcessCommand::new("nope", &process("quill-test-no-such-program", &[]));
        assert_eq!(command.call(json!("unchanged")), json!("unchanged"));
    }

    #[cfg(unix)]
    #[test]
    fn test_process_round_trip() {
        let command = ProcessCommand::new("shout", &process("tr", &["a-z", "A-Z"]));
        assert_eq!(command.name(), "shout");
        assert_eq!(command.call(json!("hello\n")), json!("HELLO"));
        assert_eq!(command.call(json!({"k": "v"})), json!(r#"{"K":"V"}"#));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_process_returns_parameter() {
        let command = ProcessCommand::new("fail", &process("false", &[]));
        assert_eq!(command.call(json!([1, 2])), json!([1, 2]));
    }

    #[cfg(unix)]
    #[test]
    fn test_config_command_overrides_builtin() {
        let mut config = Config::default();
        config.commands.insert("upper".to_owned(), process("cat", &[]));
        let registry = registry(&config);
        assert_eq!(call(&registry, "upper", json!("kept")), json!("kept"));
    }
}
