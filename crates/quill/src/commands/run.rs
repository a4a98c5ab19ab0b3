//! `quill run` command implementation.

use std::path::PathBuf;

use clap::Args;
use quill_config::Config;
use quill_directive::{DirectiveError, DirectiveParser};
use serde::Serialize;
use serde_json::Value;

use super::{parser, read_input};
use crate::error::CliError;
use crate::output::{Output, write_json};

/// Arguments for the run command.
#[derive(Args)]
pub(crate) struct RunArgs {
    /// File to read, or `-` for stdin.
    input: PathBuf,

    /// Resolve nested directives before executing (default: enabled).
    #[arg(long)]
    chain: Option<bool>,

    /// Execute each directive once, ignoring nested directives.
    #[arg(long, conflicts_with = "chain")]
    no_chain: bool,
}

/// Outcome of one directive.
#[derive(Debug, PartialEq, Serialize)]
pub(crate) struct RunResult {
    command: String,
    #[serde(rename = "match")]
    matcher: String,
    resolved: bool,
    result: Value,
}

impl RunArgs {
    /// Resolve chaining from --chain/--no-chain flags.
    pub(crate) fn resolve_chain(&self) -> Option<bool> {
        self.no_chain.then_some(false).or(self.chain)
    }

    /// Execute the run command.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read or extraction fails.
    pub(crate) fn execute(self, config: &Config) -> Result<(), CliError> {
        let text = read_input(&self.input)?;

        let results = run_directives(&parser(config), &text, config.chain.enabled)?;
        Output::new().tally("Executed", results.len(), &self.input);

        write_json(&results)?;
        Ok(())
    }
}

/// Execute every directive in `text`, in extraction order.
pub(crate) fn run_directives(
    parser: &DirectiveParser,
    text: &str,
    chain: bool,
) -> Result<Vec<RunResult>, DirectiveError> {
    parser
        .parse(text)?
        .into_iter()
        .map(|directive| {
            let result = if chain {
                directive.chain(None)?
            } else {
                directive.execute(None)
            };
            Ok(RunResult {
                command: directive.command().to_owned(),
                matcher: directive.matcher().to_owned(),
                resolved: directive.is_resolved(),
                result,
            })
        })
        .collect()
}
