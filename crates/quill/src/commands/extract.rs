//! `quill extract` command implementation.

use std::path::PathBuf;

use clap::Args;
use quill_config::Config;

use super::{parser, read_input};
use crate::error::CliError;
use crate::output::{Output, write_json};

/// Arguments for the extract command.
#[derive(Args)]
pub(crate) struct ExtractArgs {
    /// File to read, or `-` for stdin.
    input: PathBuf,
}

impl ExtractArgs {
    /// Execute the extract command.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read or extraction fails.
    pub(crate) fn execute(self, config: &Config) -> Result<(), CliError> {
        let text = read_input(&self.input)?;
        let directives = parser(config).parse(&text)?;

        Output::new().tally("Found", directives.len(), &self.input);
        write_json(&directives)?;
        Ok(())
    }
}
