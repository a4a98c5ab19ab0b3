//! `quill strip` command implementation.

use std::path::PathBuf;

use clap::Args;
use quill_config::Config;
use quill_directive::{DirectiveError, DirectiveParser};

use super::{parser, read_input};
use crate::error::CliError;
use crate::output::{Output, write_text};

/// Arguments for the strip command.
#[derive(Args)]
pub(crate) struct StripArgs {
    /// File to read, or `-` for stdin.
    input: PathBuf,
}

impl StripArgs {
    /// Execute the strip command.
    ///
    /// # Errors
    ///
    /// Returns an error if the input cannot be read or extraction fails.
    pub(crate) fn execute(self, config: &Config) -> Result<(), CliError> {
        let text = read_input(&self.input)?;
        let (stripped, removed) = strip_directives(&parser(config), text)?;

        write_text(&stripped)?;
        Output::new().tally("Removed", removed, &self.input);
        Ok(())
    }
}

/// Collapse directives one at a time until none are left.
///
/// Returns the cleaned text and the number of directives removed.
pub(crate) fn strip_directives(
    parser: &DirectiveParser,
    mut text: String,
) -> Result<(String, usize), DirectiveError> {
    let mut removed = 0;
    while let Some(directive) = parser.parse(&text)?.into_iter().next() {
        text = directive.collapse().consume().to_owned();
        removed += 1;
    }
    Ok((text, removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn strip(text: &str) -> (String, usize) {
        strip_directives(&parser(&Config::default()), text.to_owned()).unwrap()
    }

    #[test]
    fn test_strip_mixed_forms() {
        let text = "\
fn main() {
    /*: @title: Demo @end-title */
    let x = 1; // @note:: keep it simple;
}
";
        let (stripped, removed) = strip(text);
        assert_eq!(removed, 2);
        assert_eq!(stripped, "fn main() {\n    \n    let x = 1; // \n}\n");
    }

    #[test]
    fn test_strip_nested_counts_outer_only() {
        let (stripped, removed) = strip("a @upper: @trim:: x; @end-upper b");
        assert_eq!(stripped, "a  b");
        assert_eq!(removed, 1);
    }

    #[test]
    fn test_strip_without_directives() {
        assert_eq!(strip("plain text\n"), ("plain text\n".to_owned(), 0));
    }
}
