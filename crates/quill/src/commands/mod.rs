//! CLI command implementations.

pub(crate) mod extract;
pub(crate) mod run;
pub(crate) mod strip;

pub(crate) use extract::ExtractArgs;
pub(crate) use run::RunArgs;
pub(crate) use strip::StripArgs;

use std::io::Read;
use std::path::Path;

use quill_config::Config;
use quill_directive::{DirectiveParser, Extractor};

use crate::error::CliError;
use crate::resolver;

/// Read `input`, or stdin when it is `-`.
pub(crate) fn read_input(input: &Path) -> Result<String, CliError> {
    if input == Path::new("-") {
        let mut text = String::new();
        std::io::stdin().read_to_string(&mut text)?;
        return Ok(text);
    }
    Ok(std::fs::read_to_string(input)?)
}

/// Parser over the configured commands and extraction options.
pub(crate) fn parser(config: &Config) -> DirectiveParser {
    DirectiveParser::new(resolver::registry(config))
        .with_extractor(Extractor::new().with_strip_tabs(config.extract.strip_tabs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_read_input_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.md");
        std::fs::write(&path, "@upper:: hi;").unwrap();
        assert_eq!(read_input(&path).unwrap(), "@upper:: hi;");
    }

    #[test]
    fn test_read_input_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_input(&dir.path().join("missing.md")).unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }

    #[test]
    fn test_parser_uses_extract_config() {
        let mut config = Config::default();
        config.extract.strip_tabs = false;
        assert!(!parser(&config).extractor().strip_tabs());
    }
}
