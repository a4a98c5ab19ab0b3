//! `${VAR}` expansion for command definitions.

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// `field` names the config key in error messages. Strings without `${` are returned
/// as is, so a bare `$` (common in shell arguments) never triggers expansion.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| match std::env::var(var) {
        Ok(found) => Ok(Some(found)),
        Err(_) => Err(Unset(var.to_owned())),
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Expand every element of `values`; `field` gets an `[index]` suffix in errors.
pub(crate) fn expand_all(values: &[String], field: &str) -> Result<Vec<String>, ConfigError> {
    values
        .iter()
        .enumerate()
        .map(|(i, value)| expand_env(value, &format!("{field}[{i}]")))
        .collect()
}

/// Variable referenced without a default that is not set.
struct Unset(String);
