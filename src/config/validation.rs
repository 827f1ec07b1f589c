//! Configuration errors and environment expansion.

use thiserror::Error;

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse the YAML configuration.
    #[error("failed to parse YAML config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Configuration validation failed.
    #[error("config validation error: {0}")]
    Validation(String),
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `${VAR:-default}` syntax; an unset variable with
/// no default expands to the empty string. Applied to the raw config text
/// before parsing so secrets (tokens) can stay out of the file.
pub fn expand_env_vars(input: &str) -> String {
    static ENV_VAR_REGEX: std::sync::OnceLock<regex::Regex> = std::sync::OnceLock::new();

    let regex = ENV_VAR_REGEX.get_or_init(|| {
        regex::Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)(?::-([^}]*))?\}")
            .expect("failed to compile env var regex")
    });

    regex
        .replace_all(input, |caps: &regex::Captures| {
            let var_name = &caps[1];
            let default_value = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            std::env::var(var_name).unwrap_or_else(|_| default_value.to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_unchanged() {
        assert_eq!(expand_env_vars("token: abc"), "token: abc");
    }

    #[test]
    fn unset_variable_uses_default() {
        let result = expand_env_vars("token: ${PRICEFEED_NO_SUCH_VAR_1:-fallback}");
        assert_eq!(result, "token: fallback");
    }

    #[test]
    fn unset_variable_without_default_is_empty() {
        let result = expand_env_vars("token: ${PRICEFEED_NO_SUCH_VAR_2}");
        assert_eq!(result, "token: ");
    }

    #[test]
    fn set_variable_is_substituted() {
        // SAFETY: test-scoped variable, removed before returning.
        unsafe {
            std::env::set_var("PRICEFEED_TEST_TOKEN", "s3cret");
        }
        let result = expand_env_vars("token: ${PRICEFEED_TEST_TOKEN}");
        assert_eq!(result, "token: s3cret");
        unsafe {
            std::env::remove_var("PRICEFEED_TEST_TOKEN");
        }
    }
}
