//! Loading [`ResponseConfig`] from the environment.
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `ERRS_TRACE_MODE` | [`ResponseConfig::trace_mode`] | `op_stack` |
//! | `ERRS_DEFAULT_REALM` | [`ResponseConfig::default_realm`] | `default` |
//! | `ERRS_REDACTED_MESSAGE` | [`ResponseConfig::redacted_message`] | `internal server error - please contact support` |
//!
//! Unset variables keep their defaults. Load once at startup and pass the
//! config to [`respond`](crate::respond).

use crate::{logging::LOG_TARGET, ParseTraceModeError, ResponseConfig, TraceMode};
use thiserror::Error;

/// Variable selecting [`TraceMode`](crate::TraceMode).
pub const TRACE_MODE_VAR: &str = "ERRS_TRACE_MODE";

/// Variable overriding the default authentication realm.
pub const DEFAULT_REALM_VAR: &str = "ERRS_DEFAULT_REALM";

/// Variable overriding the redacted 500-class message.
pub const REDACTED_MESSAGE_VAR: &str = "ERRS_REDACTED_MESSAGE";

/// Invalid configuration value.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The trace mode name is not recognized.
    #[error("invalid {var}")]
    TraceMode {
        /// Variable that held the value.
        var: &'static str,
        /// Parse failure.
        #[source]
        source: ParseTraceModeError,
    },

    /// The variable is set but blank.
    #[error("{var} is set but empty")]
    Empty {
        /// Offending variable.
        var: &'static str,
    },
}

impl ResponseConfig {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through `lookup`, which returns a variable's value if set.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(TRACE_MODE_VAR) {
            config.trace_mode = raw.parse::<TraceMode>().map_err(|source| ConfigError::TraceMode {
                var: TRACE_MODE_VAR,
                source,
            })?;
        }
        if let Some(realm) = non_empty(&lookup, DEFAULT_REALM_VAR)? {
            config.default_realm = realm;
        }
        if let Some(message) = non_empty(&lookup, REDACTED_MESSAGE_VAR)? {
            config.redacted_message = message;
        }

        tracing::debug!(
            target: LOG_TARGET,
            trace_mode = %config.trace_mode,
            default_realm = %config.default_realm,
            "response config loaded"
        );
        Ok(config)
    }
}

fn non_empty<F>(lookup: &F, var: &'static str) -> Result<Option<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) if value.trim().is_empty() => Err(ConfigError::Empty { var }),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DEFAULT_REALM, DEFAULT_REDACTED_MESSAGE};
    use std::collections::HashMap;
    use std::error::Error as _;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn nothing_set_is_default() {
        let config = ResponseConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, ResponseConfig::default());
        assert_eq!(config.default_realm, DEFAULT_REALM);
        assert_eq!(config.redacted_message, DEFAULT_REDACTED_MESSAGE);
    }

    #[test]
    fn every_variable_applies() {
        let config = ResponseConfig::from_lookup(lookup_in(&[
            (TRACE_MODE_VAR, "captured_stack"),
            (DEFAULT_REALM_VAR, "movies"),
            (REDACTED_MESSAGE_VAR, "something went wrong"),
        ]))
        .unwrap();
        assert_eq!(config.trace_mode, TraceMode::CapturedStack);
        assert_eq!(config.default_realm, "movies");
        assert_eq!(config.redacted_message, "something went wrong");
    }

    #[test]
    fn bad_trace_mode_is_rejected() {
        let err = ResponseConfig::from_lookup(lookup_in(&[(TRACE_MODE_VAR, "verbose")])).unwrap_err();
        assert!(matches!(err, ConfigError::TraceMode { var: TRACE_MODE_VAR, .. }));
        assert!(err.to_string().contains(TRACE_MODE_VAR));
        assert!(err.source().unwrap().to_string().contains("verbose"));
    }

    #[test]
    fn blank_values_are_rejected() {
        let err = ResponseConfig::from_lookup(lookup_in(&[(DEFAULT_REALM_VAR, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::Empty { var: DEFAULT_REALM_VAR }));
    }
}
