//! Error taxonomy shared by every warden component.
//!
//! Fatal kinds abort one-shot commands. `SubprocessFailure` and
//! `VersionControl` are recoverable: callers on the heartbeat and git paths
//! log them and carry on.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A single schema violation: where in the document, and what was violated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// JSON pointer to the offending value (`""` for the document root)
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = if self.path.is_empty() { "/" } else { &self.path };
        write!(f, "{path}: {}", self.message)
    }
}

#[derive(Debug, Error)]
pub enum WardenError {
    #[error("config file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("malformed {what} ({}): {reason}", .path.display())]
    MalformedConfig {
        what: &'static str,
        path: PathBuf,
        reason: String,
    },

    #[error("schema {} could not be compiled: {reason}", .path.display())]
    SchemaInvalid { path: PathBuf, reason: String },

    #[error("schema validation failed with {} violation(s):\n{}", .violations.len(), format_violations(.violations))]
    SchemaValidation { violations: Vec<Violation> },

    #[error("live config not found: {}", .0.display())]
    LiveConfigMissing(PathBuf),

    #[error("command failed to run ({command}): {reason}")]
    SubprocessFailure { command: String, reason: String },

    #[error("git {operation} failed: {reason}")]
    VersionControl { operation: String, reason: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl WardenError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

fn format_violations(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(|v| format!("  - {v}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub type WardenResult<T> = std::result::Result<T, WardenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_validation_lists_every_violation() {
        let err = WardenError::SchemaValidation {
            violations: vec![
                Violation {
                    path: "/port".to_string(),
                    message: "\"x\" is not of type \"integer\"".to_string(),
                },
                Violation {
                    path: String::new(),
                    message: "\"name\" is a required property".to_string(),
                },
            ],
        };
        let text = err.to_string();
        assert!(text.contains("2 violation(s)"));
        assert!(text.contains("  - /port: "));
        assert!(text.contains("  - /: \"name\" is a required property"));
    }

    #[test]
    fn test_malformed_config_names_file() {
        let err = WardenError::MalformedConfig {
            what: "managed config",
            path: PathBuf::from("/tmp/x.json"),
            reason: "expected value at line 1 column 1".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "malformed managed config (/tmp/x.json): expected value at line 1 column 1"
        );
    }
}
