//! JSON Schema validation of the managed config.
//!
//! Parsing and schema checking are separate steps so that a syntax error is
//! reported as `MalformedConfig` before any schema work happens.

use crate::error::{Violation, WardenError, WardenResult};
use jsonschema::Validator;
use serde_json::Value;
use std::path::Path;

/// Read `path` and parse it as JSON.
pub fn parse_document(path: &Path, what: &'static str) -> WardenResult<Value> {
    let raw = std::fs::read(path)
        .map_err(|e| WardenError::io(format!("read {what} {}", path.display()), e))?;
    parse_bytes(&raw, path, what)
}

/// Parse bytes already read from `path`.
pub fn parse_bytes(raw: &[u8], path: &Path, what: &'static str) -> WardenResult<Value> {
    serde_json::from_slice(raw).map_err(|e| WardenError::MalformedConfig {
        what,
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Load and compile the schema at `path`.
pub fn compile_schema(path: &Path) -> WardenResult<Validator> {
    let schema = match parse_document(path, "schema") {
        Ok(schema) => schema,
        Err(WardenError::MalformedConfig { reason, .. }) => {
            return Err(WardenError::SchemaInvalid {
                path: path.to_path_buf(),
                reason,
            })
        }
        Err(e) => return Err(e),
    };
    jsonschema::validator_for(&schema).map_err(|e| WardenError::SchemaInvalid {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// Every violation of `validator` in `document`, in report order.
pub fn collect_violations(validator: &Validator, document: &Value) -> Vec<Violation> {
    validator
        .iter_errors(document)
        .map(|error| Violation {
            path: error.instance_path.to_string(),
            message: error.to_string(),
        })
        .collect()
}

/// Parse `document_path` and check it against the schema at `schema_path`.
///
/// Returns the parsed document when it is valid.
pub fn validate_file(document_path: &Path, schema_path: &Path) -> WardenResult<Value> {
    let raw = std::fs::read(document_path).map_err(|e| {
        WardenError::io(format!("read managed config {}", document_path.display()), e)
    })?;
    validate_bytes(&raw, document_path, schema_path)
}

/// Check `raw`, the contents of `document_path`, against the schema.
///
/// Callers that go on to write the document should write these same bytes.
pub fn validate_bytes(
    raw: &[u8],
    document_path: &Path,
    schema_path: &Path,
) -> WardenResult<Value> {
    let document = parse_bytes(raw, document_path, "managed config")?;
    let validator = compile_schema(schema_path)?;
    let violations = collect_violations(&validator, &document);
    if violations.is_empty() {
        Ok(document)
    } else {
        Err(WardenError::SchemaValidation { violations })
    }
}
