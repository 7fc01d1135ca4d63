use serde::Serialize;
use serde_json::Value;
use std::fmt;

use crate::error::{AppError, AppResult};

/// A single schema constraint that a document breaks, located by JSON path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaViolation {
    pub path: String,
    pub constraint: String,
}

impl SchemaViolation {
    pub fn new(path: impl Into<String>, constraint: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            constraint: constraint.into(),
        }
    }
}

impl fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.constraint)
    }
}

/// Validates `document` against `schema` and returns every violation found.
///
/// An empty vector means the document conforms. A schema that does not
/// compile is a configuration error.
pub fn validate_against_schema(document: &Value, schema: &Value) -> AppResult<Vec<SchemaViolation>> {
    let validator = jsonschema::validator_for(schema)
        .map_err(|e| AppError::Configuration(format!("Invalid document schema: {}", e)))?;

    let violations: Vec<SchemaViolation> = validator
        .iter_errors(document)
        .map(|e| SchemaViolation::new(json_path(&e.instance_path.to_string()), e.to_string()))
        .collect();

    Ok(violations)
}

/// Render a JSON pointer (`/databases/1/name`) as `$.databases[1].name`
fn json_path(pointer: &str) -> String {
    let mut path = String::from("$");
    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()) {
            path.push('[');
            path.push_str(&segment);
            path.push(']');
        } else {
            path.push('.');
            path.push_str(&segment);
        }
    }
    path
}
