use std::fmt;
use std::path::PathBuf;

use crate::schema::SchemaViolation;

/// Pre-flight errors: anything that stops a run before the first call to the
/// administrative endpoint.
#[derive(Debug)]
pub enum AppError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse(String),
    Configuration(String),
    SchemaValidation(Vec<SchemaViolation>),
    SemanticValidation(Vec<String>),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Io { path, source } => {
                write!(f, "Failed to read config file {}: {}", path.display(), source)
            }
            AppError::Parse(e) => write!(f, "Parse error: {}", e),
            AppError::Configuration(e) => write!(f, "Configuration error: {}", e),
            AppError::SchemaValidation(violations) => {
                write!(f, "Schema validation failed:")?;
                for violation in violations {
                    write!(f, " [{}]", violation)?;
                }
                Ok(())
            }
            AppError::SemanticValidation(problems) => {
                write!(f, "Semantic validation failed: {}", problems.join("; "))
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Parse(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
