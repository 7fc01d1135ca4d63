use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use crate::backend::{ClientError, ErrorCode};

lazy_static! {
    static ref ALREADY_EXISTS: Regex = Regex::new(r"(?i)\balready exists\b").unwrap();
    static ref PERMISSION: Regex =
        Regex::new(r"(?i)authoriz|authenticat|permission|requires admin privilege").unwrap();
    static ref NOT_FOUND: Regex = Regex::new(r"(?i)\bnot found\b|\bdoes not exist\b").unwrap();
    static ref NO_ADMIN_YET: Regex = Regex::new(r"(?i)create admin user first").unwrap();
}

/// Body of a `/query` response
#[derive(Debug, Deserialize, Default)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<StatementResult>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct StatementResult {
    #[serde(default)]
    pub statement_id: Option<u64>,
    #[serde(default)]
    pub series: Vec<Series>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct Series {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub values: Vec<Vec<Value>>,
}

impl QueryResponse {
    /// First error reported anywhere in the response, top level first
    pub fn first_error(&self) -> Option<&str> {
        self.error
            .as_deref()
            .or_else(|| self.results.iter().find_map(|r| r.error.as_deref()))
    }

    /// Values of the first column across every series, as strings
    ///
    /// For `SHOW DATABASES` and `SHOW USERS` this is the list of names.
    pub fn first_column(&self) -> Vec<String> {
        self.results
            .iter()
            .flat_map(|result| result.series.iter())
            .flat_map(|series| series.values.iter())
            .filter_map(|row| row.first().and_then(Value::as_str))
            .map(str::to_string)
            .collect()
    }
}

/// Classify an error message carried by a successful (HTTP 200) response
pub fn classify_statement_error(message: &str) -> ClientError {
    if ALREADY_EXISTS.is_match(message) {
        ClientError::AlreadyExists(message.to_string())
    } else if PERMISSION.is_match(message) {
        ClientError::application(ErrorCode::PermissionDenied, message)
    } else if NOT_FOUND.is_match(message) {
        ClientError::application(ErrorCode::NotFound, message)
    } else {
        ClientError::application(ErrorCode::Rejected, message)
    }
}

/// Whether `err` is an auth-enabled server refusing everything until the
/// first admin account exists
pub fn awaiting_first_admin(err: &ClientError) -> bool {
    matches!(
        err,
        ClientError::Application {
            code: ErrorCode::PermissionDenied,
            message,
        } if NO_ADMIN_YET.is_match(message)
    )
}

/// Classify a non-2xx response from its status and body
pub fn classify_http_error(status: u16, body: &str) -> ClientError {
    let message = serde_json::from_str::<QueryResponse>(body)
        .ok()
        .and_then(|response| response.first_error().map(str::to_string))
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                format!("HTTP {}", status)
            } else {
                trimmed.to_string()
            }
        });

    let code = match status {
        401 | 403 => ErrorCode::PermissionDenied,
        400 => ErrorCode::InvalidRequest,
        404 => ErrorCode::NotFound,
        500..=599 => ErrorCode::Server,
        _ => ErrorCode::Rejected,
    };

    ClientError::application(code, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_show_databases() {
        let body = r#"{"results":[{"statement_id":0,"series":[{"name":"databases","columns":["name"],"values":[["_internal"],["metrics"]]}]}]}"#;

        let response: QueryResponse = serde_json::from_str(body).unwrap();

        assert_eq!(response.first_column(), vec!["_internal", "metrics"]);
        assert!(response.first_error().is_none());
    }

    #[test]
    fn test_empty_result_has_no_rows() {
        let response: QueryResponse =
            serde_json::from_str(r#"{"results":[{"statement_id":0}]}"#).unwrap();
        assert!(response.first_column().is_empty());
    }

    #[test]
    fn test_statement_errors_are_classified() {
        assert!(classify_statement_error("user already exists").is_already_exists());
        assert_eq!(
            classify_statement_error("database not found: metrics"),
            ClientError::application(ErrorCode::NotFound, "database not found: metrics")
        );
        assert_eq!(
            classify_statement_error("error authorizing query: writer not authorized to execute statement"),
            ClientError::application(
                ErrorCode::PermissionDenied,
                "error authorizing query: writer not authorized to execute statement"
            )
        );
        assert!(matches!(
            classify_statement_error("unable to create user"),
            ClientError::Application {
                code: ErrorCode::Rejected,
                ..
            }
        ));
    }

    #[test]
    fn test_parse_show_users() {
        let body = r#"{"results":[{"statement_id":0,"series":[{"columns":["user","admin"],"values":[["admin",true],["writer",false]]}]}]}"#;

        let response: QueryResponse = serde_json::from_str(body).unwrap();

        assert_eq!(response.first_column(), vec!["admin", "writer"]);
    }

    #[test]
    fn test_detects_server_without_admin() {
        let refused = classify_http_error(
            403,
            r#"{"error":"error authorizing query: create admin user first or disable authentication"}"#,
        );
        assert!(awaiting_first_admin(&refused));

        let wrong_password = classify_http_error(401, r#"{"error":"authorization failed"}"#);
        assert!(!awaiting_first_admin(&wrong_password));
    }

    #[test]
    fn test_http_errors_use_body_message() {
        assert_eq!(
            classify_http_error(401, r#"{"error":"authorization failed"}"#),
            ClientError::application(ErrorCode::PermissionDenied, "authorization failed")
        );
        assert_eq!(
            classify_http_error(400, r#"{"error":"error parsing query: found EOF"}"#),
            ClientError::application(ErrorCode::InvalidRequest, "error parsing query: found EOF")
        );
        assert_eq!(
            classify_http_error(502, ""),
            ClientError::application(ErrorCode::Server, "HTTP 502")
        );
        assert_eq!(
            classify_http_error(500, "upstream exploded"),
            ClientError::application(ErrorCode::Server, "upstream exploded")
        );
    }
}
