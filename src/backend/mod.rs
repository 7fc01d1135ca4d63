use async_trait::async_trait;
use std::fmt;

pub mod influxdb;

pub use influxdb::{InfluxConnectionConfig, InfluxDbClient};

/// Application-level failure categories reported by the administrative endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Missing or wrong credentials, or insufficient privileges
    PermissionDenied,
    /// The endpoint could not parse or accept the request (e.g. malformed name)
    InvalidRequest,
    /// The statement referenced a user or database that does not exist
    NotFound,
    /// The statement was understood but refused for another reason
    Rejected,
    /// The endpoint failed internally or answered with something unreadable
    Server,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::PermissionDenied => "permission denied",
            ErrorCode::InvalidRequest => "invalid request",
            ErrorCode::NotFound => "not found",
            ErrorCode::Rejected => "rejected",
            ErrorCode::Server => "server error",
        };
        f.write_str(name)
    }
}

/// Closed classification of everything an [`AdminClient`] call can fail with.
///
/// The provisioner branches on the variant only, never on the message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    AlreadyExists(String),
    Transport(String),
    Application { code: ErrorCode, message: String },
}

impl ClientError {
    pub fn application(code: ErrorCode, message: impl Into<String>) -> Self {
        ClientError::Application {
            code,
            message: message.into(),
        }
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, ClientError::AlreadyExists(_))
    }
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::AlreadyExists(e) => write!(f, "Already exists: {}", e),
            ClientError::Transport(e) => write!(f, "Transport error: {}", e),
            ClientError::Application { code, message } => {
                write!(f, "Application error ({}): {}", code, message)
            }
        }
    }
}

impl std::error::Error for ClientError {}

pub type ClientResult<T> = Result<T, ClientError>;

/// Administrative operations the provisioner needs from a database service
///
/// Implementations own one connection (or session) to the service. Calls
/// are issued strictly one after another by a single owner.
#[async_trait]
pub trait AdminClient: Send {
    /// Create a privileged account with all privileges
    async fn create_superuser(&mut self, user: &str, password: &str) -> ClientResult<()>;

    /// Use these credentials for every following call
    fn authenticate_as(&mut self, user: &str, password: &str);

    /// Create a database
    async fn create_database(&mut self, name: &str) -> ClientResult<()>;

    /// Create a non-privileged user
    async fn create_user(&mut self, user: &str, password: &str) -> ClientResult<()>;

    /// Grant every privilege on `database` to `user`
    async fn grant_all_privileges(&mut self, user: &str, database: &str) -> ClientResult<()>;

    /// Release the connection. Calling it again is a no-op.
    async fn close(&mut self);
}
