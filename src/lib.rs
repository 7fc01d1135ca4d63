pub mod backend;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod provisioner;
pub mod schema;

// Re-export commonly used types for easier access
pub use backend::{AdminClient, ClientError, ClientResult, ErrorCode};
pub use config::{DocumentFormat, ProvisioningConfig};
pub use error::{AppError, AppResult};
pub use models::{
    AdminCredentials, DatabaseSpec, ProvisioningRequest, ProvisioningResult, ProvisioningStatus,
    Step, StepOutcome, UserCredentials,
};
pub use provisioner::provision;
