pub mod definitions;
pub mod normalization;
pub mod semantic;
pub mod validation;

pub use definitions::{ADMIN_CREDENTIALS_SCHEMA, PROVISIONING_SCHEMA};
pub use normalization::normalize_legacy_layout;
pub use semantic::validate_document;
pub use validation::{validate_against_schema, SchemaViolation};
