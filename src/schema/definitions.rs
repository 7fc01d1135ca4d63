//! Provisioning document schema
//!
//! This module centralizes the shape of the provisioning document in one
//! place, as JSON Schema (draft 7) documents compiled by `jsonschema`.
//! `additionalProperties` is always `true` so newer documents keep loading.

use lazy_static::lazy_static;
use serde_json::{json, Value};

/// Current top-level key holding the database list
pub const DATABASES_KEY: &str = "databases";

/// Top-level key holding the admin credentials
pub const ADMIN_KEY: &str = "admin";

/// Key used by the first generation of provisioning documents
pub const LEGACY_DATABASES_KEY: &str = "databases_users";

/// Legacy per-database key names and their current equivalents
pub const LEGACY_DATABASE_FIELDS: [(&str, &str); 3] = [
    ("db_name", "name"),
    ("db_user", "user"),
    ("db_password", "password"),
];

lazy_static! {
    /// Standalone admin credentials file (`--influxdb-credentials`)
    pub static ref ADMIN_CREDENTIALS_SCHEMA: Value = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "required": ["user", "password"],
        "additionalProperties": true,
        "properties": {
            "user": { "type": "string" },
            "password": { "type": "string" }
        }
    });

    pub static ref PROVISIONING_SCHEMA: Value = json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "required": ["admin", "databases"],
        "additionalProperties": true,
        "properties": {
            "admin": {
                "type": "object",
                "required": ["user", "password"],
                "additionalProperties": true,
                "properties": {
                    "user": { "type": "string" },
                    "password": { "type": "string" }
                }
            },
            "databases": {
                "type": "array",
                "items": {
                    "type": "object",
                    "required": ["name"],
                    "additionalProperties": true,
                    "properties": {
                        "name": { "type": "string" },
                        "user": { "type": "string" },
                        "password": { "type": "string" }
                    }
                }
            }
        }
    });
}
