//! InfluxDB 1.x administrative adapter
//!
//! ```text
//! AdminClient (backend/mod.rs)
//!     ↓
//! InfluxDbClient (client.rs)
//!     ├── influxql.rs  statement text and log-safe rendering
//!     └── response.rs  /query body parsing and error classification
//! ```

pub mod client;
pub mod config;
pub mod influxql;
pub mod response;

pub use client::InfluxDbClient;
pub use config::{InfluxConnectionConfig, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT_SECS};
