//! Single-table SQLite gateway.
//!
//! # Intention
//!
//! - Own one connection per table type, with explicit open/close lifecycle.
//! - Turn ordered column/value maps into parameterized INSERT, UPDATE, DELETE
//!   and SELECT statements.
//! - Let concrete tables expose typed entry points through [`DataTable`].
//!
//! # Architectural Boundaries
//!
//! - Only SQLite/database code belongs here.
//! - Table schemas and business logic live with the callers.

pub mod config;
pub mod error;
pub mod gateway;
pub mod sqlite;
pub mod statement;

pub use config::{GatewayConfig, TableSpec};
pub use error::{GatewayError, Result};
pub use gateway::{DataTable, TableGateway};
pub use sqlite::{FieldMap, Row, RowSet, Selection, Value};
