//! Error types for the table gateway

use thiserror::Error;

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Errors that can occur while talking to the table
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Opening, configuring or closing the connection failed, or no connection is open
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    /// The catalog or the table holds more matches than may exist
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// The caller passed arguments the statement builders cannot accept
    #[error("Validation error: {0}")]
    Validation(String),

    /// A statement failed to prepare, execute or commit
    #[error("Failed to execute `{statement}`: {source}")]
    Execution {
        statement: String,
        #[source]
        source: rusqlite::Error,
    },
}

impl GatewayError {
    pub(crate) fn connection(message: impl Into<String>, source: rusqlite::Error) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(source),
        }
    }

    pub(crate) fn not_connected(table_name: &str) -> Self {
        Self::Connection {
            message: format!("no open connection for table {table_name}"),
            source: None,
        }
    }

    pub(crate) fn execution(statement: &str, source: rusqlite::Error) -> Self {
        Self::Execution {
            statement: statement.to_string(),
            source,
        }
    }
}
