//! Error types for quarry

use thiserror::Error;
use tokio_postgres::error::SqlState;

/// Result type alias for quarry operations
pub type DbResult<T> = Result<T, DbError>;

/// Error types for database operations.
///
/// Driver failures are not translated: [`DbError::Query`] carries the
/// `tokio-postgres` error (and its server message) unchanged.
#[derive(Debug, Error)]
pub enum DbError {
    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution error
    #[error("Query error: {0}")]
    Query(#[from] tokio_postgres::Error),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// A `:name` placeholder in the SQL has no bound value
    #[error("Missing value for parameter ':{0}'")]
    MissingParameter(String),

    /// Builder misuse caught before anything reached the driver
    #[error("Validation error: {0}")]
    Validation(String),

    /// The session has no generated id to report
    #[error("No generated id is available for the last insert")]
    NoInsertId,

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Native error message from a non-Postgres driver
    #[error("{0}")]
    Driver(String),
}

impl DbError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Wrap a tokio_postgres error.
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        Self::Query(err)
    }

    /// SQLSTATE reported by the server, if this is a server-side error.
    pub fn sqlstate(&self) -> Option<&SqlState> {
        match self {
            Self::Query(err) => err.code(),
            _ => None,
        }
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        self.sqlstate() == Some(&SqlState::UNIQUE_VIOLATION)
    }

    /// Check if this is a foreign key violation error
    pub fn is_foreign_key_violation(&self) -> bool {
        self.sqlstate() == Some(&SqlState::FOREIGN_KEY_VIOLATION)
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_names_the_column() {
        let err = DbError::decode("age", "expected integer, got text");
        assert_eq!(
            err.to_string(),
            "Decode error on column 'age': expected integer, got text"
        );
    }

    #[test]
    fn non_driver_errors_have_no_sqlstate() {
        assert!(DbError::NoInsertId.sqlstate().is_none());
        assert!(!DbError::validation("x").is_unique_violation());
        assert!(DbError::validation("x").is_validation());
    }
}
