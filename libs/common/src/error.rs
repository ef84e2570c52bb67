//! Custom error types for the common library
//!
//! This module defines the error taxonomy shared by every store in the
//! application. `DatabaseError` covers infrastructure failures, while
//! `ServiceError` is what the store operations return to their callers.

use sqlx::Error as SqlxError;
use sqlx::error::DatabaseError as _;
use thiserror::Error;

/// Custom error type for database operations
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Error occurred during database connection
    #[error("Database connection error: {0}")]
    Connection(#[source] SqlxError),

    /// Error occurred during database query execution
    #[error("Database query error: {0}")]
    Query(#[source] SqlxError),

    /// Error occurred during database migration
    #[error("Database migration error: {0}")]
    Migration(String),

    /// Configuration error
    #[error("Database configuration error: {0}")]
    Configuration(String),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;

/// Errors returned by store operations
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Missing or malformed field, weak password, rating out of range, unknown role
    #[error("{0}")]
    Validation(String),

    /// A referenced id does not resolve
    #[error("{0}")]
    NotFound(String),

    /// Duplicate unique value or duplicate association link
    #[error("{0}")]
    Conflict(String),

    /// Bad credentials or missing session
    #[error("Invalid username or password")]
    Authentication,

    /// Authenticated, but not allowed to touch the resource
    #[error("{0}")]
    Authorization(String),

    /// Unexpected failure outside the database
    #[error("Internal error: {0}")]
    Internal(String),

    /// Unexpected storage failure
    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ServiceError::Authorization(message.into())
    }

    /// True for errors caused by the caller rather than the server
    pub fn is_client_error(&self) -> bool {
        !matches!(self, ServiceError::Internal(_) | ServiceError::Database(_))
    }
}

impl From<SqlxError> for ServiceError {
    fn from(err: SqlxError) -> Self {
        if let SqlxError::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return ServiceError::Conflict(format!(
                    "Duplicate value rejected by the store: {}",
                    db_err.message()
                ));
            }
            if db_err.is_check_violation() {
                return ServiceError::Validation(format!(
                    "Value rejected by the store: {}",
                    db_err.message()
                ));
            }
        }
        ServiceError::Database(DatabaseError::Query(err))
    }
}

/// Type alias for Result with ServiceError
pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_not_found_is_a_server_side_error() {
        let err = ServiceError::from(SqlxError::RowNotFound);
        assert!(matches!(err, ServiceError::Database(DatabaseError::Query(_))));
        assert!(!err.is_client_error());
    }

    #[test]
    fn client_errors_are_classified() {
        assert!(ServiceError::validation("bad").is_client_error());
        assert!(ServiceError::not_found("missing").is_client_error());
        assert!(ServiceError::conflict("dup").is_client_error());
        assert!(ServiceError::Authentication.is_client_error());
        assert!(ServiceError::forbidden("no").is_client_error());
        assert!(!ServiceError::Internal("boom".into()).is_client_error());
    }

    #[test]
    fn messages_pass_through() {
        assert_eq!(
            ServiceError::not_found("Venue ID not found").to_string(),
            "Venue ID not found"
        );
        assert_eq!(
            ServiceError::Authentication.to_string(),
            "Invalid username or password"
        );
    }
}
