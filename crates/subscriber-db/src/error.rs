//! Error types for the subscriber-db crate.
//!
//! Wraps `SQLx` errors and classifies the failures the reconciler needs to
//! tell apart (key conflicts, constraint violations, lost connections).

use thiserror::Error;

/// PostgreSQL SQLSTATE for `not_null_violation`.
const NOT_NULL_VIOLATION: &str = "23502";

/// Database operation errors.
///
/// # Example
///
/// ```rust
/// use subscriber_db::DbError;
///
/// fn describe(err: &DbError) -> &'static str {
///     if err.is_unique_violation() {
///         "key already exists"
///     } else if err.is_connection_error() {
///         "store unavailable"
///     } else {
///         "query failed"
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum DbError {
    /// Failed to establish or acquire a database connection.
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[source] sqlx::Error),

    /// A database query failed to execute.
    #[error("Query failed: {0}")]
    QueryFailed(#[source] sqlx::Error),

    /// An insert collided with an existing unique key.
    #[error("Unique key violation: {0}")]
    UniqueViolation(String),

    /// A not-null, foreign-key or check constraint rejected the write.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

impl DbError {
    /// Classify an error returned while executing a statement.
    ///
    /// Connection-level failures stay distinguishable from query failures so
    /// callers can tell a lost store apart from a rejected row.
    #[must_use]
    pub fn from_query(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    let constraint = db_err.constraint().unwrap_or("unknown").to_string();
                    DbError::UniqueViolation(constraint)
                } else if db_err.is_foreign_key_violation()
                    || db_err.is_check_violation()
                    || db_err.code().as_deref() == Some(NOT_NULL_VIOLATION)
                {
                    DbError::ConstraintViolation(db_err.message().to_string())
                } else {
                    DbError::QueryFailed(err)
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => DbError::ConnectionFailed(err),
            _ => DbError::QueryFailed(err),
        }
    }

    /// Check if this error indicates a connection problem.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, DbError::ConnectionFailed(_))
    }

    /// Check if this error is a unique key collision.
    #[must_use]
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, DbError::UniqueViolation(_))
    }

    /// Check if this error is a non-unique constraint violation.
    #[must_use]
    pub fn is_constraint_violation(&self) -> bool {
        matches!(self, DbError::ConstraintViolation(_))
    }
}
