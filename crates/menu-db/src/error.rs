//! Storage errors.
//!
//! Constraint failures are classified so the API can answer 409 or 400
//! instead of 500. Everything else is a storage failure whose detail is only
//! logged.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A UNIQUE index rejected the write (voucher code, order number).
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A conditional write matched no row.
    ///
    /// Raised by the voucher claim when the voucher stopped qualifying, by
    /// order updates when the status moved underneath the caller, and by
    /// voucher deletes when a use landed in between. Callers re-read the row
    /// to say why.
    #[error("Condition failed for {entity} {id}")]
    ConditionFailed { entity: String, id: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// A stored row no longer maps onto a domain type.
    #[error("Corrupt {entity} row {id}: {reason}")]
    Corrupt {
        entity: String,
        id: String,
        reason: String,
    },
}

pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn condition_failed(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::ConditionFailed {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn corrupt(
        entity: impl Into<String>,
        id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        DbError::Corrupt {
            entity: entity.into(),
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// SQLite only names the column, so repositories fill in the value the
    /// caller tried to write.
    pub fn with_duplicate_value(self, field: &str, value: &str) -> Self {
        match self {
            DbError::UniqueViolation { .. } => DbError::duplicate(field, value),
            other => other,
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Row", "unknown"),
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                // "UNIQUE constraint failed: vouchers.code"
                let column = db_err
                    .message()
                    .rsplit(": ")
                    .next()
                    .unwrap_or_default()
                    .to_string();
                DbError::duplicate(column, "")
            }
            sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
                DbError::ForeignKeyViolation {
                    message: db_err.message().to_string(),
                }
            }
            sqlx::Error::Database(db_err) => DbError::QueryFailed(db_err.message().to_string()),
            sqlx::Error::PoolTimedOut => {
                DbError::ConnectionFailed("timed out waiting for a connection".to_string())
            }
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::QueryFailed(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_value_is_filled_in() {
        let err = DbError::duplicate("vouchers.code", "").with_duplicate_value("code", "SAVE10");
        assert_eq!(err.to_string(), "Duplicate code: 'SAVE10' already exists");

        let untouched = DbError::not_found("Voucher", "v1").with_duplicate_value("code", "X");
        assert!(matches!(untouched, DbError::NotFound { .. }));
    }
}
