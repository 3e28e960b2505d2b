use thiserror::Error;

/// Result type for data-layer operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Data-layer errors.
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// Database connection or query error.
    #[error("Database error: {0}")]
    Database(String),

    /// No row matched a single-record lookup.
    #[error("Record not found in table '{table}'")]
    NotFound { table: &'static str },

    /// A multi-statement write failed to begin or commit.
    #[error("Transaction error: {0}")]
    Transaction(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl StoreError {
    /// Query error mapper that turns `RowNotFound` into `NotFound` for the
    /// given table.
    pub fn on_table(table: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
        move |err| match err {
            sqlx::Error::RowNotFound => StoreError::NotFound { table },
            other => StoreError::Database(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = StoreError::on_table("agents")(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::NotFound { table: "agents" }));
        assert_eq!(err.to_string(), "Record not found in table 'agents'");
    }

    #[test]
    fn test_other_errors_map_to_database() {
        let err = StoreError::on_table("agents")(sqlx::Error::PoolTimedOut);
        assert!(matches!(err, StoreError::Database(_)));
    }
}
