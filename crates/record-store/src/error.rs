use thiserror::Error;

/// Errors that can occur when talking to the record store.
#[derive(Debug, Error)]
pub enum RecordStoreError {
    /// The store refused a write. Raised by the in-memory store's
    /// failure injection and by backends that reject a row without a
    /// more specific cause.
    #[error("store rejected {entity} {operation}")]
    Rejected {
        entity: &'static str,
        operation: &'static str,
    },

    /// A uniqueness constraint was violated.
    #[error("{entity} with {field} '{value}' already exists")]
    Conflict {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// A database error occurred.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored value could not be decoded into its typed form.
    #[error("stored {field} value '{value}' is not recognized")]
    Decode {
        field: &'static str,
        value: String,
    },
}

/// Result type for record store operations.
pub type Result<T> = std::result::Result<T, RecordStoreError>;
