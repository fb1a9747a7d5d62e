//! Error types for the schema subsystem.

use thiserror::Error;

use tessera_engine::{EngineError, TxnLevel};

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Stable error codes for programmatic handling.
///
/// Every [`SchemaError`] maps onto one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    /// Invalid argument (name, type, index combination, transaction level).
    Einval,
    /// The named object already exists.
    Eexist,
    /// A refreshed column is absent from the current schema.
    Enoent,
    /// A capacity limit was exceeded.
    TooMany,
    /// The requested table or catalog row does not exist.
    NotFound,
    /// A persisted schema record failed validation.
    SchemaCorrupted,
    /// A name handle is newer than the transaction's schema snapshot.
    SchemaChanged,
    /// A required column is missing from a row.
    ColumnMissing,
    /// An engine error passed through unchanged.
    Engine,
}

/// Errors that can occur in schema operations.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// The identifier does not satisfy the naming grammar.
    #[error("invalid name '{name}'")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// A structurally invalid argument.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// What was wrong.
        message: &'static str,
    },

    /// The operation needs a higher transaction level.
    #[error("operation requires a {need} transaction")]
    WrongTxnLevel {
        /// The required level.
        need: TxnLevel,
    },

    /// A column with the same name was already described.
    #[error("column '{name}' already described")]
    ColumnExists {
        /// The duplicate name.
        name: String,
    },

    /// A primary key column was already described.
    #[error("primary key column already described")]
    PrimaryExists,

    /// The table already exists.
    #[error("table already exists")]
    TableExists,

    /// Too many columns in one table.
    #[error("too many columns: limit is {max}")]
    TooManyColumns {
        /// The column limit.
        max: usize,
    },

    /// Too many indexed columns in one table.
    #[error("too many indexes: limit is {max}")]
    TooManyIndexes {
        /// The index limit.
        max: usize,
    },

    /// A refreshed column does not exist in the current schema.
    #[error("column is absent from the current schema")]
    NoSuchColumn,

    /// The table or catalog row does not exist.
    #[error("table not found")]
    NotFound,

    /// A persisted schema record failed validation.
    #[error("schema record corrupted: {reason}")]
    SchemaCorrupted {
        /// Which validation failed.
        reason: &'static str,
    },

    /// The handle was refreshed against a newer schema than the
    /// transaction can see; the caller must re-initialize it.
    #[error("schema changed: handle is newer than the transaction snapshot")]
    SchemaChanged,

    /// A required (non-indexed, non-nullable) column is missing from a row.
    #[error("required column {column} missing from row")]
    ColumnMissing {
        /// Position of the missing column.
        column: usize,
    },

    /// Engine error surfaced as-is.
    #[error("engine error: {0}")]
    Engine(#[from] EngineError),
}

impl SchemaError {
    /// Returns the stable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidName { .. }
            | Self::InvalidArgument { .. }
            | Self::WrongTxnLevel { .. } => ErrorCode::Einval,
            Self::ColumnExists { .. } | Self::PrimaryExists | Self::TableExists => {
                ErrorCode::Eexist
            }
            Self::TooManyColumns { .. } | Self::TooManyIndexes { .. } => ErrorCode::TooMany,
            Self::NoSuchColumn => ErrorCode::Enoent,
            Self::NotFound => ErrorCode::NotFound,
            Self::SchemaCorrupted { .. } => ErrorCode::SchemaCorrupted,
            Self::SchemaChanged => ErrorCode::SchemaChanged,
            Self::ColumnMissing { .. } => ErrorCode::ColumnMissing,
            Self::Engine(_) => ErrorCode::Engine,
        }
    }
}
