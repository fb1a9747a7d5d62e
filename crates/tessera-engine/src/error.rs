//! Error types for the Tessera engine.

use thiserror::Error;

use crate::txn::TxnLevel;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur in engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Key not found in the tree.
    #[error("key not found")]
    KeyNotFound,

    /// Key already exists and overwriting was not requested.
    #[error("key already exists")]
    KeyExists,

    /// Named tree does not exist and creation was not requested.
    #[error("tree '{name}' not found")]
    TreeNotFound {
        /// The missing tree's name.
        name: String,
    },

    /// A tree was re-opened with flags that contradict its stored shape.
    #[error("tree '{name}' opened with incompatible flags")]
    IncompatibleFlags {
        /// The tree's name.
        name: String,
    },

    /// The tree handle does not name an open tree.
    #[error("invalid tree handle")]
    InvalidDbi,

    /// A mutating operation was issued by a transaction below write level.
    #[error("operation requires write level, transaction is {level}")]
    ReadOnly {
        /// The offending transaction's level.
        level: TxnLevel,
    },

    /// The transaction was aborted and can no longer be used.
    #[error("transaction was aborted")]
    TxnAborted,

    /// The tree registry is at capacity.
    #[error("too many trees: limit is {max}")]
    TooManyTrees {
        /// Configured tree limit.
        max: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::TreeNotFound {
            name: "users".into(),
        };
        assert_eq!(err.to_string(), "tree 'users' not found");

        let err = EngineError::ReadOnly {
            level: TxnLevel::Read,
        };
        assert!(err.to_string().contains("read"));
    }
}
