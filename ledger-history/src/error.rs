//! Error types for ledger history

use crate::tables::Table;
use thiserror::Error;

/// Result type for history operations
pub type Result<T> = std::result::Result<T, Error>;

/// History errors
#[derive(Error, Debug)]
pub enum Error {
    /// Ledger not found
    #[error("Ledger not found: {0}")]
    LedgerNotFound(String),

    /// Transaction not found
    #[error("Transaction not found: {0}")]
    TransactionNotFound(String),

    /// A ledger's hash list and the transaction table disagree
    #[error("missing transaction: {found} of {expected} found")]
    MissingTransactions {
        /// Rows returned by hydration
        found: usize,
        /// Hashes listed by the ledger
        expected: usize,
    },

    /// More than one ledger stored at one index
    #[error("duplicate ledger index: {0}")]
    DuplicateLedgerIndex(u64),

    /// Storage error (RocksDB or another backing store)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Some per-table batches failed; the others stay applied
    #[error(
        "{operation} incomplete: {} of {attempted} tables failed, {rows} rows applied: {cause}",
        failed.len()
    )]
    BatchIncomplete {
        /// `save` or `delete`
        operation: &'static str,
        /// Tables whose batch failed
        failed: Vec<Table>,
        /// Tables dispatched
        attempted: usize,
        /// Rows that did land in the tables that succeeded
        rows: usize,
        /// First failure message
        cause: String,
    },

    /// A stored row or a derived record could not be interpreted
    #[error("Validation error: {0}")]
    Validation(String),

    /// Row encoding error
    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Blocking task failed to complete
    #[error("Concurrency error: {0}")]
    Concurrency(String),

    /// Metrics registration error
    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True for errors signalling absent data
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::LedgerNotFound(_) | Error::TransactionNotFound(_))
    }

    /// True for errors signalling drift between tables
    pub fn is_inconsistency(&self) -> bool {
        matches!(
            self,
            Error::MissingTransactions { .. } | Error::DuplicateLedgerIndex(_)
        )
    }
}

impl From<rocksdb::Error> for Error {
    fn from(err: rocksdb::Error) -> Self {
        Error::Storage(err.to_string())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Concurrency(err.to_string())
    }
}
