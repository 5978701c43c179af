//! Ledger History
//!
//! Denormalized storage of closed ledgers, their transactions and the
//! records derived from them, in a sorted column-family store.
//!
//! # Architecture
//!
//! - **Fan-out writes**: one logical save becomes one batch per table
//! - **Sortable keys**: zero-padded composite keys, so byte order is time order
//! - **Recomputed deletes**: removal re-derives the keys a save produced
//! - **Paged scans**: one page per call, resumed with an opaque marker
//!
//! # Invariants
//!
//! - Derivation is deterministic: same input, same keys
//! - Secondary rows are copies of one record and are written and removed together
//! - No cross-table atomicity: a failed save leaves the tables that succeeded

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, missing_debug_implementations, clippy::all)]

mod batch;
pub mod codec;
pub mod config;
pub mod delete;
pub mod denormalize;
pub mod error;
pub mod history;
pub mod keys;
pub mod metrics;
pub mod retrieve;
pub mod row;
pub mod scan;
pub mod store;
pub mod tables;
pub mod types;

// Re-exports
pub use codec::{JsonHexCodec, LedgerParser, TransactionCodec};
pub use config::Config;
pub use error::{Error, Result};
pub use history::LedgerHistory;
pub use retrieve::{
    LedgerIndexEntry, LedgerIndexPage, LedgerQuery, LedgerRecord, LedgerSelector,
    LedgerTransactions, PageOptions, TransactionFormat, TransactionPage, TransactionQuery,
    TransactionRecord, TransactionSource,
};
pub use row::{Column, Filter, KeyedRow, Row};
pub use store::{Marker, MemoryStore, RocksStore, ScanPage, ScanRequest, Store};
pub use tables::{Table, TableSet};
pub use types::{ExpandedLedger, Ledger, NodeIndex, ParsedLedger, Transaction};
