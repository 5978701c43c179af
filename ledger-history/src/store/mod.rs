//! Store contract
//!
//! The history talks to its sorted backing store only through [`Store`].
//! Two adapters ship with the crate:
//!
//! - [`MemoryStore`]: ordered in-memory tables, for tests and embedding
//! - [`RocksStore`]: one RocksDB column family per table
//!
//! Batch puts and deletes are per table. Nothing in this contract spans
//! tables, so a caller fanning out over several tables gets no atomicity.

mod memory;
mod rocks;

pub use memory::MemoryStore;
pub use rocks::{RocksStore, StorageStats};

use crate::error::{Error, Result};
use crate::row::{Column, Filter, KeyedRow, Row};
use crate::tables::{Table, TableRows};
use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

/// Opaque continuation marker
///
/// Returned by a truncated scan and passed back verbatim to resume it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Marker(String);

impl Marker {
    pub(crate) fn at(key: &str) -> Self {
        Self(hex::encode(key))
    }

    pub(crate) fn key(&self) -> Result<String> {
        let bytes = hex::decode(&self.0)
            .map_err(|e| Error::Validation(format!("invalid marker: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| Error::Validation(format!("invalid marker: {}", e)))
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Marker {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let marker = Marker(s.to_string());
        marker.key()?;
        Ok(marker)
    }
}

/// One bounded range scan
///
/// `start` is inclusive and `stop` exclusive in key order whatever the
/// direction; a descending scan walks from `stop` down to `start`.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    /// Table scanned
    pub table: Table,
    /// Inclusive lower bound
    pub start: String,
    /// Exclusive upper bound
    pub stop: String,
    /// Equality filters, ANDed
    pub filters: Vec<Filter>,
    /// Columns returned; empty means all
    pub columns: Vec<Column>,
    /// Resume point from a previous page
    pub marker: Option<Marker>,
    /// Maximum rows returned; `None` or zero is unbounded
    pub limit: Option<usize>,
    /// Walk keys from high to low
    pub descending: bool,
}

/// One page of a scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    /// Matching rows in scan order
    pub rows: Vec<KeyedRow>,
    /// Present only when the limit truncated the scan
    pub marker: Option<Marker>,
}

/// Sorted, column-family store
#[async_trait]
pub trait Store: Send + Sync {
    /// Get one row; `columns` empty means all
    async fn get_row(&self, table: Table, key: &str, columns: &[Column]) -> Result<Option<Row>>;

    /// Get many rows; absent keys are skipped and order is not guaranteed
    async fn get_rows(&self, table: Table, keys: &[String], columns: &[Column]) -> Result<Vec<KeyedRow>>;

    /// Put rows into one table, returning the number written
    async fn put_rows(&self, table: Table, rows: TableRows) -> Result<usize>;

    /// Delete rows from one table
    async fn delete_rows(&self, table: Table, keys: Vec<String>) -> Result<()>;

    /// Run one scan and return one page
    async fn scan(&self, request: ScanRequest) -> Result<ScanPage>;
}

/// Key a marked scan resumes from (inclusive, in scan direction)
pub(crate) fn resume_key(request: &ScanRequest) -> Result<Option<String>> {
    request.marker.as_ref().map(Marker::key).transpose()
}

/// Collect one page from rows already ordered in scan direction
///
/// Rows outside `[start, stop)` are skipped, filters and projection are
/// applied, and after `limit` matches the next match becomes the marker.
pub(crate) fn collect_page<I>(rows: I, request: &ScanRequest) -> Result<ScanPage>
where
    I: IntoIterator<Item = Result<(String, Row)>>,
{
    let mut page = ScanPage::default();

    for item in rows {
        let (key, row) = item?;

        if key.as_str() < request.start.as_str() {
            if request.descending {
                break;
            }
            continue;
        }
        if key.as_str() >= request.stop.as_str() {
            if request.descending {
                continue;
            }
            break;
        }
        if !row.matches(&request.filters) {
            continue;
        }

        if let Some(limit) = request.limit.filter(|limit| *limit > 0) {
            if page.rows.len() >= limit {
                page.marker = Some(Marker::at(&key));
                break;
            }
        }

        page.rows.push(KeyedRow {
            key,
            row: row.project(&request.columns),
        });
    }

    Ok(page)
}
