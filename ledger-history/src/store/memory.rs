//! In-memory store
//!
//! Ordered per-table maps behind one lock. Batches apply per table, same as
//! the RocksDB adapter.

use super::{collect_page, resume_key, ScanPage, ScanRequest, Store};
use crate::error::Result;
use crate::row::{Column, KeyedRow, Row};
use crate::tables::{Table, TableRows};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

/// In-memory store
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<Table, BTreeMap<String, Row>>>,
}

impl MemoryStore {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Row keys of one table, in key order
    pub fn keys(&self, table: Table) -> Vec<String> {
        self.tables
            .read()
            .get(&table)
            .map(|rows| rows.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Rows in one table
    pub fn len(&self, table: Table) -> usize {
        self.tables.read().get(&table).map_or(0, BTreeMap::len)
    }

    /// Rows across all tables
    pub fn total_rows(&self) -> usize {
        self.tables.read().values().map(BTreeMap::len).sum()
    }

    /// True when no table holds a row
    pub fn is_empty(&self) -> bool {
        self.total_rows() == 0
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_row(&self, table: Table, key: &str, columns: &[Column]) -> Result<Option<Row>> {
        Ok(self
            .tables
            .read()
            .get(&table)
            .and_then(|rows| rows.get(key))
            .map(|row| row.project(columns)))
    }

    async fn get_rows(&self, table: Table, keys: &[String], columns: &[Column]) -> Result<Vec<KeyedRow>> {
        let tables = self.tables.read();
        let Some(rows) = tables.get(&table) else {
            return Ok(Vec::new());
        };

        Ok(keys
            .iter()
            .filter_map(|key| {
                rows.get(key).map(|row| KeyedRow {
                    key: key.clone(),
                    row: row.project(columns),
                })
            })
            .collect())
    }

    async fn put_rows(&self, table: Table, rows: TableRows) -> Result<usize> {
        let count = rows.len();
        self.tables.write().entry(table).or_default().extend(rows);
        Ok(count)
    }

    async fn delete_rows(&self, table: Table, keys: Vec<String>) -> Result<()> {
        if let Some(rows) = self.tables.write().get_mut(&table) {
            for key in keys {
                rows.remove(&key);
            }
        }
        Ok(())
    }

    async fn scan(&self, request: ScanRequest) -> Result<ScanPage> {
        let resume = resume_key(&request)?;
        let tables = self.tables.read();
        let Some(rows) = tables.get(&request.table) else {
            return Ok(ScanPage::default());
        };

        let entries =
            |(key, row): (&String, &Row)| -> Result<(String, Row)> { Ok((key.clone(), row.clone())) };

        if request.descending {
            let upper = match resume.as_deref() {
                Some(key) => Bound::Included(key),
                None => Bound::Excluded(request.stop.as_str()),
            };
            let iter = rows.range::<str, _>((Bound::Unbounded, upper)).rev().map(entries);
            collect_page(iter, &request)
        } else {
            let lower = resume.as_deref().unwrap_or(request.start.as_str());
            let iter = rows
                .range::<str, _>((Bound::Included(lower), Bound::Unbounded))
                .map(entries);
            collect_page(iter, &request)
        }
    }
}
