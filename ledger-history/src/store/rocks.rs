//! RocksDB store
//!
//! One column family per [`Table`]. Rows are `bincode`-encoded [`Row`]s.
//! Canonical tables favour compression ratio, lookup tables favour read
//! latency and carry bloom filters.
//!
//! RocksDB calls are synchronous and run on the blocking pool.

use super::{collect_page, resume_key, ScanPage, ScanRequest, Store};
use crate::{
    error::{Error, Result},
    row::{Column, KeyedRow, Row},
    tables::{Table, TableRows},
    Config,
};
use async_trait::async_trait;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBCompactionStyle, Direction, IteratorMode, Options,
    WriteBatch, DB,
};
use std::sync::Arc;

/// Store backed by RocksDB
#[derive(Clone)]
pub struct RocksStore {
    db: Arc<DB>,
}

impl std::fmt::Debug for RocksStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RocksStore").field("path", &self.db.path()).finish()
    }
}

impl RocksStore {
    /// Open or create database, provisioning every table
    pub fn open(config: &Config) -> Result<Self> {
        let path = &config.data_dir;

        std::fs::create_dir_all(path)?;

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);

        db_opts.set_write_buffer_size(config.rocksdb.write_buffer_size_mb * 1024 * 1024);
        db_opts.set_max_write_buffer_number(config.rocksdb.max_write_buffer_number);
        db_opts.set_target_file_size_base(config.rocksdb.target_file_size_mb * 1024 * 1024);
        db_opts.set_max_background_jobs(config.rocksdb.max_background_jobs);
        db_opts.set_level_zero_file_num_compaction_trigger(
            config.rocksdb.level0_file_num_compaction_trigger,
        );

        // Universal compaction for write-heavy workload
        db_opts.set_compaction_style(DBCompactionStyle::Universal);

        if config.rocksdb.enable_statistics {
            db_opts.enable_statistics();
        }

        let cf_descriptors: Vec<_> = Table::ALL
            .iter()
            .map(|table| ColumnFamilyDescriptor::new(table.name(), Self::cf_options(*table)))
            .collect();

        let db = DB::open_cf_descriptors(&db_opts, path, cf_descriptors)?;

        tracing::info!(
            path = ?path,
            column_families = Table::ALL.len(),
            "Opened RocksDB"
        );

        Ok(Self { db: Arc::new(db) })
    }

    fn cf_options(table: Table) -> Options {
        match table {
            Table::Ledgers | Table::Transactions => Self::cf_options_canonical(),
            _ => Self::cf_options_lookup(),
        }
    }

    fn cf_options_canonical() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Zstd);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    fn cf_options_lookup() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        let mut block_opts = rocksdb::BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false); // 10 bits per key
        opts.set_block_based_table_factory(&block_opts);
        opts
    }

    fn cf_handle(db: &DB, table: Table) -> Result<Arc<BoundColumnFamily<'_>>> {
        db.cf_handle(table.name())
            .ok_or_else(|| Error::Storage(format!("Column family {} not found", table)))
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&DB) -> Result<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(&db)).await?
    }

    fn decode_entry(key: &[u8], value: &[u8]) -> Result<(String, Row)> {
        let key = String::from_utf8(key.to_vec())
            .map_err(|e| Error::Storage(format!("non-UTF-8 row key: {}", e)))?;
        let row: Row = bincode::deserialize(value)?;
        Ok((key, row))
    }

    /// Approximate row counts per table
    pub fn get_stats(&self) -> Result<StorageStats> {
        let mut tables = Vec::with_capacity(Table::ALL.len());
        for table in Table::ALL {
            let cf = Self::cf_handle(&self.db, table)?;
            let rows = self
                .db
                .property_int_value_cf(&cf, "rocksdb.estimate-num-keys")?
                .unwrap_or(0);
            tables.push((table, rows));
        }
        Ok(StorageStats { tables })
    }

    /// Close database (graceful shutdown)
    pub fn close(self) -> Result<()> {
        drop(self.db);
        tracing::info!("RocksDB closed gracefully");
        Ok(())
    }
}

#[async_trait]
impl Store for RocksStore {
    async fn get_row(&self, table: Table, key: &str, columns: &[Column]) -> Result<Option<Row>> {
        let key = key.to_string();
        let columns = columns.to_vec();
        self.blocking(move |db| {
            let cf = Self::cf_handle(db, table)?;
            match db.get_cf(&cf, key.as_bytes())? {
                Some(value) => {
                    let row: Row = bincode::deserialize(&value)?;
                    Ok(Some(row.project(&columns)))
                }
                None => Ok(None),
            }
        })
        .await
    }

    async fn get_rows(&self, table: Table, keys: &[String], columns: &[Column]) -> Result<Vec<KeyedRow>> {
        let keys = keys.to_vec();
        let columns = columns.to_vec();
        self.blocking(move |db| {
            let cf = Self::cf_handle(db, table)?;
            let values = db.multi_get_cf(keys.iter().map(|key| (&cf, key.as_bytes())));

            let mut rows = Vec::with_capacity(keys.len());
            for (key, value) in keys.iter().zip(values) {
                if let Some(value) = value? {
                    let row: Row = bincode::deserialize(&value)?;
                    rows.push(KeyedRow {
                        key: key.clone(),
                        row: row.project(&columns),
                    });
                }
            }
            Ok(rows)
        })
        .await
    }

    async fn put_rows(&self, table: Table, rows: TableRows) -> Result<usize> {
        self.blocking(move |db| {
            let cf = Self::cf_handle(db, table)?;
            let mut batch = WriteBatch::default();
            for (key, row) in &rows {
                let value = bincode::serialize(row)?;
                batch.put_cf(&cf, key.as_bytes(), &value);
            }
            db.write(batch)?;

            tracing::debug!(table = %table, rows = rows.len(), "Rows written");
            Ok(rows.len())
        })
        .await
    }

    async fn delete_rows(&self, table: Table, keys: Vec<String>) -> Result<()> {
        self.blocking(move |db| {
            let cf = Self::cf_handle(db, table)?;
            let mut batch = WriteBatch::default();
            for key in &keys {
                batch.delete_cf(&cf, key.as_bytes());
            }
            db.write(batch)?;

            tracing::debug!(table = %table, rows = keys.len(), "Rows deleted");
            Ok(())
        })
        .await
    }

    async fn scan(&self, request: ScanRequest) -> Result<ScanPage> {
        self.blocking(move |db| {
            let cf = Self::cf_handle(db, request.table)?;
            let resume = resume_key(&request)?;

            let (from, direction) = match (&resume, request.descending) {
                (Some(key), true) => (key.as_str(), Direction::Reverse),
                (None, true) => (request.stop.as_str(), Direction::Reverse),
                (Some(key), false) => (key.as_str(), Direction::Forward),
                (None, false) => (request.start.as_str(), Direction::Forward),
            };

            let iter = db
                .iterator_cf(&cf, IteratorMode::From(from.as_bytes(), direction))
                .map(|item| {
                    let (key, value) = item?;
                    Self::decode_entry(&key, &value)
                });

            collect_page(iter, &request)
        })
        .await
    }
}

/// Storage statistics
#[derive(Debug, Clone)]
pub struct StorageStats {
    /// Estimated rows per table
    pub tables: Vec<(Table, u64)>,
}

impl StorageStats {
    /// Estimated rows across all tables
    pub fn total_rows(&self) -> u64 {
        self.tables.iter().map(|(_, rows)| rows).sum()
    }
}
