//! Per-table batch fan-out
//!
//! A save or delete touches many tables. Each table gets one batch, and the
//! batches run concurrently with no ordering between them. When some fail,
//! the others stay applied and the call reports [`Error::BatchIncomplete`].

use crate::{
    error::{Error, Result},
    metrics::Metrics,
    store::Store,
    tables::{Table, TableRows, TableSet},
};
use futures::{stream, StreamExt};
use std::sync::Arc;
use std::time::Instant;

enum Batch {
    Put(TableRows),
    Delete(Vec<String>),
}

/// Dispatches per-table batches against a store
#[derive(Clone)]
pub(crate) struct FanOut {
    store: Arc<dyn Store>,
    metrics: Metrics,
    max_concurrent: Option<usize>,
}

impl FanOut {
    /// `max_concurrent` bounds batches in flight; `None` runs them all at once
    pub(crate) fn new(store: Arc<dyn Store>, metrics: Metrics, max_concurrent: Option<usize>) -> Self {
        Self {
            store,
            metrics,
            max_concurrent,
        }
    }

    /// Put every non-empty table, returning the rows written
    pub(crate) async fn put(&self, tables: TableSet) -> Result<usize> {
        let batches = tables
            .into_iter()
            .filter(|(_, rows)| !rows.is_empty())
            .map(|(table, rows)| (table, Batch::Put(rows)))
            .collect();
        self.run("save", batches).await
    }

    /// Delete every non-empty key list, returning the keys deleted
    pub(crate) async fn delete(&self, keys: Vec<(Table, Vec<String>)>) -> Result<usize> {
        let batches = keys
            .into_iter()
            .filter(|(_, keys)| !keys.is_empty())
            .map(|(table, keys)| (table, Batch::Delete(keys)))
            .collect();
        self.run("delete", batches).await
    }

    async fn run(&self, operation: &'static str, batches: Vec<(Table, Batch)>) -> Result<usize> {
        let start = Instant::now();
        let attempted = batches.len();
        let in_flight = self.max_concurrent.unwrap_or(attempted).max(1);

        let results: Vec<(Table, Result<usize>)> = stream::iter(batches.into_iter().map(
            |(table, batch)| {
                let store = self.store.clone();
                async move {
                    let result = match batch {
                        Batch::Put(rows) => store.put_rows(table, rows).await,
                        Batch::Delete(keys) => {
                            let count = keys.len();
                            store.delete_rows(table, keys).await.map(|()| count)
                        }
                    };
                    (table, result)
                }
            },
        ))
        .buffer_unordered(in_flight)
        .collect()
        .await;

        let mut rows = 0;
        let mut failed = Vec::new();
        let mut cause = None;
        for (table, result) in results {
            match result {
                Ok(count) => {
                    rows += count;
                    match operation {
                        "delete" => self.metrics.record_deleted(table, count),
                        _ => self.metrics.record_written(table, count),
                    }
                }
                Err(e) => {
                    tracing::error!(operation, table = %table, error = %e, "Table batch failed");
                    failed.push(table);
                    cause.get_or_insert_with(|| e.to_string());
                }
            }
        }

        self.metrics
            .record_duration(operation, start.elapsed().as_secs_f64());

        if failed.is_empty() {
            return Ok(rows);
        }

        failed.sort();
        self.metrics.record_failure(operation);
        Err(Error::BatchIncomplete {
            operation,
            failed,
            attempted,
            rows,
            cause: cause.unwrap_or_default(),
        })
    }
}
