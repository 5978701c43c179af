//! Ledger removal
//!
//! Nothing records which rows a ledger produced. Removal rebuilds the input
//! the write path saw, runs it through the parser and the denormalizer
//! again, and deletes the keys that come out.

use crate::{
    batch::FanOut,
    codec::LedgerParser,
    denormalize::{derived_tables, ledger_tables, transaction_tables},
    error::{Error, Result},
    retrieve::{normalize_time, Retriever, TransactionFormat, TransactionRecord},
    tables::TableSet,
    types::{ExpandedLedger, Ledger, EPOCH_OFFSET},
};
use serde_json::Value;
use std::sync::Arc;

/// Removes a ledger and every row derived from it
#[derive(Clone)]
pub struct Deleter {
    retriever: Retriever,
    parser: Arc<dyn LedgerParser>,
    fan_out: FanOut,
}

impl std::fmt::Debug for Deleter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deleter").finish_non_exhaustive()
    }
}

impl Deleter {
    pub(crate) fn new(retriever: Retriever, parser: Arc<dyn LedgerParser>, fan_out: FanOut) -> Self {
        Self {
            retriever,
            parser,
            fan_out,
        }
    }

    /// Recompute every row a stored ledger produced
    ///
    /// Transactions missing from the transaction table are tolerated so a
    /// half-written ledger can still be removed.
    pub async fn ledger_rows(&self, hash: &str) -> Result<TableSet> {
        let stored = self.retriever.stored_ledger(hash).await?;
        let records = self
            .retriever
            .hydrate(&stored.transactions, TransactionFormat::default(), false)
            .await?;

        if records.len() != stored.transactions.len() {
            tracing::warn!(
                ledger_hash = hash,
                found = records.len(),
                expected = stored.transactions.len(),
                "Removing ledger with missing transactions"
            );
        }

        let expanded = expand(&stored, records)?;
        let parsed = self.parser.parse_ledger(&expanded)?;

        let mut tables = ledger_tables(&stored)?;
        tables.merge(transaction_tables(&parsed.transactions)?);
        tables.merge(derived_tables(&parsed)?);
        Ok(tables)
    }

    /// Delete a ledger, returning the number of keys deleted
    pub async fn remove_ledger(&self, hash: &str) -> Result<usize> {
        let tables = self.ledger_rows(hash).await?;
        let removed = self.fan_out.delete(tables.key_sets()).await?;

        tracing::info!(ledger_hash = hash, rows = removed, "Ledger removed");
        Ok(removed)
    }
}

/// Rebuild the parser's view of a stored ledger
///
/// Close time goes back to the ledger epoch, and each transaction carries
/// its metadata under `metaData` and its hash under `hash`.
fn expand(stored: &Ledger, records: Vec<TransactionRecord>) -> Result<ExpandedLedger> {
    let mut ledger = stored.clone();
    ledger.close_time = normalize_time(stored.close_time) - EPOCH_OFFSET;

    let transactions = records
        .into_iter()
        .map(|record| {
            let Value::Object(mut tx) = record.tx else {
                return Err(Error::Validation(format!(
                    "transaction {} is not an object",
                    record.hash
                )));
            };
            tx.insert("metaData".to_string(), record.meta);
            tx.insert("hash".to_string(), Value::String(record.hash));
            Ok(Value::Object(tx))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ExpandedLedger {
        ledger,
        transactions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored(close_time: i64) -> Ledger {
        Ledger {
            ledger_hash: "LH".into(),
            ledger_index: 9,
            parent_hash: "PH".into(),
            close_time,
            parent_close_time: None,
            total_coins: "1".into(),
            account_hash: None,
            transaction_hash: None,
            close_time_resolution: None,
            close_flags: None,
            transactions: vec!["A".into()],
        }
    }

    fn record(tx: Value) -> TransactionRecord {
        TransactionRecord {
            hash: "A".into(),
            ledger_index: 9,
            date: "2016-01-01T00:00:10+00:00".into(),
            ledger_hash: None,
            tx,
            meta: json!({"TransactionIndex": 0}),
            tx_index: 0,
        }
    }

    #[test]
    fn test_expand_shifts_close_time_to_ledger_epoch() {
        let unix = stored(1_451_606_410);
        let expanded = expand(&unix, vec![record(json!({"Account": "rA"}))]).unwrap();
        assert_eq!(expanded.ledger.close_time, 1_451_606_410 - EPOCH_OFFSET);

        let already_shifted = stored(504_921_610);
        let expanded = expand(&already_shifted, vec![]).unwrap();
        assert_eq!(expanded.ledger.close_time, 504_921_610);
    }

    #[test]
    fn test_expand_attaches_meta_and_hash() {
        let expanded = expand(&stored(1_451_606_410), vec![record(json!({"Account": "rA"}))]).unwrap();
        let tx = &expanded.transactions[0];
        assert_eq!(tx["hash"], json!("A"));
        assert_eq!(tx["metaData"]["TransactionIndex"], json!(0));
        assert_eq!(tx["Account"], json!("rA"));
    }

    #[test]
    fn test_expand_rejects_binary_records() {
        assert!(expand(&stored(1_451_606_410), vec![record(json!("00AB"))]).is_err());
    }
}
