//! Ledger history service
//!
//! Ties the denormalizer, the read path and the delete path to one store.
//!
//! # Example
//!
//! ```no_run
//! use ledger_history::{Config, JsonHexCodec, LedgerHistory, LedgerParser, LedgerQuery};
//! use std::sync::Arc;
//!
//! # async fn run(parser: Arc<dyn LedgerParser>) -> ledger_history::Result<()> {
//! let history = LedgerHistory::open(Config::default(), Arc::new(JsonHexCodec), parser)?;
//!
//! let latest = history.get_ledger(&LedgerQuery::latest(Some(2))).await?;
//! println!("{} closed {}", latest.ledger_index, latest.close_time_human);
//! # Ok(())
//! # }
//! ```

use crate::{
    batch::FanOut,
    codec::{LedgerParser, TransactionCodec},
    delete::Deleter,
    denormalize::{derived_tables, ledger_tables, transaction_tables},
    metrics::Metrics,
    retrieve::{
        LedgerIndexPage, LedgerQuery, LedgerRecord, PageOptions, Retriever, TransactionFormat,
        TransactionPage, TransactionQuery, TransactionRecord,
    },
    store::{RocksStore, Store},
    tables::{Table, TableSet},
    types::{Ledger, ParsedLedger, Transaction},
    Config, Result,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Ledger history over one store
///
/// Cheap to clone; clones share the store and metrics.
#[derive(Clone)]
pub struct LedgerHistory {
    retriever: Retriever,
    deleter: Deleter,
    fan_out: FanOut,
    metrics: Metrics,
    config: Arc<Config>,
}

impl std::fmt::Debug for LedgerHistory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LedgerHistory")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl LedgerHistory {
    /// History over an existing store
    pub fn new(
        store: Arc<dyn Store>,
        codec: Arc<dyn TransactionCodec>,
        parser: Arc<dyn LedgerParser>,
        config: Config,
    ) -> Result<Self> {
        let metrics = Metrics::new()?;
        let fan_out = FanOut::new(
            store.clone(),
            metrics.clone(),
            config.writes.max_concurrent_tables,
        );
        let retriever = Retriever::new(store, codec, config.reads.default_scan_limit);
        let deleter = Deleter::new(retriever.clone(), parser, fan_out.clone());

        Ok(Self {
            retriever,
            deleter,
            fan_out,
            metrics,
            config: Arc::new(config),
        })
    }

    /// Open RocksDB under `config.data_dir` and build a history on it
    pub fn open(
        config: Config,
        codec: Arc<dyn TransactionCodec>,
        parser: Arc<dyn LedgerParser>,
    ) -> Result<Self> {
        let store = RocksStore::open(&config)?;
        Self::new(Arc::new(store), codec, parser, config)
    }

    /// Metrics of this history
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Save a ledger's canonical row and its two lookups
    pub async fn save_ledger(&self, ledger: &Ledger) -> Result<usize> {
        let rows = self.fan_out.put(ledger_tables(ledger)?).await?;

        tracing::info!(
            ledger_hash = %ledger.ledger_hash,
            ledger_index = ledger.ledger_index,
            rows,
            "Ledger saved"
        );
        Ok(rows)
    }

    /// Save one transaction
    pub async fn save_transaction(&self, transaction: &Transaction) -> Result<usize> {
        self.save_transactions(std::slice::from_ref(transaction)).await
    }

    /// Save transactions and their lookups
    pub async fn save_transactions(&self, transactions: &[Transaction]) -> Result<usize> {
        let rows = self.fan_out.put(transaction_tables(transactions)?).await?;

        tracing::info!(transactions = transactions.len(), rows, "Transactions saved");
        Ok(rows)
    }

    /// Save every derived table of a parsed ledger
    pub async fn save_parsed_data(&self, parsed: &ParsedLedger) -> Result<usize> {
        self.save_derived(derived_tables(parsed)?).await
    }

    /// Save only the listed derived tables of a parsed ledger
    pub async fn save_parsed_tables(&self, parsed: &ParsedLedger, tables: &[Table]) -> Result<usize> {
        let mut derived = derived_tables(parsed)?;
        derived.retain(tables);
        self.save_derived(derived).await
    }

    async fn save_derived(&self, tables: TableSet) -> Result<usize> {
        let rows = self.fan_out.put(tables).await?;

        tracing::info!(rows, "Parsed data saved");
        Ok(rows)
    }

    /// Fetch one ledger
    pub async fn get_ledger(&self, query: &LedgerQuery) -> Result<LedgerRecord> {
        self.retriever.get_ledger(query).await
    }

    /// Fetch one transaction
    pub async fn get_transaction(
        &self,
        hash: &str,
        format: TransactionFormat,
    ) -> Result<TransactionRecord> {
        self.retriever.get_transaction(hash, format).await
    }

    /// Fetch a page of transactions
    pub async fn get_transactions(&self, query: &TransactionQuery) -> Result<TransactionPage> {
        self.retriever.get_transactions(query).await
    }

    /// Page through ledgers closed in `[start, end]`
    pub async fn ledgers_by_time(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page: PageOptions,
    ) -> Result<LedgerIndexPage> {
        self.retriever.ledgers_by_time(start, end, page).await
    }

    /// Page through ledgers with index in `[start, stop]`
    pub async fn ledgers_by_index(
        &self,
        start: u64,
        stop: u64,
        page: PageOptions,
    ) -> Result<LedgerIndexPage> {
        self.retriever.ledgers_by_index(start, stop, page).await
    }

    /// Remove a ledger and every row derived from it
    pub async fn remove_ledger(&self, hash: &str) -> Result<usize> {
        self.deleter.remove_ledger(hash).await
    }
}
