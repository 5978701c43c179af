//! Read path
//!
//! Resolves a ledger by hash, close time, index or "latest", hydrates
//! transaction hashes into formatted records in one multi-get, and pages
//! through the by-time and by-index lookups.

use crate::{
    codec::TransactionCodec,
    denormalize::columns as col,
    error::{Error, Result},
    keys::{KeyRange, MAX_LEDGER_INDEX},
    row::{Column, Row},
    scan::ScanPager,
    store::{Marker, Store},
    tables::Table,
    types::{Ledger, EPOCH_OFFSET},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Last ledger before partial payments always record `DeliveredAmount`
pub const DELIVERED_AMOUNT_LEDGER: u64 = 4_594_094;

/// `tfPartialPayment`
pub const PARTIAL_PAYMENT_FLAG: u64 = 0x0002_0000;

/// Delivered amount that cannot be reconstructed
pub const UNAVAILABLE: &str = "unavailable";

const SUCCESS: &str = "tesSUCCESS";
const PAYMENT: &str = "Payment";

/// Candidates fetched for an unpadded latest-ledger lookup
const LATEST_CANDIDATES: usize = 2;

const LOOKUP_COLUMNS: [Column; 4] = [
    col::LEDGER_HASH,
    col::PARENT_HASH,
    col::LEDGER_INDEX,
    col::CLOSE_TIME,
];

const TRANSACTION_COLUMNS: [Column; 6] = [
    col::EXECUTED_TIME,
    col::LEDGER_INDEX,
    col::TX_LEDGER_HASH,
    col::RAW,
    col::META,
    col::TX_INDEX,
];

/// Which ledger to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerSelector {
    /// Exact hash
    Hash(String),
    /// Newest ledger closed at or before the instant
    CloseTime(DateTime<Utc>),
    /// Exact index; two ledgers at one index is an error
    Index(u64),
    /// Newest ledger, or with `pad` the oldest of the `pad` newest
    Latest {
        /// Candidates to step back over
        pad: Option<usize>,
    },
}

impl Default for LedgerSelector {
    fn default() -> Self {
        LedgerSelector::Latest { pad: None }
    }
}

/// How hydrated transactions are rendered
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransactionFormat {
    /// Pass the stored hex blobs through undecoded
    pub binary: bool,
    /// Attach the containing ledger's hash
    pub include_ledger_hash: bool,
}

/// Ledger lookup options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerQuery {
    /// Which ledger
    pub selector: LedgerSelector,
    /// Return the transaction hash list
    pub transactions: bool,
    /// Hydrate transactions into full records
    pub expand: bool,
    /// Return the available subset instead of failing on missing transactions
    pub tolerate_missing: bool,
    /// Rendering of hydrated transactions; `binary` also implies hydration
    pub format: TransactionFormat,
}

impl LedgerQuery {
    /// Ledger with this hash
    pub fn by_hash(hash: impl Into<String>) -> Self {
        Self::with_selector(LedgerSelector::Hash(hash.into()))
    }

    /// Ledger at this index
    pub fn by_index(ledger_index: u64) -> Self {
        Self::with_selector(LedgerSelector::Index(ledger_index))
    }

    /// Ledger closed at or before `time`
    pub fn by_close_time(time: DateTime<Utc>) -> Self {
        Self::with_selector(LedgerSelector::CloseTime(time))
    }

    /// Latest ledger
    pub fn latest(pad: Option<usize>) -> Self {
        Self::with_selector(LedgerSelector::Latest { pad })
    }

    fn with_selector(selector: LedgerSelector) -> Self {
        Self {
            selector,
            ..Default::default()
        }
    }

    /// Include the hash list
    pub fn with_hashes(mut self) -> Self {
        self.transactions = true;
        self
    }

    /// Hydrate transactions
    pub fn expanded(mut self) -> Self {
        self.expand = true;
        self
    }

    /// Hydrate transactions as undecoded blobs
    pub fn binary(mut self) -> Self {
        self.format.binary = true;
        self
    }

    /// Tolerate transactions missing from the transaction table
    pub fn tolerate_missing(mut self) -> Self {
        self.tolerate_missing = true;
        self
    }
}

/// Page size, direction and resume point of a scan-backed query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageOptions {
    /// Rows per page; `None` falls back to the configured default
    pub limit: Option<usize>,
    /// Newest first
    pub descending: bool,
    /// Marker from the previous page
    pub marker: Option<Marker>,
}

/// Where a transaction query gets its hashes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionSource {
    /// Explicit hashes
    Hashes(Vec<String>),
    /// Transactions executed in `[start, end]`
    TimeRange {
        /// First second included
        start: DateTime<Utc>,
        /// Last second included
        end: DateTime<Utc>,
        /// Only this transaction type
        transaction_type: Option<String>,
        /// Only this engine result
        tx_result: Option<String>,
    },
}

/// Transaction lookup options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionQuery {
    /// Hash source
    pub source: TransactionSource,
    /// Paging, for time ranges
    pub page: PageOptions,
    /// Rendering
    pub format: TransactionFormat,
    /// Sort results by position within the ledger
    pub ledger_order: bool,
}

impl TransactionQuery {
    /// Query for explicit hashes
    pub fn hashes(hashes: Vec<String>) -> Self {
        Self::from_source(TransactionSource::Hashes(hashes))
    }

    /// Query for a time range
    pub fn time_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::from_source(TransactionSource::TimeRange {
            start,
            end,
            transaction_type: None,
            tx_result: None,
        })
    }

    fn from_source(source: TransactionSource) -> Self {
        Self {
            source,
            page: PageOptions::default(),
            format: TransactionFormat::default(),
            ledger_order: false,
        }
    }
}

/// Ledger as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerRecord {
    pub ledger_hash: String,
    pub ledger_index: u64,
    pub parent_hash: String,
    pub close_time: i64,
    pub close_time_human: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_close_time: Option<i64>,
    pub total_coins: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_time_resolution: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_flags: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transactions: Option<LedgerTransactions>,
}

impl LedgerRecord {
    /// Normalize a stored ledger
    fn from_stored(ledger: Ledger) -> Result<Self> {
        let close_time = normalize_time(ledger.close_time);
        let close_time_human = datetime(close_time)?.format("%Y-%b-%d %H:%M:%S").to_string();

        Ok(Self {
            ledger_hash: ledger.ledger_hash,
            ledger_index: ledger.ledger_index,
            parent_hash: ledger.parent_hash,
            close_time,
            close_time_human,
            parent_close_time: ledger.parent_close_time.map(normalize_time),
            total_coins: ledger.total_coins,
            account_hash: ledger.account_hash,
            transaction_hash: ledger.transaction_hash,
            close_time_resolution: ledger.close_time_resolution,
            close_flags: ledger.close_flags,
            transactions: None,
        })
    }
}

/// Transactions attached to a [`LedgerRecord`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LedgerTransactions {
    /// Hash list
    Hashes(Vec<String>),
    /// Hydrated records
    Expanded(Vec<TransactionRecord>),
}

/// Transaction as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub hash: String,
    pub ledger_index: u64,
    /// Execution time, `YYYY-MM-DDTHH:MM:SS+00:00`
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ledger_hash: Option<String>,
    /// Decoded transaction, or the hex blob in binary mode
    pub tx: Value,
    /// Decoded metadata, or the hex blob in binary mode
    pub meta: Value,
    #[serde(skip)]
    pub tx_index: u32,
}

/// One page of transactions
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionPage {
    pub rows: Vec<TransactionRecord>,
    pub marker: Option<Marker>,
}

/// Entry of the by-index or by-time ledger lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerIndexEntry {
    pub ledger_hash: String,
    pub parent_hash: String,
    pub ledger_index: u64,
    pub close_time: i64,
}

impl LedgerIndexEntry {
    fn from_row(row: &Row) -> Result<Self> {
        Ok(Self {
            ledger_hash: row.require(col::LEDGER_HASH)?.to_string(),
            parent_hash: row.require(col::PARENT_HASH)?.to_string(),
            ledger_index: row.parse(col::LEDGER_INDEX)?,
            close_time: normalize_time(row.parse(col::CLOSE_TIME)?),
        })
    }
}

/// One page of ledger lookup entries
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerIndexPage {
    pub rows: Vec<LedgerIndexEntry>,
    pub marker: Option<Marker>,
}

/// Shift a close time stored in the ledger epoch onto the Unix epoch
pub fn normalize_time(time: i64) -> i64 {
    if time < EPOCH_OFFSET {
        time + EPOCH_OFFSET
    } else {
        time
    }
}

fn datetime(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| Error::Validation(format!("time out of range: {}", secs)))
}

/// Delivered amount of a successful payment
///
/// `None` for anything that is not a successful payment. Otherwise the
/// explicit `DeliveredAmount`, else `Amount` when the payment is not
/// partial or postdates [`DELIVERED_AMOUNT_LEDGER`], else
/// [`UNAVAILABLE`].
pub fn delivered_amount(tx: &Value, meta: &Value, ledger_index: u64) -> Option<Value> {
    let is_payment = tx.get("TransactionType").and_then(Value::as_str) == Some(PAYMENT);
    let succeeded = meta.get("TransactionResult").and_then(Value::as_str) == Some(SUCCESS);
    if !is_payment || !succeeded {
        return None;
    }

    if let Some(delivered) = meta.get("DeliveredAmount").filter(|v| !v.is_null()) {
        return Some(delivered.clone());
    }

    let flags = tx.get("Flags").and_then(Value::as_u64).unwrap_or(0);
    if flags & PARTIAL_PAYMENT_FLAG == 0 || ledger_index > DELIVERED_AMOUNT_LEDGER {
        return Some(tx.get("Amount").cloned().unwrap_or(Value::Null));
    }

    Some(Value::String(UNAVAILABLE.to_string()))
}

/// Ledger and transaction reader
#[derive(Clone)]
pub struct Retriever {
    store: Arc<dyn Store>,
    codec: Arc<dyn TransactionCodec>,
    default_limit: Option<usize>,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("default_limit", &self.default_limit)
            .finish_non_exhaustive()
    }
}

impl Retriever {
    /// Create a retriever; `default_limit` caps scans that set no limit
    pub fn new(
        store: Arc<dyn Store>,
        codec: Arc<dyn TransactionCodec>,
        default_limit: Option<usize>,
    ) -> Self {
        Self {
            store,
            codec,
            default_limit,
        }
    }

    /// Fetch one ledger
    pub async fn get_ledger(&self, query: &LedgerQuery) -> Result<LedgerRecord> {
        let hash = self.resolve(&query.selector).await?;
        let stored = self.stored_ledger(&hash).await?;
        let hashes = stored.transactions.clone();
        let mut record = LedgerRecord::from_stored(stored)?;

        record.transactions = if query.expand || query.format.binary {
            let rows = self.hydrate(&hashes, query.format, false).await?;
            if rows.len() != hashes.len() && !query.tolerate_missing {
                return Err(Error::MissingTransactions {
                    found: rows.len(),
                    expected: hashes.len(),
                });
            }
            Some(LedgerTransactions::Expanded(rows))
        } else if query.transactions {
            Some(LedgerTransactions::Hashes(hashes))
        } else {
            None
        };

        Ok(record)
    }

    /// Fetch the canonical ledger row exactly as stored
    pub async fn stored_ledger(&self, hash: &str) -> Result<Ledger> {
        let row = self
            .store
            .get_row(Table::Ledgers, hash, &[])
            .await?
            .ok_or_else(|| Error::LedgerNotFound(hash.to_string()))?;

        Ok(Ledger {
            ledger_hash: row.get(col::LEDGER_HASH).unwrap_or(hash).to_string(),
            ledger_index: row.parse(col::LEDGER_INDEX)?,
            parent_hash: row.require(col::PARENT_HASH)?.to_string(),
            close_time: row.parse(col::CLOSE_TIME)?,
            parent_close_time: row.parse_opt(col::PARENT_CLOSE_TIME)?,
            total_coins: row.require(col::TOTAL_COINS)?.to_string(),
            account_hash: row.get(col::ACCOUNT_HASH).map(String::from),
            transaction_hash: row.get(col::TRANSACTION_HASH).map(String::from),
            close_time_resolution: row.parse_opt(col::CLOSE_TIME_RESOLUTION)?,
            close_flags: row.parse_opt(col::CLOSE_FLAGS)?,
            transactions: row.parse_json(col::TRANSACTIONS)?,
        })
    }

    async fn resolve(&self, selector: &LedgerSelector) -> Result<String> {
        match selector {
            LedgerSelector::Hash(hash) => Ok(hash.clone()),

            LedgerSelector::CloseTime(time) => {
                let page = PageOptions {
                    limit: Some(1),
                    descending: true,
                    marker: None,
                };
                let found = self.ledgers_by_time(datetime(0)?, *time, page).await?;
                found
                    .rows
                    .into_iter()
                    .next()
                    .map(|entry| entry.ledger_hash)
                    .ok_or_else(|| Error::LedgerNotFound(format!("closed at or before {}", time)))
            }

            LedgerSelector::Index(ledger_index) => {
                let page = PageOptions {
                    limit: Some(2),
                    descending: false,
                    marker: None,
                };
                let found = self
                    .ledgers_by_index(*ledger_index, *ledger_index, page)
                    .await?;
                if found.rows.len() > 1 {
                    return Err(Error::DuplicateLedgerIndex(*ledger_index));
                }
                found
                    .rows
                    .into_iter()
                    .next()
                    .map(|entry| entry.ledger_hash)
                    .ok_or_else(|| Error::LedgerNotFound(format!("index {}", ledger_index)))
            }

            LedgerSelector::Latest { pad } => {
                let pad = pad.filter(|p| *p > 0);
                let page = PageOptions {
                    limit: Some(pad.unwrap_or(LATEST_CANDIDATES)),
                    descending: true,
                    marker: None,
                };
                let found = self.ledgers_by_index(0, MAX_LEDGER_INDEX, page).await?;
                let candidate = if pad.is_some() {
                    found.rows.into_iter().last()
                } else {
                    found.rows.into_iter().next()
                };
                candidate
                    .map(|entry| entry.ledger_hash)
                    .ok_or_else(|| Error::LedgerNotFound("latest".to_string()))
            }
        }
    }

    /// Page through ledgers closed in `[start, end]`
    pub async fn ledgers_by_time(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        page: PageOptions,
    ) -> Result<LedgerIndexPage> {
        self.ledger_lookup(Table::LedgersByTime, KeyRange::time(&start, &end), page)
            .await
    }

    /// Page through ledgers with index in `[start, stop]`
    pub async fn ledgers_by_index(
        &self,
        start: u64,
        stop: u64,
        page: PageOptions,
    ) -> Result<LedgerIndexPage> {
        self.ledger_lookup(Table::LedgersByIndex, KeyRange::ledger_index(start, stop), page)
            .await
    }

    async fn ledger_lookup(
        &self,
        table: Table,
        range: KeyRange,
        page: PageOptions,
    ) -> Result<LedgerIndexPage> {
        let found = ScanPager::new(table, range)
            .columns(&LOOKUP_COLUMNS)
            .limit(page.limit.filter(|l| *l > 0).or(self.default_limit))
            .descending(page.descending)
            .marker(page.marker)
            .fetch(self.store.as_ref())
            .await?;

        let rows = found
            .rows
            .iter()
            .map(|keyed| LedgerIndexEntry::from_row(&keyed.row))
            .collect::<Result<Vec<_>>>()?;

        Ok(LedgerIndexPage {
            rows,
            marker: found.marker,
        })
    }

    /// Fetch one transaction
    pub async fn get_transaction(
        &self,
        hash: &str,
        format: TransactionFormat,
    ) -> Result<TransactionRecord> {
        self.hydrate(&[hash.to_string()], format, false)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::TransactionNotFound(hash.to_string()))
    }

    /// Fetch transactions by hash or by time range
    pub async fn get_transactions(&self, query: &TransactionQuery) -> Result<TransactionPage> {
        match &query.source {
            TransactionSource::Hashes(hashes) => {
                let rows = self.hydrate(hashes, query.format, query.ledger_order).await?;
                Ok(TransactionPage {
                    rows,
                    marker: query.page.marker.clone(),
                })
            }

            TransactionSource::TimeRange {
                start,
                end,
                transaction_type,
                tx_result,
            } => {
                let found = ScanPager::new(Table::TransactionsByTime, KeyRange::time(start, end))
                    .filter_eq(col::TYPE, transaction_type.as_deref())
                    .filter_eq(col::RESULT, tx_result.as_deref())
                    .columns(&[col::TX_HASH])
                    .limit(query.page.limit.filter(|l| *l > 0).or(self.default_limit))
                    .descending(query.page.descending)
                    .marker(query.page.marker.clone())
                    .fetch(self.store.as_ref())
                    .await?;

                let hashes = found
                    .rows
                    .iter()
                    .map(|keyed| keyed.row.require(col::TX_HASH).map(String::from))
                    .collect::<Result<Vec<_>>>()?;

                let rows = self.hydrate(&hashes, query.format, query.ledger_order).await?;
                Ok(TransactionPage {
                    rows,
                    marker: found.marker,
                })
            }
        }
    }

    /// Fetch and format transactions in one multi-get
    ///
    /// Missing hashes are skipped. Results follow the order of `hashes`, or
    /// ledger position with `ledger_order`. One row that fails to format
    /// fails the whole call.
    pub async fn hydrate(
        &self,
        hashes: &[String],
        format: TransactionFormat,
        ledger_order: bool,
    ) -> Result<Vec<TransactionRecord>> {
        if hashes.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self
            .store
            .get_rows(Table::Transactions, hashes, &TRANSACTION_COLUMNS)
            .await?;

        tracing::debug!(requested = hashes.len(), found = rows.len(), "Transactions hydrated");

        let mut records = rows
            .iter()
            .map(|keyed| self.format_transaction(&keyed.key, &keyed.row, format))
            .collect::<Result<Vec<_>>>()?;

        if ledger_order {
            records.sort_by_key(|record| record.tx_index);
        } else {
            let position: HashMap<&str, usize> = hashes
                .iter()
                .enumerate()
                .map(|(i, hash)| (hash.as_str(), i))
                .collect();
            records.sort_by_key(|record| position.get(record.hash.as_str()).copied());
        }

        Ok(records)
    }

    fn format_transaction(
        &self,
        hash: &str,
        row: &Row,
        format: TransactionFormat,
    ) -> Result<TransactionRecord> {
        let ledger_index: u64 = row.parse(col::LEDGER_INDEX)?;
        let date = datetime(row.parse(col::EXECUTED_TIME)?)?
            .format("%Y-%m-%dT%H:%M:%S+00:00")
            .to_string();
        let raw = row.require(col::RAW)?;
        let raw_meta = row.require(col::META)?;

        let (tx, meta) = if format.binary {
            (
                Value::String(raw.to_string()),
                Value::String(raw_meta.to_string()),
            )
        } else {
            let tx = self.codec.decode(raw)?;
            let mut meta = self.codec.decode(raw_meta)?;
            if let Some(delivered) = delivered_amount(&tx, &meta, ledger_index) {
                let Value::Object(fields) = &mut meta else {
                    return Err(Error::Validation(format!(
                        "metadata of {} is not an object",
                        hash
                    )));
                };
                fields.insert("delivered_amount".to_string(), delivered);
            }
            (tx, meta)
        };

        Ok(TransactionRecord {
            hash: hash.to_string(),
            ledger_index,
            date,
            ledger_hash: if format.include_ledger_hash {
                Some(row.require(col::TX_LEDGER_HASH)?.to_string())
            } else {
                None
            },
            tx,
            meta,
            tx_index: row.parse(col::TX_INDEX)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::JsonHexCodec;
    use crate::denormalize::ledger_tables;
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use serde_json::json;

    fn payment(flags: u64) -> Value {
        json!({"TransactionType": "Payment", "Flags": flags, "Amount": "1000"})
    }

    fn meta(result: &str) -> Value {
        json!({"TransactionResult": result, "TransactionIndex": 0})
    }

    #[test]
    fn test_delivered_amount_explicit_wins() {
        let mut m = meta("tesSUCCESS");
        m["DeliveredAmount"] = json!("250");
        let partial = payment(PARTIAL_PAYMENT_FLAG);
        assert_eq!(delivered_amount(&partial, &m, 10), Some(json!("250")));
        assert_eq!(delivered_amount(&partial, &m, 9_000_000), Some(json!("250")));
    }

    #[test]
    fn test_delivered_amount_non_partial() {
        let m = meta("tesSUCCESS");
        for index in [1, DELIVERED_AMOUNT_LEDGER, DELIVERED_AMOUNT_LEDGER + 1] {
            assert_eq!(delivered_amount(&payment(0), &m, index), Some(json!("1000")));
        }
    }

    #[test]
    fn test_delivered_amount_partial_by_ledger() {
        let m = meta("tesSUCCESS");
        let partial = payment(PARTIAL_PAYMENT_FLAG | 0x8000_0000);
        assert_eq!(
            delivered_amount(&partial, &m, DELIVERED_AMOUNT_LEDGER),
            Some(json!(UNAVAILABLE))
        );
        assert_eq!(
            delivered_amount(&partial, &m, DELIVERED_AMOUNT_LEDGER + 1),
            Some(json!("1000"))
        );
    }

    #[test]
    fn test_delivered_amount_only_for_successful_payments() {
        assert_eq!(delivered_amount(&payment(0), &meta("tecPATH_DRY"), 10), None);
        let offer = json!({"TransactionType": "OfferCreate", "Flags": 0});
        assert_eq!(delivered_amount(&offer, &meta("tesSUCCESS"), 10), None);
    }

    #[test]
    fn test_normalize_time() {
        assert_eq!(normalize_time(505_000_000), 505_000_000 + EPOCH_OFFSET);
        assert_eq!(normalize_time(1_451_606_410), 1_451_606_410);
    }

    fn ledger(hash: &str, index: u64, close_time: i64) -> Ledger {
        Ledger {
            ledger_hash: hash.into(),
            ledger_index: index,
            parent_hash: format!("P{}", hash),
            close_time,
            parent_close_time: Some(close_time - 10),
            total_coins: "100".into(),
            account_hash: None,
            transaction_hash: None,
            close_time_resolution: None,
            close_flags: None,
            transactions: vec![],
        }
    }

    async fn retriever(ledgers: &[Ledger]) -> Retriever {
        let store = MemoryStore::new();
        for ledger in ledgers {
            for (table, rows) in ledger_tables(ledger).unwrap() {
                store.put_rows(table, rows).await.unwrap();
            }
        }
        Retriever::new(Arc::new(store), Arc::new(JsonHexCodec), Some(200))
    }

    #[tokio::test]
    async fn test_record_normalization() {
        let r = retriever(&[ledger("A", 10, 505_000_000)]).await;
        let record = r.get_ledger(&LedgerQuery::by_hash("A")).await.unwrap();
        assert_eq!(record.close_time, 505_000_000 + EPOCH_OFFSET);
        assert_eq!(record.parent_close_time, Some(505_000_000 - 10 + EPOCH_OFFSET));
        assert_eq!(record.close_time_human, "2016-Jan-01 21:46:40");
        assert!(record.transactions.is_none());

        let with_hashes = r.get_ledger(&LedgerQuery::by_hash("A").with_hashes()).await.unwrap();
        assert_eq!(with_hashes.transactions, Some(LedgerTransactions::Hashes(vec![])));
    }

    #[tokio::test]
    async fn test_latest_and_padded_latest() {
        let t = 1_451_606_400;
        let r = retriever(&[ledger("A", 1, t), ledger("B", 2, t + 4), ledger("C", 3, t + 8)]).await;

        let newest = r.get_ledger(&LedgerQuery::latest(None)).await.unwrap();
        assert_eq!(newest.ledger_hash, "C");

        let padded = r.get_ledger(&LedgerQuery::latest(Some(3))).await.unwrap();
        assert_eq!(padded.ledger_hash, "A");

        let zero = r.get_ledger(&LedgerQuery::latest(Some(0))).await.unwrap();
        assert_eq!(zero.ledger_hash, "C");
    }

    #[tokio::test]
    async fn test_by_close_time_picks_nearest_before() {
        let t = 1_451_606_400;
        let r = retriever(&[ledger("A", 1, t), ledger("B", 2, t + 10)]).await;

        let at = |secs| Utc.timestamp_opt(secs, 0).unwrap();
        let found = r.get_ledger(&LedgerQuery::by_close_time(at(t + 9))).await.unwrap();
        assert_eq!(found.ledger_hash, "A");
        let found = r.get_ledger(&LedgerQuery::by_close_time(at(t + 10))).await.unwrap();
        assert_eq!(found.ledger_hash, "B");

        let err = r.get_ledger(&LedgerQuery::by_close_time(at(t - 1))).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_index_lookup_and_not_found() {
        let r = retriever(&[ledger("A", 7, 1_451_606_400)]).await;
        assert_eq!(r.get_ledger(&LedgerQuery::by_index(7)).await.unwrap().ledger_hash, "A");
        assert!(matches!(
            r.get_ledger(&LedgerQuery::by_index(8)).await,
            Err(Error::LedgerNotFound(_))
        ));
        assert!(matches!(
            r.get_ledger(&LedgerQuery::by_hash("Z")).await,
            Err(Error::LedgerNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_ledgers_by_index_pages() {
        let ledgers: Vec<_> = (1..=5).map(|i| ledger(&format!("L{}", i), i, 1_451_606_400 + i as i64)).collect();
        let r = retriever(&ledgers).await;

        let first = r
            .ledgers_by_index(2, 5, PageOptions { limit: Some(3), ..Default::default() })
            .await
            .unwrap();
        let indexes: Vec<_> = first.rows.iter().map(|e| e.ledger_index).collect();
        assert_eq!(indexes, vec![2, 3, 4]);

        let rest = r
            .ledgers_by_index(
                2,
                5,
                PageOptions { limit: Some(3), descending: false, marker: first.marker },
            )
            .await
            .unwrap();
        assert_eq!(rest.rows.len(), 1);
        assert_eq!(rest.rows[0].ledger_hash, "L5");
        assert!(rest.marker.is_none());
    }
}
