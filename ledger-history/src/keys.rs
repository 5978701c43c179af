//! Row key scheme
//!
//! Composite keys are `|`-separated segments. Numbers are zero-padded to a
//! fixed width per field so byte order equals numeric order, and times are
//! rendered as `YYYYMMDDHHMMSS` in UTC. Time-ordered keys break ties with
//! ledger index, then tx index, then node index.
//!
//! ```text
//! lu_ledgers_by_index   000000012345|<hash>
//! lu_ledgers_by_time    20160101000010|000000012345
//! balance_changes       <account>|20160101000010|000000012345|00003|00001
//! exchanges             <base>|<base issuer>|<counter>|<counter issuer>|<suffix>
//! ```

use crate::error::{Error, Result};
use crate::types::NodeIndex;
use chrono::{DateTime, Utc};

/// Ledger index width
pub const LI_PAD: usize = 12;

/// Tx, node and memo index width
pub const I_PAD: usize = 5;

/// Account sequence width
pub const S_PAD: usize = 12;

/// Segment separator
pub const SEP: char = '|';

/// Node index token for ledger-level records; sorts after any digit
pub const LEDGER_NODE: &str = "~";

/// Appended to an inclusive upper bound; sorts after `SEP` and digits
pub const STOP_SUFFIX: &str = "~";

/// Highest index the lookup scans consider
pub const MAX_LEDGER_INDEX: u64 = 999_999_999_999;

/// Zero-pad `n` to `width` digits
pub fn pad(n: u64, width: usize) -> String {
    format!("{:0width$}", n, width = width)
}

/// Sortable time segment
pub fn format_time(secs: i64) -> Result<String> {
    let time = DateTime::<Utc>::from_timestamp(secs, 0)
        .ok_or_else(|| Error::Validation(format!("time out of range: {}", secs)))?;
    Ok(format_datetime(&time))
}

/// Sortable time segment of a date
pub fn format_datetime(time: &DateTime<Utc>) -> String {
    time.format("%Y%m%d%H%M%S").to_string()
}

/// Node index segment
pub fn node_segment(node: NodeIndex) -> String {
    match node {
        NodeIndex::Node(n) => pad(u64::from(n), I_PAD),
        NodeIndex::Ledger => LEDGER_NODE.to_string(),
    }
}

/// Join segments with [`SEP`]
pub fn join<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut key = String::new();
    for (i, segment) in segments.into_iter().enumerate() {
        if i > 0 {
            key.push(SEP);
        }
        key.push_str(segment.as_ref());
    }
    key
}

/// `time|ledger_index|tx_index`
pub fn time_key(time: i64, ledger_index: u64, tx_index: u32) -> Result<String> {
    Ok(join([
        format_time(time)?,
        pad(ledger_index, LI_PAD),
        pad(u64::from(tx_index), I_PAD),
    ]))
}

/// `time|ledger_index|tx_index|node`
pub fn node_time_key(time: i64, ledger_index: u64, tx_index: u32, node: NodeIndex) -> Result<String> {
    Ok(join([time_key(time, ledger_index, tx_index)?, node_segment(node)]))
}

/// `time|ledger_index|tx_index|memo_index`
pub fn memo_key(time: i64, ledger_index: u64, tx_index: u32, memo_index: u32) -> Result<String> {
    Ok(join([
        time_key(time, ledger_index, tx_index)?,
        pad(u64::from(memo_index), I_PAD),
    ]))
}

/// `partition|suffix`
pub fn partitioned(partition: &str, suffix: &str) -> String {
    join([partition, suffix])
}

/// `currency|issuer`, empty issuer for the native currency
pub fn currency_segment(currency: &str, issuer: Option<&str>) -> String {
    join([currency, issuer.unwrap_or("")])
}

/// `ledger_index|hash`
pub fn ledger_index_key(ledger_index: u64, hash: &str) -> String {
    join([pad(ledger_index, LI_PAD).as_str(), hash])
}

/// `close_time|ledger_index`
pub fn ledger_time_key(close_time: i64, ledger_index: u64) -> Result<String> {
    Ok(join([format_time(close_time)?, pad(ledger_index, LI_PAD)]))
}

/// `account|sequence`
pub fn account_sequence_key(account: &str, sequence: u64) -> String {
    join([account, pad(sequence, S_PAD).as_str()])
}

/// `account|offer_sequence|ledger_index|tx_index|node`
///
/// Every ledger touching an offer gets its own row under the offer's prefix.
pub fn offer_sequence_key(
    account: &str,
    offer_sequence: u64,
    ledger_index: u64,
    tx_index: u32,
    node: NodeIndex,
) -> String {
    join([
        account_sequence_key(account, offer_sequence),
        pad(ledger_index, LI_PAD),
        pad(u64::from(tx_index), I_PAD),
        node_segment(node),
    ])
}

/// Half-open `[start, stop)` scan bounds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRange {
    /// Inclusive lower bound
    pub start: String,
    /// Exclusive upper bound
    pub stop: String,
}

impl KeyRange {
    /// Range covering every key
    pub fn all() -> Self {
        Self {
            start: String::new(),
            stop: STOP_SUFFIX.repeat(2),
        }
    }

    /// Keys whose time segment lies in `[start, end]`
    pub fn time(start: &DateTime<Utc>, end: &DateTime<Utc>) -> Self {
        Self {
            start: format_datetime(start),
            stop: format!("{}{}", format_datetime(end), STOP_SUFFIX),
        }
    }

    /// Keys whose leading ledger index lies in `[start, stop]`
    pub fn ledger_index(start: u64, stop: u64) -> Self {
        Self {
            start: pad(start, LI_PAD),
            stop: format!("{}{}", pad(stop, LI_PAD), STOP_SUFFIX),
        }
    }

    /// Keys within one partition whose time segment lies in `[start, end]`
    pub fn partition_time(partition: &str, start: &DateTime<Utc>, end: &DateTime<Utc>) -> Self {
        let range = Self::time(start, end);
        Self {
            start: partitioned(partition, &range.start),
            stop: partitioned(partition, &range.stop),
        }
    }

    /// True when `key` falls inside the range
    pub fn contains(&self, key: &str) -> bool {
        key >= self.start.as_str() && key < self.stop.as_str()
    }
}
