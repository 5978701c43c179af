//! Core types for ledger history
//!
//! Canonical records as delivered by the upstream adapter, and the derived
//! records produced by the category parser. Times are seconds since the Unix
//! epoch; amounts are exact decimals.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Seconds between the Unix epoch and the ledger epoch (2000-01-01)
pub const EPOCH_OFFSET: i64 = 946_684_800;

/// Closed ledger header plus its ordered transaction hashes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    /// Ledger hash (unique id)
    pub ledger_hash: String,

    /// Monotonic ledger index
    pub ledger_index: u64,

    /// Hash of the previous ledger
    pub parent_hash: String,

    /// Close time
    pub close_time: i64,

    /// Close time of the parent ledger
    #[serde(default)]
    pub parent_close_time: Option<i64>,

    /// Total native coins in existence (drops, as a decimal string)
    pub total_coins: String,

    /// State tree hash
    #[serde(default)]
    pub account_hash: Option<String>,

    /// Transaction tree hash
    #[serde(default)]
    pub transaction_hash: Option<String>,

    /// Close time resolution (seconds)
    #[serde(default)]
    pub close_time_resolution: Option<u32>,

    /// Close flags
    #[serde(default)]
    pub close_flags: Option<u32>,

    /// Hashes of the transactions in this ledger, in ledger order
    #[serde(default)]
    pub transactions: Vec<String>,
}

/// Executed transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction hash (unique id)
    pub hash: String,

    /// Index of the containing ledger
    pub ledger_index: u64,

    /// Hash of the containing ledger
    pub ledger_hash: String,

    /// Close time of the containing ledger
    pub executed_time: i64,

    /// Position within the ledger
    pub tx_index: u32,

    /// Serialized transaction (hex)
    pub raw: String,

    /// Serialized metadata (hex)
    pub meta: String,

    /// Sending account
    pub account: String,

    /// Account sequence
    pub sequence: u64,

    /// Transaction type, e.g. `Payment`
    pub transaction_type: String,

    /// Engine result, e.g. `tesSUCCESS`
    pub tx_result: String,

    /// Client tag extracted from memos
    #[serde(default)]
    pub client: Option<String>,
}

/// Node disambiguator within one transaction
///
/// `Ledger` marks an effect that is not tied to an affected node (fees,
/// for example).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeIndex {
    /// Affected node position
    Node(u32),
    /// Ledger-level effect
    Ledger,
}

impl fmt::Display for NodeIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeIndex::Node(n) => write!(f, "{}", n),
            NodeIndex::Ledger => f.write_str("ledger"),
        }
    }
}

/// Amount of one currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyAmount {
    /// Currency code
    pub currency: String,
    /// Issuing account; `None` for the native currency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    /// Value
    pub value: Decimal,
}

/// Currency without an amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// Currency code
    pub currency: String,
    /// Issuing account; `None` for the native currency
    #[serde(default)]
    pub issuer: Option<String>,
}

/// Executed trade between two parties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub base: CurrencyAmount,
    pub counter: CurrencyAmount,
    pub rate: Decimal,
    pub buyer: String,
    pub seller: String,
    pub taker: String,
    pub provider: String,
    /// Sequence of the consumed offer
    pub sequence: u32,
    /// Bridging currency for auto-bridged trades
    #[serde(default)]
    pub autobridged: Option<Currency>,
    pub tx_hash: String,
    pub tx_type: String,
    pub time: i64,
    pub ledger_index: u64,
    pub tx_index: u32,
    pub node_index: NodeIndex,
    #[serde(default)]
    pub client: Option<String>,
}

/// Change to an order-book offer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Offer {
    pub tx_type: String,
    pub account: String,
    pub offer_sequence: u32,
    pub node_type: String,
    pub change_type: String,
    pub taker_pays: CurrencyAmount,
    #[serde(default)]
    pub pays_change: Option<Decimal>,
    pub taker_gets: CurrencyAmount,
    #[serde(default)]
    pub gets_change: Option<Decimal>,
    #[serde(default)]
    pub rate: Option<Decimal>,
    #[serde(default)]
    pub book_directory: Option<String>,
    #[serde(default)]
    pub expiration: Option<i64>,
    #[serde(default)]
    pub next_offer_sequence: Option<u32>,
    #[serde(default)]
    pub prev_offer_sequence: Option<u32>,
    pub tx_hash: String,
    pub executed_time: i64,
    pub ledger_index: u64,
    pub tx_index: u32,
    pub node_index: NodeIndex,
    #[serde(default)]
    pub client: Option<String>,
}

/// Balance change of one account in one currency
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChange {
    pub account: String,
    #[serde(default)]
    pub counterparty: Option<String>,
    pub currency: String,
    pub change: Decimal,
    pub final_balance: Decimal,
    /// Reason, e.g. `transaction_cost`, `exchange`, `payment_destination`
    pub change_type: String,
    #[serde(default)]
    pub escrow_counterparty: Option<String>,
    #[serde(default)]
    pub escrow_balance_change: Option<Decimal>,
    #[serde(default)]
    pub paychannel_counterparty: Option<String>,
    #[serde(default)]
    pub paychannel_fund_change: Option<Decimal>,
    #[serde(default)]
    pub paychannel_fund_final_balance: Option<Decimal>,
    #[serde(default)]
    pub paychannel_final_balance: Option<Decimal>,
    pub tx_hash: String,
    pub time: i64,
    pub ledger_index: u64,
    pub tx_index: u32,
    pub node_index: NodeIndex,
    #[serde(default)]
    pub client: Option<String>,
}

/// Successful payment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub source: String,
    pub destination: String,
    pub amount: Decimal,
    pub delivered_amount: Decimal,
    #[serde(default)]
    pub max_amount: Option<Decimal>,
    pub currency: String,
    #[serde(default)]
    pub issuer: Option<String>,
    #[serde(default)]
    pub source_currency: Option<String>,
    pub fee: Decimal,
    #[serde(default)]
    pub source_balance_changes: Vec<CurrencyAmount>,
    #[serde(default)]
    pub destination_balance_changes: Vec<CurrencyAmount>,
    #[serde(default)]
    pub destination_tag: Option<u32>,
    #[serde(default)]
    pub source_tag: Option<u32>,
    #[serde(default)]
    pub invoice_id: Option<String>,
    pub tx_hash: String,
    pub time: i64,
    pub ledger_index: u64,
    pub tx_index: u32,
    #[serde(default)]
    pub client: Option<String>,
}

/// Escrow create, finish or cancel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Escrow {
    pub tx_type: String,
    pub account: String,
    pub owner: String,
    pub destination: String,
    #[serde(default)]
    pub destination_tag: Option<u32>,
    #[serde(default)]
    pub source_tag: Option<u32>,
    #[serde(default)]
    pub create_tx: Option<String>,
    #[serde(default)]
    pub create_tx_seq: Option<u32>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub fulfillment: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub flags: Option<u32>,
    pub fee: Decimal,
    #[serde(default)]
    pub cancel_after: Option<i64>,
    #[serde(default)]
    pub finish_after: Option<i64>,
    pub tx_hash: String,
    pub time: i64,
    pub ledger_index: u64,
    pub tx_index: u32,
    #[serde(default)]
    pub client: Option<String>,
}

/// Payment channel create, fund or claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentChannel {
    pub channel: String,
    pub tx_type: String,
    pub account: String,
    #[serde(default)]
    pub owner: Option<String>,
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub destination_tag: Option<u32>,
    #[serde(default)]
    pub source_tag: Option<u32>,
    #[serde(default)]
    pub cancel_after: Option<i64>,
    #[serde(default)]
    pub expiration: Option<i64>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub balance: Option<Decimal>,
    #[serde(default)]
    pub settle_delay: Option<u32>,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub pubkey: Option<String>,
    #[serde(default)]
    pub flags: Option<u32>,
    pub fee: Decimal,
    pub tx_hash: String,
    pub time: i64,
    pub ledger_index: u64,
    pub tx_index: u32,
    #[serde(default)]
    pub client: Option<String>,
}

/// Account funded for the first time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountCreated {
    pub account: String,
    pub parent: String,
    pub balance: Decimal,
    pub tx_hash: String,
    pub time: i64,
    pub ledger_index: u64,
    pub tx_index: u32,
    #[serde(default)]
    pub client: Option<String>,
}

/// Memo attached to a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Memo {
    pub account: String,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub source_tag: Option<u32>,
    #[serde(default)]
    pub destination_tag: Option<u32>,
    #[serde(default)]
    pub memo_type: Option<String>,
    #[serde(default)]
    pub memo_data: Option<String>,
    #[serde(default)]
    pub memo_format: Option<String>,
    #[serde(default)]
    pub decoded_type: Option<String>,
    #[serde(default)]
    pub decoded_data: Option<String>,
    #[serde(default)]
    pub decoded_format: Option<String>,
    #[serde(default)]
    pub type_encoding: Option<String>,
    #[serde(default)]
    pub data_encoding: Option<String>,
    #[serde(default)]
    pub format_encoding: Option<String>,
    pub tx_hash: String,
    pub executed_time: i64,
    pub ledger_index: u64,
    pub tx_index: u32,
    pub memo_index: u32,
}

/// Account touched by a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AffectedAccount {
    pub account: String,
    pub tx_type: String,
    pub tx_result: String,
    pub tx_hash: String,
    pub time: i64,
    pub ledger_index: u64,
    pub tx_index: u32,
    #[serde(default)]
    pub client: Option<String>,
}

/// Parser output for one ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedLedger {
    #[serde(default)]
    pub exchanges: Vec<Exchange>,
    #[serde(default)]
    pub offers: Vec<Offer>,
    #[serde(default)]
    pub balance_changes: Vec<BalanceChange>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub escrows: Vec<Escrow>,
    #[serde(default)]
    pub payment_channels: Vec<PaymentChannel>,
    #[serde(default)]
    pub accounts_created: Vec<AccountCreated>,
    #[serde(default)]
    pub memos: Vec<Memo>,
    #[serde(default)]
    pub affected_accounts: Vec<AffectedAccount>,
    /// Transactions normalized for the canonical table
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

/// Ledger with decoded transactions, in the shape the parser consumes
///
/// `close_time` is in the ledger epoch. Each transaction is the decoded
/// transaction object with `hash` and `metaData` attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpandedLedger {
    pub ledger: Ledger,
    pub transactions: Vec<serde_json::Value>,
}
