//! Table catalogue
//!
//! Every physical table the history writes, plus [`TableSet`], the
//! table → row-key → row map produced by denormalization.

use crate::row::Row;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Physical table in the backing store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    /// Canonical ledger rows, keyed by hash
    Ledgers,
    /// `index|hash` lookup
    LedgersByIndex,
    /// `time|index` lookup
    LedgersByTime,
    /// Canonical transaction rows, keyed by hash
    Transactions,
    /// `time|ledger|tx` lookup
    TransactionsByTime,
    /// `account|sequence` lookup
    AccountTransactions,
    /// Exchanges keyed by currency pair
    Exchanges,
    /// Exchanges keyed by buyer and by seller
    AccountExchanges,
    /// Offer changes keyed by account
    AccountOffers,
    /// Offer lookup by account and offer sequence
    AccountOffersBySequence,
    /// Balance changes keyed by account
    BalanceChanges,
    /// Payments keyed by time
    Payments,
    /// Payments keyed by currency
    PaymentsByCurrency,
    /// Payments keyed by source and by destination
    AccountPayments,
    /// Escrows keyed by time
    Escrows,
    /// Escrows keyed by owner and by destination
    AccountEscrows,
    /// Payment channels keyed by time
    PaymentChannels,
    /// Payment channels keyed by source and by destination
    AccountPaymentChannels,
    /// Account creations keyed by time
    AccountsCreated,
    /// Memos keyed by time
    Memos,
    /// Memo lookup keyed by sender and by destination
    AccountMemos,
    /// Transactions keyed by every affected account
    AffectedAccountTransactions,
}

impl Table {
    /// Every table, in catalogue order
    pub const ALL: [Table; 22] = [
        Table::Ledgers,
        Table::LedgersByIndex,
        Table::LedgersByTime,
        Table::Transactions,
        Table::TransactionsByTime,
        Table::AccountTransactions,
        Table::Exchanges,
        Table::AccountExchanges,
        Table::AccountOffers,
        Table::AccountOffersBySequence,
        Table::BalanceChanges,
        Table::Payments,
        Table::PaymentsByCurrency,
        Table::AccountPayments,
        Table::Escrows,
        Table::AccountEscrows,
        Table::PaymentChannels,
        Table::AccountPaymentChannels,
        Table::AccountsCreated,
        Table::Memos,
        Table::AccountMemos,
        Table::AffectedAccountTransactions,
    ];

    /// Tables written by `derived_tables`
    pub const DERIVED: [Table; 16] = [
        Table::Exchanges,
        Table::AccountExchanges,
        Table::AccountOffers,
        Table::AccountOffersBySequence,
        Table::BalanceChanges,
        Table::Payments,
        Table::PaymentsByCurrency,
        Table::AccountPayments,
        Table::Escrows,
        Table::AccountEscrows,
        Table::PaymentChannels,
        Table::AccountPaymentChannels,
        Table::AccountsCreated,
        Table::Memos,
        Table::AccountMemos,
        Table::AffectedAccountTransactions,
    ];

    /// Store-level table name
    pub fn name(&self) -> &'static str {
        match self {
            Table::Ledgers => "ledgers",
            Table::LedgersByIndex => "lu_ledgers_by_index",
            Table::LedgersByTime => "lu_ledgers_by_time",
            Table::Transactions => "transactions",
            Table::TransactionsByTime => "lu_transactions_by_time",
            Table::AccountTransactions => "lu_account_transactions",
            Table::Exchanges => "exchanges",
            Table::AccountExchanges => "account_exchanges",
            Table::AccountOffers => "account_offers",
            Table::AccountOffersBySequence => "lu_account_offers_by_sequence",
            Table::BalanceChanges => "balance_changes",
            Table::Payments => "payments",
            Table::PaymentsByCurrency => "payments_by_currency",
            Table::AccountPayments => "account_payments",
            Table::Escrows => "escrows",
            Table::AccountEscrows => "account_escrows",
            Table::PaymentChannels => "payment_channels",
            Table::AccountPaymentChannels => "account_payment_channels",
            Table::AccountsCreated => "accounts_created",
            Table::Memos => "memos",
            Table::AccountMemos => "lu_account_memos",
            Table::AffectedAccountTransactions => "lu_affected_account_transactions",
        }
    }

    /// Parse a store-level table name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.name() == name)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rows of one table, ordered by row key
pub type TableRows = BTreeMap<String, Row>;

/// Table → row key → row
///
/// Ordered maps keep two derivations of the same input byte-identical.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableSet {
    tables: BTreeMap<Table, TableRows>,
}

impl TableSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a table so it is listed even when it ends up empty
    pub fn declare(&mut self, table: Table) -> &mut TableRows {
        self.tables.entry(table).or_default()
    }

    /// Insert a row, replacing any row already under that key
    pub fn insert(&mut self, table: Table, key: String, row: Row) {
        self.declare(table).insert(key, row);
    }

    /// Rows of one table
    pub fn rows(&self, table: Table) -> Option<&TableRows> {
        self.tables.get(&table)
    }

    /// Row keys of one table
    pub fn keys(&self, table: Table) -> Vec<String> {
        self.tables
            .get(&table)
            .map(|rows| rows.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Declared tables
    pub fn tables(&self) -> impl Iterator<Item = Table> + '_ {
        self.tables.keys().copied()
    }

    /// Total rows across all tables
    pub fn row_count(&self) -> usize {
        self.tables.values().map(|rows| rows.len()).sum()
    }

    /// Keep only the listed tables
    pub fn retain(&mut self, keep: &[Table]) {
        self.tables.retain(|table, _| keep.contains(table));
    }

    /// Fold another set into this one
    pub fn merge(&mut self, other: TableSet) {
        for (table, rows) in other.tables {
            self.declare(table).extend(rows);
        }
    }

    /// Table → key list, as consumed by batch deletes
    pub fn key_sets(&self) -> Vec<(Table, Vec<String>)> {
        self.tables
            .iter()
            .map(|(table, rows)| (*table, rows.keys().cloned().collect()))
            .collect()
    }
}

impl IntoIterator for TableSet {
    type Item = (Table, TableRows);
    type IntoIter = std::collections::btree_map::IntoIter<Table, TableRows>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.into_iter()
    }
}
