//! Shared fixtures for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use ledger_history::{
    row::{Column, KeyedRow, Row},
    store::{ScanPage, ScanRequest},
    tables::TableRows,
    types::{
        AccountCreated, AffectedAccount, BalanceChange, CurrencyAmount, Escrow, Exchange, Memo,
        Offer, Payment, PaymentChannel, EPOCH_OFFSET,
    },
    Config, Error, ExpandedLedger, JsonHexCodec, Ledger, LedgerHistory, LedgerParser, MemoryStore,
    NodeIndex, ParsedLedger, Result, Store, Table, Transaction,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::str::FromStr;
use std::sync::Arc;

/// 2016-01-01 00:00:10 UTC
pub const CLOSE: i64 = 1_451_606_410;

/// Deterministic stand-in for the category parser
///
/// Emits the normalized transactions, one affected-account row per party,
/// the fee as a ledger-level balance change, successful payments, and one
/// memo per `Memos` entry. Offers yield an exchange against the maker plus
/// the maker's offer change; escrows, channels and `CreatedAccount`
/// metadata yield their own records.
#[derive(Debug, Default)]
pub struct FixtureParser;

fn field<'a>(value: &'a Value, name: &str) -> Result<&'a Value> {
    value
        .get(name)
        .ok_or_else(|| Error::Validation(format!("missing {}", name)))
}

fn text(value: &Value, name: &str) -> Result<String> {
    field(value, name)?
        .as_str()
        .map(String::from)
        .ok_or_else(|| Error::Validation(format!("{} is not a string", name)))
}

fn number(value: &Value, name: &str) -> Result<u64> {
    field(value, name)?
        .as_u64()
        .ok_or_else(|| Error::Validation(format!("{} is not a number", name)))
}

fn decimal(value: &Value, name: &str) -> Result<Decimal> {
    Decimal::from_str(&text(value, name)?).map_err(|e| Error::Validation(e.to_string()))
}

fn xrp(value: Decimal) -> CurrencyAmount {
    CurrencyAmount {
        currency: "XRP".into(),
        issuer: None,
        value,
    }
}

fn usd(value: Decimal) -> CurrencyAmount {
    CurrencyAmount {
        currency: "USD".into(),
        issuer: Some("rIssuer".into()),
        value,
    }
}

impl LedgerParser for FixtureParser {
    fn parse_ledger(&self, expanded: &ExpandedLedger) -> Result<ParsedLedger> {
        let ledger = &expanded.ledger;
        let time = ledger.close_time + EPOCH_OFFSET;
        let mut parsed = ParsedLedger::default();

        for tx in &expanded.transactions {
            let meta = field(tx, "metaData")?;
            let hash = text(tx, "hash")?;
            let account = text(tx, "Account")?;
            let tx_type = text(tx, "TransactionType")?;
            let tx_result = text(meta, "TransactionResult")?;
            let tx_index = number(meta, "TransactionIndex")? as u32;
            let destination = tx.get("Destination").and_then(Value::as_str).map(String::from);

            let mut body = tx.clone();
            if let Value::Object(fields) = &mut body {
                fields.remove("hash");
                fields.remove("metaData");
            }

            parsed.transactions.push(Transaction {
                hash: hash.clone(),
                ledger_index: ledger.ledger_index,
                ledger_hash: ledger.ledger_hash.clone(),
                executed_time: time,
                tx_index,
                raw: JsonHexCodec::encode(&body)?,
                meta: JsonHexCodec::encode(meta)?,
                account: account.clone(),
                sequence: number(tx, "Sequence")?,
                transaction_type: tx_type.clone(),
                tx_result: tx_result.clone(),
                client: None,
            });

            for party in std::iter::once(&account).chain(destination.as_ref()) {
                parsed.affected_accounts.push(AffectedAccount {
                    account: party.clone(),
                    tx_type: tx_type.clone(),
                    tx_result: tx_result.clone(),
                    tx_hash: hash.clone(),
                    time,
                    ledger_index: ledger.ledger_index,
                    tx_index,
                    client: None,
                });
            }

            let fee = decimal(tx, "Fee")? / Decimal::from(1_000_000);
            parsed.balance_changes.push(BalanceChange {
                account: account.clone(),
                counterparty: None,
                currency: "XRP".into(),
                change: -fee,
                final_balance: Decimal::ZERO,
                change_type: "transaction_cost".into(),
                escrow_counterparty: None,
                escrow_balance_change: None,
                paychannel_counterparty: None,
                paychannel_fund_change: None,
                paychannel_fund_final_balance: None,
                paychannel_final_balance: None,
                tx_hash: hash.clone(),
                time,
                ledger_index: ledger.ledger_index,
                tx_index,
                node_index: NodeIndex::Ledger,
                client: None,
            });

            if tx_type == "Payment" && tx_result == "tesSUCCESS" {
                let amount = decimal(tx, "Amount")?;
                let delivered = match meta.get("DeliveredAmount") {
                    Some(_) => decimal(meta, "DeliveredAmount")?,
                    None => amount,
                };
                parsed.payments.push(Payment {
                    source: account.clone(),
                    destination: destination.clone().unwrap_or_default(),
                    amount,
                    delivered_amount: delivered,
                    max_amount: None,
                    currency: "XRP".into(),
                    issuer: None,
                    source_currency: None,
                    fee,
                    source_balance_changes: vec![],
                    destination_balance_changes: vec![],
                    destination_tag: tx.get("DestinationTag").and_then(Value::as_u64).map(|t| t as u32),
                    source_tag: None,
                    invoice_id: None,
                    tx_hash: hash.clone(),
                    time,
                    ledger_index: ledger.ledger_index,
                    tx_index,
                    client: None,
                });
            }

            if tx_type == "OfferCreate" {
                let maker = text(tx, "Maker")?;
                let maker_sequence = number(tx, "MakerSequence")? as u32;
                let pays = decimal(tx, "TakerPays")?;
                let gets = decimal(tx, "TakerGets")?;

                parsed.exchanges.push(Exchange {
                    base: xrp(gets),
                    counter: usd(pays),
                    rate: pays.checked_div(gets).unwrap_or_default(),
                    buyer: account.clone(),
                    seller: maker.clone(),
                    taker: account.clone(),
                    provider: maker.clone(),
                    sequence: maker_sequence,
                    autobridged: None,
                    tx_hash: hash.clone(),
                    tx_type: tx_type.clone(),
                    time,
                    ledger_index: ledger.ledger_index,
                    tx_index,
                    node_index: NodeIndex::Node(0),
                    client: None,
                });
                parsed.offers.push(Offer {
                    tx_type: tx_type.clone(),
                    account: maker,
                    offer_sequence: maker_sequence,
                    node_type: "ModifiedNode".into(),
                    change_type: "partially_filled".into(),
                    taker_pays: usd(pays),
                    pays_change: Some(-pays),
                    taker_gets: xrp(gets),
                    gets_change: Some(-gets),
                    rate: None,
                    book_directory: None,
                    expiration: None,
                    next_offer_sequence: None,
                    prev_offer_sequence: None,
                    tx_hash: hash.clone(),
                    executed_time: time,
                    ledger_index: ledger.ledger_index,
                    tx_index,
                    node_index: NodeIndex::Node(1),
                    client: None,
                });
            }

            if tx_type == "EscrowCreate" {
                parsed.escrows.push(Escrow {
                    tx_type: tx_type.clone(),
                    account: account.clone(),
                    owner: account.clone(),
                    destination: destination.clone().unwrap_or_default(),
                    destination_tag: None,
                    source_tag: None,
                    create_tx: None,
                    create_tx_seq: None,
                    condition: None,
                    fulfillment: None,
                    amount: Some(decimal(tx, "Amount")?),
                    flags: None,
                    fee,
                    cancel_after: None,
                    finish_after: tx.get("FinishAfter").and_then(Value::as_i64),
                    tx_hash: hash.clone(),
                    time,
                    ledger_index: ledger.ledger_index,
                    tx_index,
                    client: None,
                });
            }

            if tx_type == "PaymentChannelCreate" {
                parsed.payment_channels.push(PaymentChannel {
                    channel: hash.clone(),
                    tx_type: tx_type.clone(),
                    account: account.clone(),
                    owner: None,
                    source: account.clone(),
                    destination: destination.clone().unwrap_or_default(),
                    destination_tag: None,
                    source_tag: None,
                    cancel_after: None,
                    expiration: None,
                    amount: Some(decimal(tx, "Amount")?),
                    balance: Some(Decimal::ZERO),
                    settle_delay: tx.get("SettleDelay").and_then(Value::as_u64).map(|d| d as u32),
                    signature: None,
                    pubkey: None,
                    flags: None,
                    fee,
                    tx_hash: hash.clone(),
                    time,
                    ledger_index: ledger.ledger_index,
                    tx_index,
                    client: None,
                });
            }

            if let Some(created) = meta.get("CreatedAccount").and_then(Value::as_str) {
                parsed.accounts_created.push(AccountCreated {
                    account: created.to_string(),
                    parent: account.clone(),
                    balance: decimal(tx, "Amount")?,
                    tx_hash: hash.clone(),
                    time,
                    ledger_index: ledger.ledger_index,
                    tx_index,
                    client: None,
                });
            }

            let memos = tx.get("Memos").and_then(Value::as_array).cloned().unwrap_or_default();
            for (memo_index, memo) in memos.iter().enumerate() {
                parsed.memos.push(Memo {
                    account: account.clone(),
                    destination: destination.clone(),
                    source_tag: None,
                    destination_tag: None,
                    memo_type: None,
                    memo_data: memo["Memo"]["MemoData"].as_str().map(String::from),
                    memo_format: None,
                    decoded_type: None,
                    decoded_data: None,
                    decoded_format: None,
                    type_encoding: None,
                    data_encoding: None,
                    format_encoding: None,
                    tx_hash: hash.clone(),
                    executed_time: time,
                    ledger_index: ledger.ledger_index,
                    tx_index,
                    memo_index: memo_index as u32,
                });
            }
        }

        Ok(parsed)
    }
}

/// One ledger as the importer sees it
#[derive(Debug, Clone)]
pub struct Fixture {
    pub ledger: Ledger,
    pub parsed: ParsedLedger,
}

pub fn tx_hash(ledger_hash: &str, tx_index: u32) -> String {
    format!("{}-TX{:03}", ledger_hash, tx_index)
}

/// Successful XRP payment
pub fn payment(ledger_hash: &str, tx_index: u32, flags: u64) -> Value {
    json!({
        "TransactionType": "Payment",
        "Account": "rSender",
        "Destination": "rReceiver",
        "Amount": "1000",
        "Fee": "12",
        "Flags": flags,
        "hash": tx_hash(ledger_hash, tx_index),
        "metaData": {"TransactionIndex": tx_index, "TransactionResult": "tesSUCCESS"}
    })
}

/// Offer crossing rMaker's offer 5, with one memo
pub fn offer(ledger_hash: &str, tx_index: u32) -> Value {
    json!({
        "TransactionType": "OfferCreate",
        "Account": "rTrader",
        "Maker": "rMaker",
        "MakerSequence": 5,
        "TakerPays": "5",
        "TakerGets": "100",
        "Fee": "10",
        "Flags": 0,
        "Memos": [{"Memo": {"MemoData": "6869"}}],
        "hash": tx_hash(ledger_hash, tx_index),
        "metaData": {"TransactionIndex": tx_index, "TransactionResult": "tesSUCCESS"}
    })
}

/// Escrow of 50 XRP to rEscrowDest
pub fn escrow(ledger_hash: &str, tx_index: u32) -> Value {
    json!({
        "TransactionType": "EscrowCreate",
        "Account": "rOwner",
        "Destination": "rEscrowDest",
        "Amount": "50",
        "FinishAfter": 600_000_000,
        "Fee": "12",
        "Flags": 0,
        "hash": tx_hash(ledger_hash, tx_index),
        "metaData": {"TransactionIndex": tx_index, "TransactionResult": "tesSUCCESS"}
    })
}

/// Payment channel from rChannelSource to rChannelDest
pub fn channel(ledger_hash: &str, tx_index: u32) -> Value {
    json!({
        "TransactionType": "PaymentChannelCreate",
        "Account": "rChannelSource",
        "Destination": "rChannelDest",
        "Amount": "10",
        "SettleDelay": 3600,
        "Fee": "12",
        "Flags": 0,
        "hash": tx_hash(ledger_hash, tx_index),
        "metaData": {"TransactionIndex": tx_index, "TransactionResult": "tesSUCCESS"}
    })
}

/// Payment that funds `account` for the first time
pub fn funding(ledger_hash: &str, tx_index: u32, account: &str) -> Value {
    let mut tx = payment(ledger_hash, tx_index, 0);
    tx["Destination"] = json!(account);
    tx["metaData"]["CreatedAccount"] = json!(account);
    tx
}

/// One transaction of every kind the parser derives records from
pub fn every_kind(ledger_hash: &str) -> Vec<Value> {
    vec![
        payment(ledger_hash, 0, 0),
        offer(ledger_hash, 1),
        escrow(ledger_hash, 2),
        channel(ledger_hash, 3),
        funding(ledger_hash, 4, &format!("rNew{}", ledger_hash)),
    ]
}

/// Build a ledger closing at `close_time` (Unix seconds) holding `txs`
///
/// Account sequences are assigned from the ledger index so ledgers never
/// share an account-sequence key.
pub fn fixture(hash: &str, ledger_index: u64, close_time: i64, mut txs: Vec<Value>) -> Fixture {
    for tx in &mut txs {
        let tx_index = tx["metaData"]["TransactionIndex"].as_u64().unwrap_or_default();
        tx["Sequence"] = json!(ledger_index * 1000 + tx_index);
    }

    let ledger = Ledger {
        ledger_hash: hash.to_string(),
        ledger_index,
        parent_hash: format!("{}-parent", hash),
        close_time,
        parent_close_time: Some(close_time - 10 - EPOCH_OFFSET),
        total_coins: "99999999999999999".into(),
        account_hash: Some(format!("{}-state", hash)),
        transaction_hash: Some(format!("{}-txset", hash)),
        close_time_resolution: Some(10),
        close_flags: Some(0),
        transactions: txs
            .iter()
            .map(|tx| tx["hash"].as_str().unwrap_or_default().to_string())
            .collect(),
    };

    let mut shifted = ledger.clone();
    shifted.close_time -= EPOCH_OFFSET;
    let expanded = ExpandedLedger {
        ledger: shifted,
        transactions: txs,
    };
    let parsed = FixtureParser.parse_ledger(&expanded).unwrap();

    Fixture { ledger, parsed }
}

/// Save everything the importer would
pub async fn import(history: &LedgerHistory, fixture: &Fixture) {
    history.save_ledger(&fixture.ledger).await.unwrap();
    history.save_transactions(&fixture.parsed.transactions).await.unwrap();
    history.save_parsed_data(&fixture.parsed).await.unwrap();
}

pub fn history_on(store: Arc<dyn Store>) -> LedgerHistory {
    LedgerHistory::new(store, Arc::new(JsonHexCodec), Arc::new(FixtureParser), Config::default())
        .unwrap()
}

pub fn memory_history() -> (Arc<MemoryStore>, LedgerHistory) {
    let store = Arc::new(MemoryStore::new());
    let history = history_on(store.clone());
    (store, history)
}

/// Memory store whose puts fail for one table
#[derive(Debug)]
pub struct FailingStore {
    pub inner: MemoryStore,
    pub fail: Table,
}

#[async_trait]
impl Store for FailingStore {
    async fn get_row(&self, table: Table, key: &str, columns: &[Column]) -> Result<Option<Row>> {
        self.inner.get_row(table, key, columns).await
    }

    async fn get_rows(&self, table: Table, keys: &[String], columns: &[Column]) -> Result<Vec<KeyedRow>> {
        self.inner.get_rows(table, keys, columns).await
    }

    async fn put_rows(&self, table: Table, rows: TableRows) -> Result<usize> {
        if table == self.fail {
            return Err(Error::Storage(format!("{} unavailable", table)));
        }
        self.inner.put_rows(table, rows).await
    }

    async fn delete_rows(&self, table: Table, keys: Vec<String>) -> Result<()> {
        self.inner.delete_rows(table, keys).await
    }

    async fn scan(&self, request: ScanRequest) -> Result<ScanPage> {
        self.inner.scan(request).await
    }
}
