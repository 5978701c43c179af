//! Write fan-out
//!
//! Turns one ledger, a batch of transactions, or one ledger's parsed records
//! into per-table row maps. Everything here is pure: the same input always
//! yields the same [`TableSet`], which is what lets deletion recompute the
//! keys a write produced.
//!
//! Secondary rows (an exchange under buyer and seller, a payment under
//! source and destination, ...) are clones of one row under different keys.

use crate::{
    error::Result,
    keys,
    row::Row,
    tables::{Table, TableSet},
    types::{
        AccountCreated, AffectedAccount, BalanceChange, Escrow, Exchange, Ledger, Memo, Offer,
        ParsedLedger, Payment, PaymentChannel, Transaction,
    },
};

/// Columns read back by retrieval
pub mod columns {
    use crate::row::Column;

    pub const LEDGER_HASH: Column = Column::payload("ledger_hash");
    pub const LEDGER_INDEX: Column = Column::indexed("ledger_index");
    pub const PARENT_HASH: Column = Column::payload("parent_hash");
    pub const CLOSE_TIME: Column = Column::indexed("close_time");
    pub const PARENT_CLOSE_TIME: Column = Column::payload("parent_close_time");
    pub const TOTAL_COINS: Column = Column::payload("total_coins");
    pub const ACCOUNT_HASH: Column = Column::payload("account_hash");
    pub const TRANSACTION_HASH: Column = Column::payload("transaction_hash");
    pub const CLOSE_TIME_RESOLUTION: Column = Column::payload("close_time_resolution");
    pub const CLOSE_FLAGS: Column = Column::payload("close_flags");
    pub const TRANSACTIONS: Column = Column::payload("transactions");

    pub const TX_HASH: Column = Column::payload("tx_hash");
    pub const TX_INDEX: Column = Column::payload("tx_index");
    pub const RAW: Column = Column::payload("raw");
    pub const META: Column = Column::payload("meta");
    pub const SEQUENCE: Column = Column::payload("sequence");
    pub const EXECUTED_TIME: Column = Column::indexed("executed_time");
    pub const TX_LEDGER_HASH: Column = Column::indexed("ledger_hash");
    pub const ACCOUNT: Column = Column::indexed("account");
    pub const ACCOUNT_SEQUENCE: Column = Column::indexed("sequence");
    pub const TRANSACTION_TYPE: Column = Column::indexed("transaction_type");
    pub const TX_RESULT: Column = Column::indexed("tx_result");
    pub const CLIENT: Column = Column::indexed("client");
    pub const TYPE: Column = Column::indexed("type");
    pub const RESULT: Column = Column::indexed("result");
}

use columns as col;

/// Canonical ledger row plus the index and time lookups
pub fn ledger_tables(ledger: &Ledger) -> Result<TableSet> {
    let mut tables = TableSet::new();

    let canonical = Row::new()
        .with(col::LEDGER_HASH, &ledger.ledger_hash)
        .with(col::LEDGER_INDEX, ledger.ledger_index)
        .with(col::PARENT_HASH, &ledger.parent_hash)
        .with(col::CLOSE_TIME, ledger.close_time)
        .with_opt(col::PARENT_CLOSE_TIME, ledger.parent_close_time)
        .with(col::TOTAL_COINS, &ledger.total_coins)
        .with_opt(col::ACCOUNT_HASH, ledger.account_hash.as_ref())
        .with_opt(col::TRANSACTION_HASH, ledger.transaction_hash.as_ref())
        .with_opt(col::CLOSE_TIME_RESOLUTION, ledger.close_time_resolution)
        .with_opt(col::CLOSE_FLAGS, ledger.close_flags)
        .payload_json(col::TRANSACTIONS.qualifier, &ledger.transactions)?;

    let lookup = Row::new()
        .with(col::LEDGER_HASH, &ledger.ledger_hash)
        .with(col::PARENT_HASH, &ledger.parent_hash)
        .with(col::LEDGER_INDEX, ledger.ledger_index)
        .with(col::CLOSE_TIME, ledger.close_time);

    tables.insert(Table::Ledgers, ledger.ledger_hash.clone(), canonical);
    tables.insert(
        Table::LedgersByIndex,
        keys::ledger_index_key(ledger.ledger_index, &ledger.ledger_hash),
        lookup.clone(),
    );
    tables.insert(
        Table::LedgersByTime,
        keys::ledger_time_key(ledger.close_time, ledger.ledger_index)?,
        lookup,
    );

    Ok(tables)
}

/// Canonical transaction rows plus the time and account-sequence lookups
///
/// Descriptive attributes land in the indexed family; the serialized
/// transaction and metadata stay opaque payload.
pub fn transaction_tables(transactions: &[Transaction]) -> Result<TableSet> {
    let mut tables = TableSet::new();
    tables.declare(Table::Transactions);
    tables.declare(Table::TransactionsByTime);
    tables.declare(Table::AccountTransactions);

    for tx in transactions {
        let by_time = Row::new()
            .with(col::TX_HASH, &tx.hash)
            .with(col::TX_INDEX, tx.tx_index)
            .with(col::EXECUTED_TIME, tx.executed_time)
            .with(col::LEDGER_INDEX, tx.ledger_index)
            .with(col::TYPE, &tx.transaction_type)
            .with(col::RESULT, &tx.tx_result);
        tables.insert(
            Table::TransactionsByTime,
            keys::time_key(tx.executed_time, tx.ledger_index, tx.tx_index)?,
            by_time,
        );

        let by_sequence = Row::new()
            .with(col::TX_HASH, &tx.hash)
            .with(col::SEQUENCE, tx.sequence)
            .with(col::EXECUTED_TIME, tx.executed_time)
            .with(col::LEDGER_INDEX, tx.ledger_index)
            .with(col::TYPE, &tx.transaction_type)
            .with(col::RESULT, &tx.tx_result);
        tables.insert(
            Table::AccountTransactions,
            keys::account_sequence_key(&tx.account, tx.sequence),
            by_sequence,
        );

        let canonical = Row::new()
            .with(col::ACCOUNT, &tx.account)
            .with(col::ACCOUNT_SEQUENCE, tx.sequence)
            .with(col::TX_RESULT, &tx.tx_result)
            .with(col::TRANSACTION_TYPE, &tx.transaction_type)
            .with(col::EXECUTED_TIME, tx.executed_time)
            .with(col::LEDGER_INDEX, tx.ledger_index)
            .with(col::TX_LEDGER_HASH, &tx.ledger_hash)
            .with_opt(col::CLIENT, tx.client.as_ref())
            .with(col::RAW, &tx.raw)
            .with(col::META, &tx.meta)
            .with(col::TX_INDEX, tx.tx_index);
        tables.insert(Table::Transactions, tx.hash.clone(), canonical);
    }

    Ok(tables)
}

/// Rows for every derived category of one parsed ledger
pub fn derived_tables(parsed: &ParsedLedger) -> Result<TableSet> {
    let mut tables = TableSet::new();
    for table in Table::DERIVED {
        tables.declare(table);
    }

    for ex in &parsed.exchanges {
        add_exchange(&mut tables, ex)?;
    }
    for offer in &parsed.offers {
        add_offer(&mut tables, offer)?;
    }
    for change in &parsed.balance_changes {
        add_balance_change(&mut tables, change)?;
    }
    for payment in &parsed.payments {
        add_payment(&mut tables, payment)?;
    }
    for escrow in &parsed.escrows {
        add_escrow(&mut tables, escrow)?;
    }
    for channel in &parsed.payment_channels {
        add_payment_channel(&mut tables, channel)?;
    }
    for created in &parsed.accounts_created {
        add_account_created(&mut tables, created)?;
    }
    for memo in &parsed.memos {
        add_memo(&mut tables, memo)?;
    }
    for affected in &parsed.affected_accounts {
        add_affected_account(&mut tables, affected)?;
    }

    Ok(tables)
}

/// Columns every derived row carries to point back at its transaction
fn linked(row: Row, tx_hash: &str, time: i64, ledger_index: u64, tx_index: u32) -> Row {
    row.index("tx_hash", tx_hash)
        .index("executed_time", time)
        .index("ledger_index", ledger_index)
        .payload("tx_index", tx_index)
}

fn add_exchange(tables: &mut TableSet, ex: &Exchange) -> Result<()> {
    let suffix = keys::node_time_key(ex.time, ex.ledger_index, ex.tx_index, ex.node_index)?;
    let pair = keys::join([
        keys::currency_segment(&ex.base.currency, ex.base.issuer.as_deref()),
        keys::currency_segment(&ex.counter.currency, ex.counter.issuer.as_deref()),
    ]);

    let row = Row::new()
        .index("base_currency", &ex.base.currency)
        .index_opt("base_issuer", ex.base.issuer.as_ref())
        .payload("base_amount", ex.base.value)
        .index("counter_currency", &ex.counter.currency)
        .index_opt("counter_issuer", ex.counter.issuer.as_ref())
        .payload("counter_amount", ex.counter.value)
        .payload("rate", ex.rate)
        .index("buyer", &ex.buyer)
        .index("seller", &ex.seller)
        .index("taker", &ex.taker)
        .index("provider", &ex.provider)
        .index("offer_sequence", ex.sequence)
        .index("tx_type", &ex.tx_type)
        .index_opt("client", ex.client.as_ref())
        .index_opt("autobridged_currency", ex.autobridged.as_ref().map(|c| &c.currency))
        .index_opt(
            "autobridged_issuer",
            ex.autobridged.as_ref().and_then(|c| c.issuer.as_ref()),
        )
        .payload("node_index", ex.node_index);
    let row = linked(row, &ex.tx_hash, ex.time, ex.ledger_index, ex.tx_index);

    tables.insert(Table::Exchanges, keys::partitioned(&pair, &suffix), row.clone());
    tables.insert(Table::AccountExchanges, keys::partitioned(&ex.buyer, &suffix), row.clone());
    tables.insert(Table::AccountExchanges, keys::partitioned(&ex.seller, &suffix), row);
    Ok(())
}

fn add_offer(tables: &mut TableSet, o: &Offer) -> Result<()> {
    let suffix = keys::node_time_key(o.executed_time, o.ledger_index, o.tx_index, o.node_index)?;

    let row = Row::new()
        .index("tx_type", &o.tx_type)
        .index("account", &o.account)
        .index("offer_sequence", o.offer_sequence)
        .index("node_type", &o.node_type)
        .index("change_type", &o.change_type)
        .index("pays_currency", &o.taker_pays.currency)
        .index_opt("pays_issuer", o.taker_pays.issuer.as_ref())
        .payload("pays_amount", o.taker_pays.value)
        .payload_opt("pays_change", o.pays_change)
        .index("gets_currency", &o.taker_gets.currency)
        .index_opt("gets_issuer", o.taker_gets.issuer.as_ref())
        .payload("gets_amount", o.taker_gets.value)
        .payload_opt("gets_change", o.gets_change)
        .payload_opt("rate", o.rate)
        .index_opt("book_directory", o.book_directory.as_ref())
        .index_opt("expiration", o.expiration)
        .index_opt("next_offer_sequence", o.next_offer_sequence)
        .index_opt("prev_offer_sequence", o.prev_offer_sequence)
        .index_opt("client", o.client.as_ref())
        .payload("node_index", o.node_index);
    let row = linked(row, &o.tx_hash, o.executed_time, o.ledger_index, o.tx_index);
    tables.insert(Table::AccountOffers, keys::partitioned(&o.account, &suffix), row);

    let lookup = Row::new()
        .index("account", &o.account)
        .index("sequence", o.offer_sequence)
        .index("type", &o.node_type)
        .index("change_type", &o.change_type)
        .payload("node_index", o.node_index);
    let lookup = linked(lookup, &o.tx_hash, o.executed_time, o.ledger_index, o.tx_index);
    tables.insert(
        Table::AccountOffersBySequence,
        keys::offer_sequence_key(
            &o.account,
            u64::from(o.offer_sequence),
            o.ledger_index,
            o.tx_index,
            o.node_index,
        ),
        lookup,
    );
    Ok(())
}

fn add_balance_change(tables: &mut TableSet, c: &BalanceChange) -> Result<()> {
    let suffix = keys::node_time_key(c.time, c.ledger_index, c.tx_index, c.node_index)?;

    let row = Row::new()
        .index("account", &c.account)
        .index_opt("counterparty", c.counterparty.as_ref())
        .index("currency", &c.currency)
        .payload("amount_change", c.change)
        .payload("final_balance", c.final_balance)
        .index("change_type", &c.change_type)
        .index_opt("client", c.client.as_ref())
        .index_opt("escrow_counterparty", c.escrow_counterparty.as_ref())
        .payload_opt("escrow_balance_change", c.escrow_balance_change)
        .index_opt("paychannel_counterparty", c.paychannel_counterparty.as_ref())
        .payload_opt("paychannel_fund_change", c.paychannel_fund_change)
        .payload_opt("paychannel_fund_final_balance", c.paychannel_fund_final_balance)
        .payload_opt("paychannel_final_balance", c.paychannel_final_balance)
        .payload("node_index", c.node_index);
    let row = linked(row, &c.tx_hash, c.time, c.ledger_index, c.tx_index);

    tables.insert(Table::BalanceChanges, keys::partitioned(&c.account, &suffix), row);
    Ok(())
}

fn add_payment(tables: &mut TableSet, p: &Payment) -> Result<()> {
    let key = keys::time_key(p.time, p.ledger_index, p.tx_index)?;
    let currency = keys::currency_segment(&p.currency, p.issuer.as_deref());

    let row = Row::new()
        .index("source", &p.source)
        .index("destination", &p.destination)
        .payload("amount", p.amount)
        .payload("delivered_amount", p.delivered_amount)
        .payload_opt("max_amount", p.max_amount)
        .index("currency", &p.currency)
        .index_opt("issuer", p.issuer.as_ref())
        .index_opt("source_currency", p.source_currency.as_ref())
        .payload("fee", p.fee)
        .payload_json("source_balance_changes", &p.source_balance_changes)?
        .payload_json("destination_balance_changes", &p.destination_balance_changes)?
        .index_opt("destination_tag", p.destination_tag)
        .index_opt("source_tag", p.source_tag)
        .index_opt("invoice_id", p.invoice_id.as_ref())
        .index_opt("client", p.client.as_ref());
    let row = linked(row, &p.tx_hash, p.time, p.ledger_index, p.tx_index);

    tables.insert(Table::PaymentsByCurrency, keys::partitioned(&currency, &key), row.clone());
    tables.insert(Table::AccountPayments, keys::partitioned(&p.source, &key), row.clone());
    tables.insert(Table::AccountPayments, keys::partitioned(&p.destination, &key), row.clone());
    tables.insert(Table::Payments, key, row);
    Ok(())
}

fn add_escrow(tables: &mut TableSet, e: &Escrow) -> Result<()> {
    let key = keys::time_key(e.time, e.ledger_index, e.tx_index)?;

    let row = Row::new()
        .index("tx_type", &e.tx_type)
        .index("account", &e.account)
        .index("owner", &e.owner)
        .index("destination", &e.destination)
        .index_opt("destination_tag", e.destination_tag)
        .index_opt("source_tag", e.source_tag)
        .payload_opt("create_tx", e.create_tx.as_ref())
        .payload_opt("create_tx_seq", e.create_tx_seq)
        .payload_opt("condition", e.condition.as_ref())
        .payload_opt("fulfillment", e.fulfillment.as_ref())
        .payload_opt("amount", e.amount)
        .payload_opt("flags", e.flags)
        .payload("fee", e.fee)
        .index_opt("cancel_after", e.cancel_after)
        .index_opt("finish_after", e.finish_after)
        .index_opt("client", e.client.as_ref());
    let row = linked(row, &e.tx_hash, e.time, e.ledger_index, e.tx_index);

    tables.insert(Table::AccountEscrows, keys::partitioned(&e.owner, &key), row.clone());
    tables.insert(Table::AccountEscrows, keys::partitioned(&e.destination, &key), row.clone());
    tables.insert(Table::Escrows, key, row);
    Ok(())
}

fn add_payment_channel(tables: &mut TableSet, c: &PaymentChannel) -> Result<()> {
    let key = keys::time_key(c.time, c.ledger_index, c.tx_index)?;

    let row = Row::new()
        .index("channel", &c.channel)
        .index("tx_type", &c.tx_type)
        .index("account", &c.account)
        .index_opt("owner", c.owner.as_ref())
        .index("source", &c.source)
        .index("destination", &c.destination)
        .index_opt("destination_tag", c.destination_tag)
        .index_opt("source_tag", c.source_tag)
        .index_opt("cancel_after", c.cancel_after)
        .index_opt("expiration", c.expiration)
        .payload_opt("amount", c.amount)
        .payload_opt("balance", c.balance)
        .payload_opt("settle_delay", c.settle_delay)
        .payload_opt("signature", c.signature.as_ref())
        .payload_opt("pubkey", c.pubkey.as_ref())
        .payload_opt("flags", c.flags)
        .payload("fee", c.fee)
        .index_opt("client", c.client.as_ref());
    let row = linked(row, &c.tx_hash, c.time, c.ledger_index, c.tx_index);

    tables.insert(Table::AccountPaymentChannels, keys::partitioned(&c.source, &key), row.clone());
    tables.insert(
        Table::AccountPaymentChannels,
        keys::partitioned(&c.destination, &key),
        row.clone(),
    );
    tables.insert(Table::PaymentChannels, key, row);
    Ok(())
}

fn add_account_created(tables: &mut TableSet, a: &AccountCreated) -> Result<()> {
    let key = keys::time_key(a.time, a.ledger_index, a.tx_index)?;

    let row = Row::new()
        .index("account", &a.account)
        .index("parent", &a.parent)
        .payload("balance", a.balance)
        .index_opt("client", a.client.as_ref());
    let row = linked(row, &a.tx_hash, a.time, a.ledger_index, a.tx_index);

    tables.insert(Table::AccountsCreated, key, row);
    Ok(())
}

fn add_memo(tables: &mut TableSet, m: &Memo) -> Result<()> {
    let key = keys::memo_key(m.executed_time, m.ledger_index, m.tx_index, m.memo_index)?;

    let row = Row::new()
        .index("account", &m.account)
        .index_opt("destination", m.destination.as_ref())
        .index_opt("source_tag", m.source_tag)
        .index_opt("destination_tag", m.destination_tag)
        .payload_opt("memo_type", m.memo_type.as_ref())
        .payload_opt("memo_data", m.memo_data.as_ref())
        .payload_opt("memo_format", m.memo_format.as_ref())
        .payload_opt("decoded_type", m.decoded_type.as_ref())
        .payload_opt("decoded_data", m.decoded_data.as_ref())
        .payload_opt("decoded_format", m.decoded_format.as_ref())
        .payload_opt("type_encoding", m.type_encoding.as_ref())
        .payload_opt("data_encoding", m.data_encoding.as_ref())
        .payload_opt("format_encoding", m.format_encoding.as_ref())
        .payload("memo_index", m.memo_index);
    let row = linked(row, &m.tx_hash, m.executed_time, m.ledger_index, m.tx_index);

    let pointer = |is_sender: bool, tag: Option<u32>| {
        let row = Row::new()
            .payload("memo_key", &key)
            .index("is_sender", is_sender)
            .index_opt("tag", tag)
            .payload("memo_index", m.memo_index);
        linked(row, &m.tx_hash, m.executed_time, m.ledger_index, m.tx_index)
    };

    tables.insert(
        Table::AccountMemos,
        keys::partitioned(&m.account, &key),
        pointer(true, m.source_tag),
    );
    if let Some(destination) = &m.destination {
        tables.insert(
            Table::AccountMemos,
            keys::partitioned(destination, &key),
            pointer(false, m.destination_tag),
        );
    }
    tables.insert(Table::Memos, key, row);
    Ok(())
}

fn add_affected_account(tables: &mut TableSet, a: &AffectedAccount) -> Result<()> {
    let key = keys::partitioned(&a.account, &keys::time_key(a.time, a.ledger_index, a.tx_index)?);

    let row = Row::new()
        .index("type", &a.tx_type)
        .index("result", &a.tx_result)
        .index_opt("client", a.client.as_ref());
    let row = linked(row, &a.tx_hash, a.time, a.ledger_index, a.tx_index);

    tables.insert(Table::AffectedAccountTransactions, key, row);
    Ok(())
}
