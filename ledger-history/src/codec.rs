//! Collaborator seams
//!
//! The history does not know how transactions are serialized on the wire,
//! nor how a ledger's transactions are classified into exchanges, payments
//! and the rest. Both are injected behind these traits.

use crate::{
    error::{Error, Result},
    types::{ExpandedLedger, ParsedLedger},
};
use serde_json::Value;

/// Decodes a stored transaction or metadata blob
pub trait TransactionCodec: Send + Sync {
    /// Decode one hex blob into its structured form
    fn decode(&self, blob: &str) -> Result<Value>;
}

/// Classifies a ledger's transactions into derived records
///
/// Must be deterministic: deletion re-runs the parser and relies on it
/// producing the same records, and therefore the same keys, as the write.
pub trait LedgerParser: Send + Sync {
    /// Parse one ledger with decoded transactions
    fn parse_ledger(&self, ledger: &ExpandedLedger) -> Result<ParsedLedger>;
}

/// Codec for blobs that are hex-encoded JSON documents
///
/// Stands in for the ledger's binary codec where the adapter stores JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonHexCodec;

impl JsonHexCodec {
    /// Encode a document as a blob
    pub fn encode(value: &Value) -> Result<String> {
        Ok(hex::encode(serde_json::to_vec(value)?))
    }
}

impl TransactionCodec for JsonHexCodec {
    fn decode(&self, blob: &str) -> Result<Value> {
        let bytes =
            hex::decode(blob).map_err(|e| Error::Validation(format!("blob is not hex: {}", e)))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
