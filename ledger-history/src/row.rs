//! Typed rows
//!
//! A row holds two column families: `indexed` attributes that scans may
//! filter on, and `payload` attributes that are only ever read back. Cell
//! values are strings; numeric columns are coerced on read.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Column family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Family {
    /// Queryable attributes (`f`)
    Indexed,
    /// Opaque payload (`d`)
    Payload,
}

impl Family {
    /// Single-letter family prefix
    pub fn prefix(&self) -> &'static str {
        match self {
            Family::Indexed => "f",
            Family::Payload => "d",
        }
    }
}

/// A qualified column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Column {
    /// Family the column lives in
    pub family: Family,
    /// Column name within the family
    pub qualifier: &'static str,
}

impl Column {
    /// Column in the indexed family
    pub const fn indexed(qualifier: &'static str) -> Self {
        Self {
            family: Family::Indexed,
            qualifier,
        }
    }

    /// Column in the payload family
    pub const fn payload(qualifier: &'static str) -> Self {
        Self {
            family: Family::Payload,
            qualifier,
        }
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.family.prefix(), self.qualifier)
    }
}

/// Server-side equality filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Column compared
    pub column: Column,
    /// Expected cell value
    pub value: String,
}

impl Filter {
    /// `column == value`
    pub fn eq(column: Column, value: impl Into<String>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

/// One stored row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    indexed: BTreeMap<String, String>,
    payload: BTreeMap<String, String>,
}

impl Row {
    /// Empty row
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an indexed column
    pub fn index(mut self, qualifier: &str, value: impl ToString) -> Self {
        self.indexed.insert(qualifier.to_string(), value.to_string());
        self
    }

    /// Set an indexed column when the value is present
    pub fn index_opt<T: ToString>(self, qualifier: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.index(qualifier, v),
            None => self,
        }
    }

    /// Set a payload column
    pub fn payload(mut self, qualifier: &str, value: impl ToString) -> Self {
        self.payload.insert(qualifier.to_string(), value.to_string());
        self
    }

    /// Set a payload column when the value is present
    pub fn payload_opt<T: ToString>(self, qualifier: &str, value: Option<T>) -> Self {
        match value {
            Some(v) => self.payload(qualifier, v),
            None => self,
        }
    }

    /// Set a qualified column
    pub fn with(self, column: Column, value: impl ToString) -> Self {
        match column.family {
            Family::Indexed => self.index(column.qualifier, value),
            Family::Payload => self.payload(column.qualifier, value),
        }
    }

    /// Set a qualified column when the value is present
    pub fn with_opt<T: ToString>(self, column: Column, value: Option<T>) -> Self {
        match value {
            Some(v) => self.with(column, v),
            None => self,
        }
    }

    /// Set a payload column to the JSON encoding of `value`
    pub fn payload_json<T: Serialize + ?Sized>(self, qualifier: &str, value: &T) -> Result<Self> {
        let encoded = serde_json::to_string(value)?;
        Ok(self.payload(qualifier, encoded))
    }

    /// Cell value of a column
    pub fn get(&self, column: Column) -> Option<&str> {
        let family = match column.family {
            Family::Indexed => &self.indexed,
            Family::Payload => &self.payload,
        };
        family.get(column.qualifier).map(String::as_str)
    }

    /// Cell value, or a validation error naming the column
    pub fn require(&self, column: Column) -> Result<&str> {
        self.get(column)
            .ok_or_else(|| Error::Validation(format!("missing column {}", column)))
    }

    /// Coerce a required cell
    pub fn parse<T>(&self, column: Column) -> Result<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.require(column)?;
        raw.parse()
            .map_err(|e| Error::Validation(format!("column {} = {:?}: {}", column, raw, e)))
    }

    /// Coerce an optional cell
    pub fn parse_opt<T>(&self, column: Column) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match self.get(column) {
            Some(_) => self.parse(column).map(Some),
            None => Ok(None),
        }
    }

    /// Decode a JSON-encoded cell
    pub fn parse_json<T: serde::de::DeserializeOwned>(&self, column: Column) -> Result<T> {
        Ok(serde_json::from_str(self.require(column)?)?)
    }

    /// True when every filter matches (an absent cell never matches)
    pub fn matches(&self, filters: &[Filter]) -> bool {
        filters
            .iter()
            .all(|f| self.get(f.column) == Some(f.value.as_str()))
    }

    /// Copy of the row restricted to `columns`; empty means all columns
    pub fn project(&self, columns: &[Column]) -> Row {
        if columns.is_empty() {
            return self.clone();
        }

        let mut row = Row::new();
        for column in columns {
            if let Some(value) = self.get(*column) {
                let family = match column.family {
                    Family::Indexed => &mut row.indexed,
                    Family::Payload => &mut row.payload,
                };
                family.insert(column.qualifier.to_string(), value.to_string());
            }
        }
        row
    }

    /// Number of cells
    pub fn len(&self) -> usize {
        self.indexed.len() + self.payload.len()
    }

    /// True when the row holds no cells
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A row together with its key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedRow {
    /// Row key
    pub key: String,
    /// Cells
    pub row: Row,
}
