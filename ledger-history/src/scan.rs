//! Scan pager
//!
//! Builds one bounded range scan and fetches exactly one page. Callers drive
//! pagination by passing the returned marker back.

use crate::{
    error::Result,
    keys::KeyRange,
    row::{Column, Filter},
    store::{Marker, ScanPage, ScanRequest, Store},
    tables::Table,
};

/// One-page scan builder
#[derive(Debug, Clone)]
pub struct ScanPager {
    request: ScanRequest,
}

impl ScanPager {
    /// Scan `range` of `table`, ascending, unbounded
    pub fn new(table: Table, range: KeyRange) -> Self {
        Self {
            request: ScanRequest {
                table,
                start: range.start,
                stop: range.stop,
                filters: Vec::new(),
                columns: Vec::new(),
                marker: None,
                limit: None,
                descending: false,
            },
        }
    }

    /// Add an equality filter
    pub fn filter(mut self, filter: Filter) -> Self {
        self.request.filters.push(filter);
        self
    }

    /// Add an equality filter when a value is given
    pub fn filter_eq(self, column: Column, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.filter(Filter::eq(column, v)),
            None => self,
        }
    }

    /// Restrict returned columns
    pub fn columns(mut self, columns: &[Column]) -> Self {
        self.request.columns = columns.to_vec();
        self
    }

    /// Cap the page size; zero means no cap
    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.request.limit = limit.filter(|limit| *limit > 0);
        self
    }

    /// Walk keys from high to low
    pub fn descending(mut self, descending: bool) -> Self {
        self.request.descending = descending;
        self
    }

    /// Resume from a marker returned by a previous page
    pub fn marker(mut self, marker: Option<Marker>) -> Self {
        self.request.marker = marker;
        self
    }

    /// The request that will be issued
    pub fn request(&self) -> &ScanRequest {
        &self.request
    }

    /// Fetch one page
    pub async fn fetch(self, store: &dyn Store) -> Result<ScanPage> {
        let table = self.request.table;
        let page = store.scan(self.request).await?;

        tracing::debug!(
            table = %table,
            rows = page.rows.len(),
            truncated = page.marker.is_some(),
            "Scan page fetched"
        );

        Ok(page)
    }
}
