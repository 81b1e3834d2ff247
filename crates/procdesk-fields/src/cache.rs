//! Session-scoped cache of reference-table rows
//!
//! Lookups sharing a table, column set and filter share one fetch for the
//! lifetime of the cache. Entries are never invalidated explicitly; a new
//! session builds a new cache. Concurrent misses on the same key may both
//! fetch, and the last insert wins.
//!
//! The capacity is a soft bound on distinct lookup keys. A session with more
//! keys than that may see an evicted key fetched again, which only costs a
//! second call to the source.

use moka::sync::Cache;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::domain::value_objects::{LookupBinding, LookupKey, LookupQuery, LookupRow, SelectOption};
use crate::ports::outbound::LookupSource;

#[derive(Clone)]
pub struct LookupCache {
    source: Arc<dyn LookupSource>,
    rows: Cache<LookupKey, Arc<Vec<LookupRow>>>,
    row_limit: usize,
}

impl LookupCache {
    pub fn new(source: Arc<dyn LookupSource>, config: &EngineConfig) -> Self {
        Self::with_capacity(source, config.lookup_cache_capacity, config.lookup_row_limit)
    }

    pub fn with_capacity(source: Arc<dyn LookupSource>, capacity: u64, row_limit: usize) -> Self {
        let rows = Cache::builder().max_capacity(capacity).build();
        Self { source, rows, row_limit }
    }

    /// Rows for a binding, fetched once per key.
    ///
    /// A failed fetch yields an empty list and is not cached.
    pub async fn rows_for(&self, binding: &LookupBinding) -> Arc<Vec<LookupRow>> {
        let key = LookupKey::from(binding);
        if let Some(rows) = self.rows.get(&key) {
            return rows;
        }

        let query = LookupQuery::from_binding(binding, self.row_limit);
        match self.source.list_lookup_rows(&query).await {
            Ok(mut rows) => {
                rows.truncate(self.row_limit);
                tracing::debug!("Fetched {} rows from {}", rows.len(), binding.table);
                let rows = Arc::new(rows);
                self.rows.insert(key, rows.clone());
                rows
            }
            Err(e) => {
                tracing::warn!("Lookup on {} failed, using no options: {}", binding.table, e);
                Arc::new(Vec::new())
            }
        }
    }

    /// Select options for an external-table-reference field
    pub async fn options_for(&self, binding: &LookupBinding) -> Vec<SelectOption> {
        self.rows_for(binding)
            .await
            .iter()
            .filter_map(|row| row.to_option(binding))
            .collect()
    }
}
