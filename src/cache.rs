//! Per-path single-flight cache for metadata bodies.

use std::future::Future;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;

use crate::error::MetadataError;

/// Raw response bodies keyed by metadata path.
///
/// Each path owns a `OnceCell`; concurrent callers for the same path wait on
/// the one in-flight fetch. A failed fetch leaves the cell empty so the next
/// caller retries, and the last caller to fail on a cell drops it from the
/// map. Resolved entries are never evicted.
#[derive(Debug, Default)]
pub(crate) struct PathCache {
    entries: DashMap<String, Arc<OnceCell<String>>>,
}

impl PathCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached body for `path`, without waiting on an in-flight fetch.
    pub fn get(&self, path: &str) -> Option<String> {
        self.entries.get(path).and_then(|cell| cell.get().cloned())
    }

    /// Return the cached body for `path`, running `fetch` at most once across
    /// all concurrent callers until it succeeds.
    pub async fn get_or_fetch<F, Fut>(&self, path: &str, fetch: F) -> Result<String, MetadataError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String, MetadataError>>,
    {
        let cell = self.cell(path);
        let result = cell.get_or_try_init(fetch).await.cloned();
        if result.is_err() {
            self.forget_failed(path, &cell);
        }
        result
    }

    /// Number of paths holding a resolved body.
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    /// Drop `path`'s empty cell unless another caller still holds it.
    fn forget_failed(&self, path: &str, cell: &Arc<OnceCell<String>>) {
        // One reference in the map, one held by this caller.
        self.entries.remove_if(path, |_, entry| {
            Arc::ptr_eq(entry, cell) && !entry.initialized() && Arc::strong_count(entry) <= 2
        });
    }

    fn cell(&self, path: &str) -> Arc<OnceCell<String>> {
        // Clone the Arc out so no shard lock is held across the await.
        self.entries
            .entry(path.to_string())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone()
    }
}
