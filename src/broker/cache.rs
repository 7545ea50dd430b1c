use crate::dictionary::Dictionary;
use crate::error::Result;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::{Arc, Weak};
use tracing::debug;

/// Live dictionaries by language tag.
///
/// Entries are weak: a handle every caller has dropped is reclaimed and
/// the next request for its language builds a fresh one.
#[derive(Default)]
pub struct DictionaryCache {
    entries: DashMap<String, Weak<Dictionary>>,
}

impl DictionaryCache {
    /// Return the cached handle for `tag` unless it is gone or disposed, in
    /// which case `load` builds its replacement. The shard stays locked
    /// while loading so racing callers share one handle.
    pub fn get_or_try_insert_with<F>(&self, tag: &str, load: F) -> Result<Arc<Dictionary>>
    where
        F: FnOnce() -> Result<Arc<Dictionary>>,
    {
        match self.entries.entry(tag.to_string()) {
            Entry::Occupied(mut entry) => {
                if let Some(live) = entry.get().upgrade().filter(|d| !d.is_disposed()) {
                    debug!(tag, "dictionary cache hit");
                    return Ok(live);
                }
                debug!(tag, "replacing stale cached dictionary");
                let dictionary = load()?;
                entry.insert(Arc::downgrade(&dictionary));
                Ok(dictionary)
            }
            Entry::Vacant(entry) => {
                debug!(tag, "dictionary cache miss");
                let dictionary = load()?;
                entry.insert(Arc::downgrade(&dictionary));
                Ok(dictionary)
            }
        }
    }

    /// Number of entries whose handle is still alive and not disposed.
    #[cfg(test)]
    pub(crate) fn live_len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().upgrade().is_some_and(|d| !d.is_disposed()))
            .count()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}
