//! Normalized per-folder page cache with watch channels.
//!
//! Each folder key owns one `tokio::sync::watch` channel. Network fetches
//! write into it; subscribers observe every write. This is the only path by
//! which fetched children reach the tree store.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::debug;

use super::query::ProfileNodeConnection;
use crate::tree::node::FolderKey;

type Entry = watch::Sender<Option<ProfileNodeConnection>>;

#[derive(Debug, Default)]
pub struct PageCache {
    entries: Mutex<HashMap<FolderKey, Entry>>,
    /// Bumped by every `clear`, always under the `entries` lock.
    generation: AtomicU64,
}

impl PageCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<FolderKey, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current cached value for `key`, without touching the network.
    pub fn read(&self, key: &FolderKey) -> Option<ProfileNodeConnection> {
        self.lock()
            .get(key)
            .and_then(|entry| entry.borrow().clone())
    }

    /// Subscribe to every future write for `key`.
    ///
    /// The receiver starts out holding the current value.
    pub fn watch(&self, key: &FolderKey) -> watch::Receiver<Option<ProfileNodeConnection>> {
        self.lock()
            .entry(key.clone())
            .or_insert_with(|| watch::channel(None).0)
            .subscribe()
    }

    /// Current generation. A fetch records it before going to the network
    /// and hands it back to [`PageCache::write`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Merge a freshly fetched page into the entry for `key`.
    ///
    /// Relay-style: a page fetched without `after` replaces the entry. A page
    /// fetched after a cursor keeps the existing edges up to and including
    /// that cursor (all of them if the cursor is unknown) and appends the
    /// incoming edges. Page info always comes from the incoming page.
    ///
    /// The page is dropped if the cache was cleared since `generation` was
    /// read. Returns whether the page was stored.
    pub fn write(
        &self,
        generation: u64,
        key: &FolderKey,
        incoming: ProfileNodeConnection,
        after: Option<&str>,
    ) -> bool {
        let mut entries = self.lock();
        if generation != self.generation() {
            debug!(folder = %key, "dropping page fetched before the cache was cleared");
            return false;
        }
        let entry = entries
            .entry(key.clone())
            .or_insert_with(|| watch::channel(None).0);

        entry.send_modify(|current| {
            let merged = match (current.take(), after) {
                (Some(mut existing), Some(cursor)) => {
                    if let Some(index) = existing.edges.iter().position(|e| e.cursor == cursor) {
                        existing.edges.truncate(index + 1);
                    }
                    existing.edges.extend(incoming.edges);
                    existing.page_info = incoming.page_info;
                    existing
                }
                _ => incoming,
            };
            debug!(folder = %key, edges = merged.edges.len(), "page cache updated");
            *current = Some(merged);
        });
        true
    }

    /// Drop every entry. Open watchers observe their channel closing, and
    /// pages still in flight from before the clear are discarded.
    pub fn clear(&self) {
        let mut entries = self.lock();
        self.generation.fetch_add(1, Ordering::SeqCst);
        entries.clear();
    }
}
