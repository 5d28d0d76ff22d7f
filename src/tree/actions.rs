//! Folder actions: turn toggle/load-more intents into transport work and
//! write the results back into the [`TreeStore`].
//!
//! All methods run on the UI loop. Fetches and cache watches run as spawned
//! tasks and report back through [`Event`]s, which the loop hands to
//! [`FolderActions::handle_fetch_complete`] and
//! [`FolderActions::handle_cache_update`] one at a time.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::node::FolderKey;
use super::store::TreeStore;
use crate::error::FetchError;
use crate::event::Event;
use crate::graphql::client::GraphQlTransport;
use crate::graphql::query::{ListProfileNodesVars, ProfileNodeConnection};

/// Live cache subscriptions, at most one per folder.
///
/// Dropping the registry closes every subscription.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    live: HashMap<FolderKey, JoinHandle<()>>,
}

impl SubscriptionRegistry {
    pub fn contains(&self, key: &FolderKey) -> bool {
        self.live.contains_key(key)
    }

    /// Register the forwarding task for `key`. Returns `false` (and aborts
    /// `handle`) if the folder is already watched.
    pub fn open(&mut self, key: FolderKey, handle: JoinHandle<()>) -> bool {
        if self.live.contains_key(&key) {
            handle.abort();
            return false;
        }
        self.live.insert(key, handle);
        true
    }

    pub fn close_all(&mut self) {
        for (_, handle) in self.live.drain() {
            handle.abort();
        }
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }
}

impl Drop for SubscriptionRegistry {
    fn drop(&mut self) {
        self.close_all();
    }
}

pub struct FolderActions {
    transport: Arc<GraphQlTransport>,
    subscriptions: SubscriptionRegistry,
    /// Fetch tasks that may still be running; aborted by `cleanup`.
    fetches: Vec<JoinHandle<()>>,
    event_tx: mpsc::UnboundedSender<Event>,
    page_size: usize,
}

impl FolderActions {
    pub fn new(
        transport: Arc<GraphQlTransport>,
        event_tx: mpsc::UnboundedSender<Event>,
        page_size: usize,
    ) -> Self {
        Self {
            transport,
            subscriptions: SubscriptionRegistry::default(),
            fetches: Vec::new(),
            event_tx,
            page_size,
        }
    }

    pub fn subscriptions(&self) -> &SubscriptionRegistry {
        &self.subscriptions
    }

    /// Flip the expansion of `key`.
    ///
    /// Expanding starts watching the folder and fetches its first page when
    /// the cache has no children for it yet and no fetch is in flight.
    /// Collapsing only hides rows.
    pub fn toggle_folder(&mut self, store: &mut TreeStore, key: FolderKey) {
        let expand = !store.is_expanded(&key);
        store.set_expanded(key.clone(), expand);
        if !expand {
            return;
        }

        self.watch_folder(&key);

        let cached = self
            .transport
            .read_cached(&key)
            .is_some_and(|page| !page.edges.is_empty());
        if !cached && !store.is_loading(&key) {
            store.set_loading(key.clone(), true);
            let vars = ListProfileNodesVars::first_page(&key, self.page_size);
            self.spawn_fetch(key, vars);
        }
    }

    /// Request the next page of `key`'s children.
    ///
    /// Does nothing without a next cursor or while a fetch for `key` is
    /// already in flight. The check and the loading flag are set with no
    /// suspension point in between.
    pub fn fetch_more_for_folder(&mut self, store: &mut TreeStore, key: FolderKey) {
        let Some(cursor) = store.page_info(&key).and_then(|info| info.next_cursor()) else {
            return;
        };
        if store.is_loading(&key) {
            return;
        }

        let vars = ListProfileNodesVars::next_page(&key, self.page_size, cursor);
        store.set_loading(key.clone(), true);
        self.spawn_fetch(key, vars);
    }

    /// Completion of a fetch started by this component.
    ///
    /// Clears the loading flag; the data itself arrives through the cache
    /// subscription. Failures leave the known children untouched.
    pub fn handle_fetch_complete(
        &mut self,
        store: &mut TreeStore,
        key: FolderKey,
        result: &Result<(), FetchError>,
    ) {
        if let Err(e) = result {
            warn!(folder = %key, error = %e, "fetching folder children failed");
        }
        store.set_loading(key, false);
    }

    /// A cache write for a watched folder.
    pub fn handle_cache_update(
        &mut self,
        store: &mut TreeStore,
        key: FolderKey,
        page: ProfileNodeConnection,
    ) {
        debug!(folder = %key, children = page.edges.len(), "applying cache update");
        store.set_children(key.clone(), page.nodes());
        store.set_page_info(key, page.page_info);
    }

    /// Release every subscription and abort fetches still in flight.
    pub fn cleanup(&mut self) {
        debug!(
            subscriptions = self.subscriptions.len(),
            fetches = self.fetches.len(),
            "closing folder subscriptions"
        );
        self.subscriptions.close_all();
        for handle in self.fetches.drain(..) {
            handle.abort();
        }
    }

    fn watch_folder(&mut self, key: &FolderKey) {
        if self.subscriptions.contains(key) {
            return;
        }

        let mut rx = self.transport.watch(key);
        let tx = self.event_tx.clone();
        let task_key = key.clone();
        let handle = tokio::spawn(async move {
            loop {
                let current = rx.borrow_and_update().clone();
                if let Some(page) = current {
                    let update = Event::CacheUpdate {
                        key: task_key.clone(),
                        page,
                    };
                    if tx.send(update).is_err() {
                        break;
                    }
                }
                if rx.changed().await.is_err() {
                    break;
                }
            }
        });

        debug!(folder = %key, "watching folder");
        self.subscriptions.open(key.clone(), handle);
    }

    fn spawn_fetch(&mut self, key: FolderKey, vars: ListProfileNodesVars) {
        let transport = Arc::clone(&self.transport);
        let tx = self.event_tx.clone();
        self.fetches.retain(|handle| !handle.is_finished());
        self.fetches.push(tokio::spawn(async move {
            let result = transport.query(&vars).await;
            let _ = tx.send(Event::FetchComplete { key, result });
        }));
    }
}
