//! Background fetch coordination.
//!
//! `resolve` implements the three-phase protocol: a synchronous cache
//! check, background dispatch with per-key in-flight sharing, then a
//! bounded wait that returns either the real listing or a loading
//! placeholder to be replaced once the scoped refresh event fires.
//!
//! A dispatched fetch always runs to completion and writes its slot even
//! when every waiter has given up: the cache is keyed by (source, filter),
//! not by any view instance.

use crate::cache::{CacheStore, ListingKey};
use crate::config::BrowseConfig;
use crate::error::ShelfError;
use crate::source::Source;
use crate::tree::node::{EntryNode, Node};
use crate::types::SourceId;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Runtime;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Outcome of a listing resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The real, sorted listing.
    Ready(Vec<Node>),
    /// The fetch is still running; a refresh event follows on success.
    Loading,
}

/// Scoped refresh notification emitted after a background fetch populates
/// its slot, and after explicit invalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshEvent {
    pub source: SourceId,
}

type SharedFetch = Shared<BoxFuture<'static, Option<Vec<Node>>>>;

/// Schedules background listing calls and mediates between the cache and
/// the presentation thread.
pub struct FetchCoordinator {
    cache: Arc<CacheStore>,
    runtime: Runtime,
    in_flight: Arc<Mutex<HashMap<ListingKey, SharedFetch>>>,
    refresh: broadcast::Sender<RefreshEvent>,
    wait_window: Duration,
    offline: AtomicBool,
}

impl FetchCoordinator {
    pub fn new(cache: Arc<CacheStore>, wait_window: Duration) -> Result<Self, ShelfError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("shelf-fetch")
            .enable_all()
            .build()
            .map_err(|e| ShelfError::Runtime(e.to_string()))?;
        let (refresh, _) = broadcast::channel(64);
        Ok(Self {
            cache,
            runtime,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
            refresh,
            wait_window,
            offline: AtomicBool::new(false),
        })
    }

    pub fn with_config(cache: Arc<CacheStore>, config: &BrowseConfig) -> Result<Self, ShelfError> {
        let coordinator = Self::new(cache, config.wait_window())?;
        coordinator.set_offline(config.offline);
        Ok(coordinator)
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Listen for refresh events. A disposed view drops its receiver and
    /// later deliveries become no-ops.
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.refresh.subscribe()
    }

    /// While offline, cache misses dispatch nothing and resolve empty;
    /// hits are still served.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
        info!(offline, "Toggled offline mode");
    }

    pub fn is_offline(&self) -> bool {
        self.offline.load(Ordering::SeqCst)
    }

    /// Drop cached listings for one source and notify attached views so
    /// the next expansion refetches.
    pub fn invalidate(&self, source: &str) {
        let dropped = self.cache.invalidate_source(source);
        debug!(source = %source, dropped, "Invalidated listings");
        let _ = self.refresh.send(RefreshEvent {
            source: source.to_string(),
        });
    }

    /// Resolve the listing for (source, filter).
    ///
    /// Must be called from outside the coordinator's runtime, in practice
    /// the presentation thread. The call blocks at most for the configured
    /// wait window.
    pub fn resolve(&self, source: &Arc<dyn Source>, filter: Option<&str>) -> FetchOutcome {
        let key = ListingKey::new(source.name(), filter);

        if let Some(nodes) = self.cache.get(&key) {
            return FetchOutcome::Ready(nodes);
        }

        if self.is_offline() {
            debug!(source = %key.source, filter = %key.filter, "Offline; skipping fetch");
            return FetchOutcome::Ready(Vec::new());
        }

        let shared = self.shared_fetch(&key, source);
        let wait = self.wait_window;
        match self
            .runtime
            .block_on(async move { tokio::time::timeout(wait, shared).await })
        {
            Ok(Some(nodes)) => FetchOutcome::Ready(nodes),
            // The fetch failed inside the window; degrade to empty and
            // leave the slot unwritten so the next expansion retries.
            Ok(None) => FetchOutcome::Ready(Vec::new()),
            Err(_elapsed) => {
                debug!(
                    source = %key.source,
                    filter = %key.filter,
                    "Fetch exceeded wait window; returning placeholder"
                );
                FetchOutcome::Loading
            }
        }
    }

    /// One shared future per key: concurrent callers inside the wait
    /// window join the same fetch instead of scheduling duplicates.
    fn shared_fetch(&self, key: &ListingKey, source: &Arc<dyn Source>) -> SharedFetch {
        let mut in_flight = self.in_flight.lock();
        if let Some(existing) = in_flight.get(key) {
            return existing.clone();
        }
        let fut = self.spawn_fetch(key.clone(), Arc::clone(source));
        in_flight.insert(key.clone(), fut.clone());
        fut
    }

    fn spawn_fetch(&self, key: ListingKey, source: Arc<dyn Source>) -> SharedFetch {
        let cache = Arc::clone(&self.cache);
        let in_flight = Arc::clone(&self.in_flight);
        let refresh = self.refresh.clone();

        let fut = async move {
            let filter = if key.is_pinned() {
                None
            } else {
                Some(key.filter.clone())
            };
            let list_source = Arc::clone(&source);
            let listed =
                tokio::task::spawn_blocking(move || list_source.list(filter.as_deref())).await;

            let outcome = match listed {
                Ok(Ok(mut ids)) => {
                    ids.sort();
                    let nodes: Vec<Node> = ids
                        .into_iter()
                        .map(|id| Node::Entry(EntryNode::new(Arc::clone(&source), id)))
                        .collect();
                    cache.put(key.clone(), nodes.clone());
                    info!(
                        source = %key.source,
                        filter = %key.filter,
                        entries = nodes.len(),
                        "Populated listing slot"
                    );
                    Some(nodes)
                }
                Ok(Err(e)) => {
                    warn!(
                        source = %key.source,
                        operation = "list",
                        filter = %key.filter,
                        error = %e,
                        "Source listing failed"
                    );
                    None
                }
                Err(e) => {
                    warn!(
                        source = %key.source,
                        operation = "list",
                        error = %e,
                        "Listing task aborted"
                    );
                    None
                }
            };

            in_flight.lock().remove(&key);
            if outcome.is_some() {
                let _ = refresh.send(RefreshEvent {
                    source: key.source.clone(),
                });
            }
            outcome
        }
        .boxed()
        .shared();

        // Drive the fetch to completion even when every waiter times out
        // inside the window.
        self.runtime.spawn(fut.clone());
        fut
    }
}
