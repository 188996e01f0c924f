//! Bounded per-source cache of filtered listings.
//!
//! One slot per (source, normalized filter). Each source is bounded to a
//! fixed number of non-pinned slots; the wildcard key is pinned and
//! survives any access pattern. Eviction is by recency and never crosses
//! sources. Only real node lists are cached; loading placeholders are
//! returned to callers without ever occupying a slot.

use crate::tree::node::Node;
use crate::types::SourceId;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

/// Normalized filter representing "no filter".
pub const WILDCARD_FILTER: &str = "*";

/// Default number of non-pinned listing slots retained per source.
pub const DEFAULT_SLOTS_PER_SOURCE: usize = 10;

/// Normalize a filter the way cache keys do: `None`, empty, and `"*"`
/// all collapse to the single wildcard filter.
pub fn normalize_filter(filter: Option<&str>) -> String {
    match filter.map(str::trim) {
        None | Some("") | Some(WILDCARD_FILTER) => WILDCARD_FILTER.to_string(),
        Some(f) => f.to_string(),
    }
}

/// Value-typed cache key: source name plus normalized filter. Keyed by
/// name, not source object identity, so registry reloads cannot leak
/// slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ListingKey {
    pub source: SourceId,
    pub filter: String,
}

impl ListingKey {
    pub fn new(source: impl Into<SourceId>, filter: Option<&str>) -> Self {
        Self {
            source: source.into(),
            filter: normalize_filter(filter),
        }
    }

    /// The wildcard key is pinned: exempt from eviction.
    pub fn is_pinned(&self) -> bool {
        self.filter == WILDCARD_FILTER
    }
}

struct Slot {
    nodes: Vec<Node>,
    last_used: u64,
}

struct Inner {
    slots: HashMap<ListingKey, Slot>,
    tick: u64,
}

impl Inner {
    fn touch(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn non_pinned_count(&self, source: &str) -> usize {
        self.slots
            .keys()
            .filter(|k| k.source == source && !k.is_pinned())
            .count()
    }

    fn lru_non_pinned(&self, source: &str) -> Option<ListingKey> {
        self.slots
            .iter()
            .filter(|(k, _)| k.source == source && !k.is_pinned())
            .min_by_key(|(_, slot)| slot.last_used)
            .map(|(k, _)| k.clone())
    }
}

/// Bounded, per-source listing cache. Safe for concurrent background
/// writers and a presentation-side reader; the last writer for a key wins.
pub struct CacheStore {
    inner: Mutex<Inner>,
    bound: usize,
}

impl CacheStore {
    pub fn new() -> Self {
        Self::with_bound(DEFAULT_SLOTS_PER_SOURCE)
    }

    pub fn with_bound(bound: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                slots: HashMap::new(),
                tick: 0,
            }),
            bound,
        }
    }

    /// Fetch a slot, marking it most recently used.
    pub fn get(&self, key: &ListingKey) -> Option<Vec<Node>> {
        let mut inner = self.inner.lock();
        let tick = inner.touch();
        let slot = inner.slots.get_mut(key)?;
        slot.last_used = tick;
        Some(slot.nodes.clone())
    }

    /// Install a slot, evicting the least recently used non-pinned key of
    /// the same source once that source exceeds the bound.
    pub fn put(&self, key: ListingKey, nodes: Vec<Node>) {
        let mut inner = self.inner.lock();
        let tick = inner.touch();
        inner.slots.insert(
            key.clone(),
            Slot {
                nodes,
                last_used: tick,
            },
        );

        while inner.non_pinned_count(&key.source) > self.bound {
            match inner.lru_non_pinned(&key.source) {
                Some(victim) => {
                    inner.slots.remove(&victim);
                    debug!(source = %victim.source, filter = %victim.filter, "Evicted listing slot");
                }
                None => break,
            }
        }
    }

    /// Drop every slot belonging to one source. Returns the number of
    /// slots removed.
    pub fn invalidate_source(&self, source: &str) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.slots.len();
        inner.slots.retain(|k, _| k.source != source);
        before - inner.slots.len()
    }

    /// Drop every slot.
    pub fn clear(&self) {
        self.inner.lock().slots.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.lock().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a slot exists without touching its recency.
    pub fn contains(&self, key: &ListingKey) -> bool {
        self.inner.lock().slots.contains_key(key)
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new()
    }
}
