//! Source registry.
//!
//! Holds the sources registered for the lifetime of a browsing session.
//! Registration order is preserved; it is the order sources appear at the
//! top level of the tree.

use super::Source;
use std::sync::Arc;
use tracing::debug;

/// Name reserved for the internal cache source. It participates in lookups
/// but is hidden from top-level browsing.
pub const CACHE_SOURCE_NAME: &str = "cache";

/// Registry of sources for the lifetime of a browsing session.
#[derive(Default)]
pub struct SourceRegistry {
    sources: Vec<Arc<dyn Source>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Register a source. Re-registering a name replaces the previous
    /// entry in place, keeping its position.
    pub fn register(&mut self, source: Arc<dyn Source>) {
        debug!(source = %source.name(), "Registering source");
        if let Some(existing) = self
            .sources
            .iter_mut()
            .find(|s| s.name() == source.name())
        {
            *existing = source;
        } else {
            self.sources.push(source);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Source>> {
        self.sources.iter().find(|s| s.name() == name)
    }

    /// All registered sources, in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources.iter()
    }

    /// Sources visible at the top level of the tree, excluding the
    /// reserved internal cache source.
    pub fn browsable(&self) -> impl Iterator<Item = &Arc<dyn Source>> {
        self.sources
            .iter()
            .filter(|s| s.name() != CACHE_SOURCE_NAME)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}
