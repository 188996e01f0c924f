//! Memoizing version resolver owned by entry-version nodes.
//!
//! The resolver is constructed with a strategy and a value-computing
//! thunk. The thunk runs at most once per resolver, whatever the outcome;
//! labels delegate to the owning source's Actionable capability and fall
//! back to the raw version string on any failure.

use crate::source::Source;
use crate::version::Version;
use parking_lot::Mutex;
use std::sync::{Arc, OnceLock};
use tracing::debug;

/// Version selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Resolve to the highest version the source knows for the entry.
    Highest,
    /// Resolve to one exact, already-known version.
    Exact,
}

type Thunk = Box<dyn FnOnce() -> anyhow::Result<Option<Version>> + Send>;

/// Lazily computes an entry's version at most once, memoizing success,
/// empty, and failure outcomes alike for its whole lifetime.
pub struct VersionResolver {
    strategy: Strategy,
    source: Arc<dyn Source>,
    id: String,
    raw: String,
    thunk: Mutex<Option<Thunk>>,
    result: OnceLock<Result<Option<Version>, String>>,
    label: Mutex<Option<String>>,
}

impl VersionResolver {
    pub fn new(
        strategy: Strategy,
        source: Arc<dyn Source>,
        id: impl Into<String>,
        raw: impl Into<String>,
        thunk: impl FnOnce() -> anyhow::Result<Option<Version>> + Send + 'static,
    ) -> Self {
        Self {
            strategy,
            source,
            id: id.into(),
            raw: raw.into(),
            thunk: Mutex::new(Some(Box::new(thunk))),
            result: OnceLock::new(),
            label: Mutex::new(None),
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// The raw version string this resolver was constructed with.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The resolved version. The thunk runs on the first call only; later
    /// calls observe the memoized outcome, failures included. Failures are
    /// carried as strings because they are terminal: nothing re-attempts a
    /// failed resolution.
    pub fn value(&self) -> Result<Option<Version>, String> {
        self.result
            .get_or_init(|| {
                let thunk = self.thunk.lock().take();
                match thunk {
                    Some(thunk) => thunk().map_err(|e| {
                        debug!(source = %self.source.name(), id = %self.id, error = %e, "Version resolution failed");
                        e.to_string()
                    }),
                    None => Err("resolver thunk already consumed".to_string()),
                }
            })
            .clone()
    }

    /// Presentation label. Delegates to the source's Actionable capability
    /// when present, passing the entry id and, for the Exact strategy, the
    /// resolved version. Any failure falls back to the raw version string;
    /// the outcome is cached either way.
    pub fn label(&self) -> String {
        if let Some(cached) = self.label.lock().clone() {
            return cached;
        }
        let computed = self.compute_label();
        *self.label.lock() = Some(computed.clone());
        computed
    }

    fn compute_label(&self) -> String {
        let Some(actionable) = self.source.as_actionable() else {
            return self.fallback_label();
        };

        let resolved = match self.strategy {
            Strategy::Exact => match self.value() {
                Ok(Some(version)) => Some(version.to_string()),
                _ => None,
            },
            Strategy::Highest => None,
        };

        let titled = match &resolved {
            Some(version) => actionable.title(&[self.id.as_str(), version.as_str()]),
            None => actionable.title(&[self.id.as_str()]),
        };

        match titled {
            Ok(title) => title,
            Err(e) => {
                debug!(source = %self.source.name(), id = %self.id, error = %e, "Actionable title failed");
                self.fallback_label()
            }
        }
    }

    fn fallback_label(&self) -> String {
        if !self.raw.is_empty() {
            return self.raw.clone();
        }
        match self.value() {
            Ok(Some(version)) => version.to_string(),
            _ => String::new(),
        }
    }
}
