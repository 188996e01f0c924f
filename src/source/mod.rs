//! Source collaborator interface and optional capabilities.
//!
//! A source is a pluggable listing/search provider, analogous to a
//! repository. Listing and version lookup may perform blocking I/O; the
//! fetch coordinator always invokes them from background workers. Optional
//! behaviors are modelled as explicit accessor methods returning capability
//! traits, never as runtime type inspection.

mod registry;

use crate::resource::{Provider, Requirement, Resource};
use crate::types::Phase;
use crate::version::Version;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

pub use registry::{SourceRegistry, CACHE_SOURCE_NAME};

/// A pluggable external listing/search provider.
pub trait Source: Send + Sync {
    /// Stable display name. Doubles as the cache key component.
    fn name(&self) -> &str;

    /// Enumerate entry identifiers matching the filter. `None` lists
    /// everything.
    fn list(&self, filter: Option<&str>) -> anyhow::Result<Vec<String>>;

    /// Enumerate the known versions of one entry.
    fn versions(&self, id: &str) -> anyhow::Result<Vec<Version>>;

    /// Presentation strings and actions for this source's entries.
    fn as_actionable(&self) -> Option<&dyn Actionable> {
        None
    }

    /// Phases this source participates in. `None` means every phase.
    fn supported_phases(&self) -> Option<&HashSet<Phase>> {
        None
    }

    /// Requirement-based capability search, if the source supports it.
    fn as_provider_search(&self) -> Option<&dyn ProviderSearch> {
        None
    }

    /// Live workspace resources, for sources backed by the local workspace.
    fn as_workspace_backed(&self) -> Option<&dyn WorkspaceBacked> {
        None
    }

    /// Continuation of a filtered search outside the local listing.
    fn as_remote_browse(&self) -> Option<&dyn RemoteBrowse> {
        None
    }
}

/// Source-supplied presentation strings and actions for its entries. The
/// target slice carries the entry id and, where known, a version string.
pub trait Actionable {
    fn title(&self, target: &[&str]) -> anyhow::Result<String>;

    fn tooltip(&self, target: &[&str]) -> anyhow::Result<String>;

    fn actions(&self, target: &[&str]) -> anyhow::Result<BTreeMap<String, String>>;
}

/// Requirement-based capability search over a source's resources.
pub trait ProviderSearch {
    fn find_providers(
        &self,
        requirements: &[Requirement],
    ) -> anyhow::Result<HashMap<Requirement, Vec<Provider>>>;
}

/// Sources backed by the local workspace expose their live resources; the
/// search fan-out adapts them into [`ProviderSearch`].
pub trait WorkspaceBacked {
    fn resources(&self) -> anyhow::Result<Vec<Arc<Resource>>>;
}

/// Sources that can continue a filtered search beyond the local listing.
pub trait RemoteBrowse {
    /// Location (typically a URL) at which the search for `filter` can be
    /// continued externally.
    fn search_location(&self, filter: &str) -> anyhow::Result<String>;
}

/// Build description collaborator enumerating a project's sub-entries.
pub trait BuildDescriptions: Send + Sync {
    fn sub_entries(&self, project: &str) -> anyhow::Result<Vec<String>>;
}
