//! Requirement-based search fan-out across sources.
//!
//! Every search-capable source is queried synchronously; callers run the
//! fan-out off the presentation thread because sources may perform I/O.
//! Results are deduplicated by resolved-resource identity, in first-seen
//! order, regardless of how many requirements or capabilities matched the
//! same resource.

use crate::resource::{Provider, Requirement, Resource};
use crate::source::{ProviderSearch, SourceRegistry, WorkspaceBacked};
use crate::tree::node::{Node, SearchResultNode};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Adapter exposing a workspace-backed source as [`ProviderSearch`] by
/// matching requirements against its live resources locally.
pub struct WorkspaceSearchAdapter<'a> {
    workspace: &'a dyn WorkspaceBacked,
}

impl<'a> WorkspaceSearchAdapter<'a> {
    pub fn new(workspace: &'a dyn WorkspaceBacked) -> Self {
        Self { workspace }
    }
}

impl ProviderSearch for WorkspaceSearchAdapter<'_> {
    fn find_providers(
        &self,
        requirements: &[Requirement],
    ) -> anyhow::Result<HashMap<Requirement, Vec<Provider>>> {
        let resources = self.workspace.resources()?;
        let mut matches: HashMap<Requirement, Vec<Provider>> = HashMap::new();
        for requirement in requirements {
            let entry = matches.entry(requirement.clone()).or_default();
            for resource in &resources {
                for capability in &resource.capabilities {
                    if capability.satisfies(requirement) {
                        entry.push(Provider {
                            capability: capability.clone(),
                            resource: Arc::clone(resource),
                        });
                    }
                }
            }
        }
        Ok(matches)
    }
}

/// Query every eligible source for providers of `requirement` and wrap
/// each distinct resource as a search-result node.
///
/// Workspace-backed sources go through [`WorkspaceSearchAdapter`] first;
/// all others must expose [`ProviderSearch`] themselves or are skipped.
/// Per-source failures are logged and the fan-out continues.
pub fn find_providers(registry: &SourceRegistry, requirement: &Requirement) -> Vec<Node> {
    let requirements = std::slice::from_ref(requirement);
    let mut seen: Vec<Arc<Resource>> = Vec::new();
    let mut results: Vec<Node> = Vec::new();

    for source in registry.iter() {
        let found = if let Some(workspace) = source.as_workspace_backed() {
            WorkspaceSearchAdapter::new(workspace).find_providers(requirements)
        } else if let Some(search) = source.as_provider_search() {
            search.find_providers(requirements)
        } else {
            continue;
        };

        let matches = match found {
            Ok(matches) => matches,
            Err(e) => {
                warn!(
                    source = %source.name(),
                    operation = "find_providers",
                    error = %e,
                    "Search fan-out failed for source"
                );
                continue;
            }
        };

        for providers in matches.values() {
            for provider in providers {
                if seen.iter().any(|r| Arc::ptr_eq(r, &provider.resource)) {
                    continue;
                }
                seen.push(Arc::clone(&provider.resource));
                results.push(Node::SearchResult(SearchResultNode::new(
                    Arc::clone(source),
                    Arc::clone(&provider.resource),
                )));
            }
        }
    }

    debug!(
        namespace = %requirement.namespace,
        results = results.len(),
        "Search fan-out complete"
    );
    results
}
