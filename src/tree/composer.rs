//! Typed tree composition over cached listings.
//!
//! The composer is the lazy-tree contract handed to the presentation
//! layer: elements, children, parent, and has-children over the closed
//! node variants. Listing children go through the fetch coordinator;
//! version and sub-entry children are synchronous collaborator calls that
//! degrade to empty on failure.

use crate::cache::{normalize_filter, WILDCARD_FILTER};
use crate::fetch::{FetchCoordinator, FetchOutcome, RefreshEvent};
use crate::source::{BuildDescriptions, Source, SourceRegistry};
use crate::tree::node::{
    ContinueSearchNode, EntryNode, EntryVersionNode, Node, ProjectNode, ProjectSubEntryNode,
    SourceNode,
};
use crate::types::Phase;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::warn;

/// Root input handed to [`TreeComposer::get_elements`].
pub enum Root {
    /// The top-level source registry.
    Registry,
    /// An explicit collection of nodes.
    Collection(Vec<Node>),
}

/// Composes cached fetch results and collaborator lookups into navigable
/// tree nodes.
pub struct TreeComposer {
    registry: Arc<SourceRegistry>,
    coordinator: Arc<FetchCoordinator>,
    build_descriptions: Option<Arc<dyn BuildDescriptions>>,
    filter: RwLock<String>,
    phases: HashSet<Phase>,
}

impl TreeComposer {
    pub fn new(registry: Arc<SourceRegistry>, coordinator: Arc<FetchCoordinator>) -> Self {
        Self {
            registry,
            coordinator,
            build_descriptions: None,
            filter: RwLock::new(WILDCARD_FILTER.to_string()),
            phases: HashSet::new(),
        }
    }

    /// Attach the build description collaborator used for project
    /// sub-entries.
    pub fn with_build_descriptions(mut self, port: Arc<dyn BuildDescriptions>) -> Self {
        self.build_descriptions = Some(port);
        self
    }

    /// Restrict browsing to sources declaring at least one of `phases`.
    /// An empty set means no restriction.
    pub fn with_phases(mut self, phases: HashSet<Phase>) -> Self {
        self.phases = phases;
        self
    }

    /// Update the active listing filter, normalized like cache keys.
    pub fn set_filter(&self, filter: Option<&str>) {
        *self.filter.write() = normalize_filter(filter);
    }

    pub fn current_filter(&self) -> String {
        self.filter.read().clone()
    }

    /// Refresh event stream for attached views.
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshEvent> {
        self.coordinator.subscribe()
    }

    /// Top-level elements. The registry root yields every registered
    /// source except the reserved cache source and any source outside the
    /// configured phases; explicit collections are passed through with the
    /// phase filter applied to source elements only.
    pub fn get_elements(&self, root: &Root) -> Vec<Node> {
        match root {
            Root::Registry => self
                .registry
                .browsable()
                .filter(|source| self.phase_eligible(source))
                .map(|source| Node::Source(SourceNode::new(Arc::clone(source))))
                .collect(),
            Root::Collection(nodes) => nodes
                .iter()
                .filter(|node| match node {
                    Node::Source(n) => self.phase_eligible(&n.source),
                    _ => true,
                })
                .cloned()
                .collect(),
        }
    }

    pub fn get_children(&self, node: &Node) -> Vec<Node> {
        match node {
            Node::Source(n) => self.source_children(n),
            Node::Entry(n) => self.entry_children(n),
            Node::Project(n) => self.project_children(n),
            _ => Vec::new(),
        }
    }

    pub fn get_parent(&self, node: &Node) -> Option<Node> {
        match node {
            Node::Entry(n) => Some(Node::Source(n.source_node())),
            Node::EntryVersion(n) => Some(Node::Entry(n.parent.clone())),
            Node::ProjectSubEntry(n) => Some(Node::Project(n.project.clone())),
            _ => None,
        }
    }

    pub fn has_children(&self, node: &Node) -> bool {
        matches!(node, Node::Source(_) | Node::Entry(_) | Node::Project(_))
    }

    fn phase_eligible(&self, source: &Arc<dyn Source>) -> bool {
        if self.phases.is_empty() {
            return true;
        }
        match source.supported_phases() {
            None => true,
            Some(declared) => declared.iter().any(|phase| self.phases.contains(phase)),
        }
    }

    fn source_children(&self, node: &SourceNode) -> Vec<Node> {
        let filter = self.current_filter();
        let filter = if filter == WILDCARD_FILTER {
            None
        } else {
            Some(filter.as_str())
        };

        let mut children = match self.coordinator.resolve(&node.source, filter) {
            FetchOutcome::Ready(nodes) => nodes,
            FetchOutcome::Loading => return vec![Node::Loading],
        };

        // A filtered listing on a remotely browsable source ends with an
        // offer to continue the search outside the local index.
        if let (Some(filter), Some(_)) = (filter, node.source.as_remote_browse()) {
            children.push(Node::ContinueSearch(ContinueSearchNode {
                filter: filter.to_string(),
                source: Arc::clone(&node.source),
            }));
        }
        children
    }

    fn entry_children(&self, node: &EntryNode) -> Vec<Node> {
        let mut versions = match node.source.versions(&node.id) {
            Ok(versions) => versions,
            Err(e) => {
                warn!(
                    source = %node.source.name(),
                    operation = "versions",
                    id = %node.id,
                    error = %e,
                    "Version enumeration failed"
                );
                return Vec::new();
            }
        };
        versions.sort();

        let pseudo = node.is_pseudo_identifier();
        versions
            .into_iter()
            .filter(|version| !pseudo || version.is_not_a_bundle())
            .map(|version| Node::EntryVersion(EntryVersionNode::new(node.clone(), version)))
            .collect()
    }

    fn project_children(&self, node: &ProjectNode) -> Vec<Node> {
        let Some(port) = &self.build_descriptions else {
            return Vec::new();
        };
        match port.sub_entries(&node.id) {
            Ok(ids) => ids
                .into_iter()
                .map(|id| {
                    Node::ProjectSubEntry(ProjectSubEntryNode {
                        project: node.clone(),
                        id,
                    })
                })
                .collect(),
            Err(e) => {
                warn!(project = %node.id, error = %e, "Sub-entry enumeration failed");
                Vec::new()
            }
        }
    }
}
