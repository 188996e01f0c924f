//! Tree node variants.
//!
//! Nodes are immutable value objects; every fetch rebuilds them rather
//! than mutating in place. Equality is by identity fields (source name,
//! entry id, version) so a rebuilt node still matches its predecessor in
//! the presentation layer.

use crate::resource::Resource;
use crate::source::Source;
use crate::tree::resolver::{Strategy, VersionResolver};
use crate::version::Version;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Text shown for the loading placeholder.
pub const LOADING_LABEL: &str = "Loading…";

/// Separator marking a group:artifact pseudo-identifier.
pub const PSEUDO_ID_SEPARATOR: char = ':';

/// Closed set of node variants composing the browse tree.
#[derive(Debug, Clone)]
pub enum Node {
    Source(SourceNode),
    Entry(EntryNode),
    EntryVersion(EntryVersionNode),
    Project(ProjectNode),
    ProjectSubEntry(ProjectSubEntryNode),
    SearchResult(SearchResultNode),
    ContinueSearch(ContinueSearchNode),
    Loading,
}

impl Node {
    /// Presentation text for this node.
    pub fn label(&self) -> String {
        match self {
            Node::Source(n) => n.source.name().to_string(),
            Node::Entry(n) => n.id.clone(),
            Node::EntryVersion(n) => n.label(),
            Node::Project(n) => n.id.clone(),
            Node::ProjectSubEntry(n) => n.id.clone(),
            Node::SearchResult(n) => n.label(),
            Node::ContinueSearch(n) => {
                format!("Continue search \"{}\" on {}", n.filter, n.source.name())
            }
            Node::Loading => LOADING_LABEL.to_string(),
        }
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Node::Source(a), Node::Source(b)) => a == b,
            (Node::Entry(a), Node::Entry(b)) => a == b,
            (Node::EntryVersion(a), Node::EntryVersion(b)) => a == b,
            (Node::Project(a), Node::Project(b)) => a == b,
            (Node::ProjectSubEntry(a), Node::ProjectSubEntry(b)) => a == b,
            (Node::SearchResult(a), Node::SearchResult(b)) => a == b,
            (Node::ContinueSearch(a), Node::ContinueSearch(b)) => a == b,
            (Node::Loading, Node::Loading) => true,
            _ => false,
        }
    }
}

impl Eq for Node {}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// A registered source at the top level of the tree.
#[derive(Clone)]
pub struct SourceNode {
    pub source: Arc<dyn Source>,
}

impl SourceNode {
    pub fn new(source: Arc<dyn Source>) -> Self {
        Self { source }
    }
}

impl PartialEq for SourceNode {
    fn eq(&self, other: &Self) -> bool {
        self.source.name() == other.source.name()
    }
}

impl Eq for SourceNode {}

impl fmt::Debug for SourceNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceNode")
            .field("source", &self.source.name())
            .finish()
    }
}

/// One listed entry of a source.
#[derive(Clone)]
pub struct EntryNode {
    pub source: Arc<dyn Source>,
    pub id: String,
}

impl EntryNode {
    pub fn new(source: Arc<dyn Source>, id: impl Into<String>) -> Self {
        Self {
            source,
            id: id.into(),
        }
    }

    /// True for group:artifact pseudo-identifiers, which are listed but
    /// are not real bundles themselves.
    pub fn is_pseudo_identifier(&self) -> bool {
        self.id.contains(PSEUDO_ID_SEPARATOR)
    }

    pub fn source_node(&self) -> SourceNode {
        SourceNode::new(Arc::clone(&self.source))
    }

    /// Resolver computing this entry's highest known version on demand.
    pub fn highest_version_resolver(&self) -> VersionResolver {
        let source = Arc::clone(&self.source);
        let id = self.id.clone();
        VersionResolver::new(
            Strategy::Highest,
            Arc::clone(&self.source),
            self.id.clone(),
            String::new(),
            move || Ok(source.versions(&id)?.into_iter().max()),
        )
    }
}

impl PartialEq for EntryNode {
    fn eq(&self, other: &Self) -> bool {
        self.source.name() == other.source.name() && self.id == other.id
    }
}

impl Eq for EntryNode {}

impl fmt::Debug for EntryNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryNode")
            .field("source", &self.source.name())
            .field("id", &self.id)
            .finish()
    }
}

/// One version of one entry. Owns its resolver; both die with the node.
#[derive(Clone)]
pub struct EntryVersionNode {
    pub parent: EntryNode,
    pub version: Version,
    resolver: Arc<VersionResolver>,
}

impl EntryVersionNode {
    pub fn new(parent: EntryNode, version: Version) -> Self {
        let exact = version.clone();
        let resolver = Arc::new(VersionResolver::new(
            Strategy::Exact,
            Arc::clone(&parent.source),
            parent.id.clone(),
            version.to_string(),
            move || Ok(Some(exact)),
        ));
        Self {
            parent,
            version,
            resolver,
        }
    }

    pub fn resolver(&self) -> &VersionResolver {
        &self.resolver
    }

    pub fn label(&self) -> String {
        self.resolver.label()
    }
}

impl PartialEq for EntryVersionNode {
    fn eq(&self, other: &Self) -> bool {
        self.parent == other.parent && self.version == other.version
    }
}

impl Eq for EntryVersionNode {}

impl fmt::Debug for EntryVersionNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryVersionNode")
            .field("source", &self.parent.source.name())
            .field("id", &self.parent.id)
            .field("version", &self.version)
            .finish()
    }
}

/// A workspace project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectNode {
    pub id: String,
}

/// A sub-entry of a workspace project, from its build description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSubEntryNode {
    pub project: ProjectNode,
    pub id: String,
}

/// One deduplicated resource matched by a requirement search.
#[derive(Clone)]
pub struct SearchResultNode {
    source: Arc<dyn Source>,
    resource: Arc<Resource>,
    derived: Arc<OnceLock<Option<EntryVersionNode>>>,
}

impl SearchResultNode {
    pub fn new(source: Arc<dyn Source>, resource: Arc<Resource>) -> Self {
        Self {
            source,
            resource,
            derived: Arc::new(OnceLock::new()),
        }
    }

    pub fn resource(&self) -> &Arc<Resource> {
        &self.resource
    }

    /// The entry-version view of this result, derived once from the
    /// resource's declared identity capability. A resource without a
    /// version still yields a node carrying the empty version.
    pub fn version_node(&self) -> Option<EntryVersionNode> {
        self.derived
            .get_or_init(|| {
                self.resource.identity().map(|(id, version)| {
                    EntryVersionNode::new(EntryNode::new(Arc::clone(&self.source), id), version)
                })
            })
            .clone()
    }

    fn label(&self) -> String {
        match self.resource.identity() {
            Some((id, version)) => format!("{} {}", id, version),
            None => "unidentified resource".to_string(),
        }
    }
}

impl PartialEq for SearchResultNode {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.resource, &other.resource)
    }
}

impl Eq for SearchResultNode {}

impl fmt::Debug for SearchResultNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SearchResultNode")
            .field("source", &self.source.name())
            .field("identity", &self.resource.identity())
            .finish()
    }
}

/// Offer to continue a filtered search beyond the local listing.
#[derive(Clone)]
pub struct ContinueSearchNode {
    pub filter: String,
    pub source: Arc<dyn Source>,
}

impl PartialEq for ContinueSearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.filter == other.filter && self.source.name() == other.source.name()
    }
}

impl Eq for ContinueSearchNode {}

impl fmt::Debug for ContinueSearchNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContinueSearchNode")
            .field("filter", &self.filter)
            .field("source", &self.source.name())
            .finish()
    }
}
