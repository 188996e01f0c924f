//! End-to-end browsing scenarios over the public API.

use shelf::cache::CacheStore;
use shelf::config::BrowseConfig;
use shelf::fetch::{FetchCoordinator, FetchOutcome};
use shelf::resource::{
    Capability, Requirement, Resource, IDENTITY_ID_ATTR, IDENTITY_NAMESPACE, IDENTITY_VERSION_ATTR,
};
use shelf::search;
use shelf::source::{
    Actionable, ProviderSearch, Source, SourceRegistry, WorkspaceBacked, CACHE_SOURCE_NAME,
};
use shelf::tree::node::Node;
use shelf::tree::{Root, TreeComposer};
use shelf::types::Phase;
use shelf::version::{Version, NOT_A_BUNDLE_QUALIFIER};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-memory source with configurable latency and capabilities.
struct MemorySource {
    name: String,
    entries: BTreeMap<String, Vec<Version>>,
    delay: Duration,
    phases: Option<HashSet<Phase>>,
    searchable: Option<Vec<Arc<Resource>>>,
    workspace: bool,
    list_calls: AtomicUsize,
}

impl MemorySource {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            entries: BTreeMap::new(),
            delay: Duration::ZERO,
            phases: None,
            searchable: None,
            workspace: false,
            list_calls: AtomicUsize::new(0),
        }
    }

    fn with_entry(mut self, id: &str, versions: &[Version]) -> Self {
        self.entries.insert(id.to_string(), versions.to_vec());
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn with_phases(mut self, phases: &[Phase]) -> Self {
        self.phases = Some(phases.iter().copied().collect());
        self
    }

    fn with_resources(mut self, resources: Vec<Arc<Resource>>, workspace: bool) -> Self {
        self.searchable = Some(resources);
        self.workspace = workspace;
        self
    }
}

impl Source for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn list(&self, filter: Option<&str>) -> anyhow::Result<Vec<String>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        Ok(self
            .entries
            .keys()
            .filter(|id| filter.map(|f| id.contains(f)).unwrap_or(true))
            .cloned()
            .collect())
    }

    fn versions(&self, id: &str) -> anyhow::Result<Vec<Version>> {
        self.entries
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("unknown entry {}", id))
    }

    fn supported_phases(&self) -> Option<&HashSet<Phase>> {
        self.phases.as_ref()
    }

    fn as_actionable(&self) -> Option<&dyn Actionable> {
        Some(self)
    }

    fn as_provider_search(&self) -> Option<&dyn ProviderSearch> {
        if self.searchable.is_some() && !self.workspace {
            Some(self)
        } else {
            None
        }
    }

    fn as_workspace_backed(&self) -> Option<&dyn WorkspaceBacked> {
        if self.searchable.is_some() && self.workspace {
            Some(self)
        } else {
            None
        }
    }
}

impl Actionable for MemorySource {
    fn title(&self, target: &[&str]) -> anyhow::Result<String> {
        Ok(target.join(" "))
    }

    fn tooltip(&self, target: &[&str]) -> anyhow::Result<String> {
        Ok(format!("{} ({})", target.join(" "), self.name))
    }

    fn actions(&self, _target: &[&str]) -> anyhow::Result<BTreeMap<String, String>> {
        Ok(BTreeMap::new())
    }
}

impl ProviderSearch for MemorySource {
    fn find_providers(
        &self,
        requirements: &[Requirement],
    ) -> anyhow::Result<HashMap<Requirement, Vec<shelf::resource::Provider>>> {
        let resources = self.searchable.clone().unwrap_or_default();
        let mut matches: HashMap<Requirement, Vec<shelf::resource::Provider>> = HashMap::new();
        for requirement in requirements {
            let entry = matches.entry(requirement.clone()).or_default();
            for resource in &resources {
                for capability in &resource.capabilities {
                    if capability.satisfies(requirement) {
                        entry.push(shelf::resource::Provider {
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

impl WorkspaceBacked for MemorySource {
    fn resources(&self) -> anyhow::Result<Vec<Arc<Resource>>> {
        Ok(self.searchable.clone().unwrap_or_default())
    }
}

fn composer_for(registry: SourceRegistry, wait_ms: u64) -> (TreeComposer, Arc<FetchCoordinator>) {
    let coordinator = Arc::new(
        FetchCoordinator::new(Arc::new(CacheStore::new()), Duration::from_millis(wait_ms)).unwrap(),
    );
    let composer = TreeComposer::new(Arc::new(registry), Arc::clone(&coordinator));
    (composer, coordinator)
}

fn labels(nodes: &[Node]) -> Vec<String> {
    nodes.iter().map(|n| n.label()).collect()
}

#[test]
fn browse_sources_entries_and_versions() {
    let source = MemorySource::new("central")
        .with_entry("org.acme.util", &[Version::new(1, 0, 0)])
        .with_entry(
            "org.acme.core",
            &[Version::new(2, 1, 0), Version::new(1, 0, 0)],
        );
    let mut registry = SourceRegistry::new();
    registry.register(Arc::new(source));
    let (composer, _) = composer_for(registry, 1_000);

    let elements = composer.get_elements(&Root::Registry);
    assert_eq!(labels(&elements), vec!["central"]);
    assert!(composer.has_children(&elements[0]));

    let entries = composer.get_children(&elements[0]);
    assert_eq!(labels(&entries), vec!["org.acme.core", "org.acme.util"]);

    let versions = composer.get_children(&entries[0]);
    assert_eq!(labels(&versions), vec!["org.acme.core 1.0.0", "org.acme.core 2.1.0"]);

    // Parent chain leads back through the entry to the source.
    let parent = composer.get_parent(&versions[0]).unwrap();
    assert_eq!(parent, entries[0]);
    let grandparent = composer.get_parent(&parent).unwrap();
    assert_eq!(grandparent, elements[0]);
    assert!(composer.get_parent(&grandparent).is_none());
}

#[test]
fn cold_fetch_shows_placeholder_until_refresh() {
    let source = MemorySource::new("slow")
        .with_entry("b.bundle", &[])
        .with_entry("a.bundle", &[])
        .with_delay(Duration::from_millis(250));
    let mut registry = SourceRegistry::new();
    registry.register(Arc::new(source));
    let (composer, _) = composer_for(registry, 30);

    let mut refresh = composer.subscribe();
    let elements = composer.get_elements(&Root::Registry);

    let children = composer.get_children(&elements[0]);
    assert_eq!(children, vec![Node::Loading]);
    assert_eq!(children[0].label(), "Loading…");

    let event = refresh.blocking_recv().unwrap();
    assert_eq!(event.source, "slow");

    let children = composer.get_children(&elements[0]);
    assert_eq!(labels(&children), vec!["a.bundle", "b.bundle"]);

    // Stable order on repeated expansion of the populated slot.
    assert_eq!(composer.get_children(&elements[0]), children);
}

#[test]
fn pseudo_identifier_lists_only_non_bundle_versions() {
    let source = MemorySource::new("maven").with_entry(
        "org.acme:widget",
        &[
            Version::new(3, 0, 0),
            Version::with_qualifier(3, 1, 0, NOT_A_BUNDLE_QUALIFIER),
        ],
    );
    let mut registry = SourceRegistry::new();
    registry.register(Arc::new(source));
    let (composer, _) = composer_for(registry, 1_000);

    let elements = composer.get_elements(&Root::Registry);
    let entries = composer.get_children(&elements[0]);
    let versions = composer.get_children(&entries[0]);

    assert_eq!(versions.len(), 1);
    match &versions[0] {
        Node::EntryVersion(n) => assert!(n.version.is_not_a_bundle()),
        other => panic!("expected entry version, got {:?}", other),
    }
}

#[test]
fn registry_root_hides_cache_source_and_filters_phases() {
    let mut registry = SourceRegistry::new();
    registry.register(Arc::new(MemorySource::new("central")));
    registry.register(Arc::new(MemorySource::new(CACHE_SOURCE_NAME)));
    registry.register(Arc::new(
        MemorySource::new("test-only").with_phases(&[Phase::Test]),
    ));

    let coordinator = Arc::new(
        FetchCoordinator::with_config(Arc::new(CacheStore::new()), &BrowseConfig::default())
            .unwrap(),
    );
    let composer = TreeComposer::new(Arc::new(registry), coordinator)
        .with_phases([Phase::Build].into_iter().collect());

    let elements = composer.get_elements(&Root::Registry);
    assert_eq!(labels(&elements), vec!["central"]);
}

#[test]
fn offline_mode_serves_hits_and_skips_fetches() {
    let source = Arc::new(MemorySource::new("central").with_entry("a.bundle", &[]));
    let mut registry = SourceRegistry::new();
    registry.register(Arc::clone(&source) as Arc<dyn Source>);
    let (composer, coordinator) = composer_for(registry, 1_000);

    let elements = composer.get_elements(&Root::Registry);
    // Populate the wildcard slot while online.
    assert_eq!(labels(&composer.get_children(&elements[0])), vec!["a.bundle"]);

    coordinator.set_offline(true);
    // The populated slot still serves.
    assert_eq!(labels(&composer.get_children(&elements[0])), vec!["a.bundle"]);
    // A new filter misses and resolves empty without a listing call.
    let calls_before = source.list_calls.load(Ordering::SeqCst);
    composer.set_filter(Some("zz"));
    assert!(composer.get_children(&elements[0]).is_empty());
    assert_eq!(source.list_calls.load(Ordering::SeqCst), calls_before);
}

#[test]
fn invalidation_forces_refetch() {
    let source = Arc::new(MemorySource::new("central").with_entry("a.bundle", &[]));
    let mut registry = SourceRegistry::new();
    registry.register(Arc::clone(&source) as Arc<dyn Source>);
    let (composer, coordinator) = composer_for(registry, 1_000);

    let elements = composer.get_elements(&Root::Registry);
    composer.get_children(&elements[0]);
    composer.get_children(&elements[0]);
    assert_eq!(source.list_calls.load(Ordering::SeqCst), 1);

    coordinator.invalidate("central");
    composer.get_children(&elements[0]);
    assert_eq!(source.list_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn search_fans_out_and_dedups_across_sources() {
    fn resource(id: &str, version: &str, object_class: &str) -> Arc<Resource> {
        Arc::new(Resource::new(vec![
            Capability::new(IDENTITY_NAMESPACE)
                .with_attribute(IDENTITY_ID_ATTR, id)
                .with_attribute(IDENTITY_VERSION_ATTR, version),
            Capability::new("service").with_attribute("objectClass", object_class),
        ]))
    }

    let shared = resource("org.acme.shared", "1.0.0", "runner");
    let workspace_only = resource("org.acme.local", "0.1.0", "runner");

    let mut registry = SourceRegistry::new();
    registry.register(Arc::new(MemorySource::new("remote").with_resources(
        vec![Arc::clone(&shared), resource("org.acme.other", "2.0.0", "walker")],
        false,
    )));
    registry.register(Arc::new(MemorySource::new("workspace").with_resources(
        vec![Arc::clone(&shared), Arc::clone(&workspace_only)],
        true,
    )));

    let requirement = Requirement::new("service").with_attribute("objectClass", "runner");
    let results = search::find_providers(&registry, &requirement);

    // The shared resource surfaces once even though two sources matched it.
    assert_eq!(results.len(), 2);
    let ids: Vec<String> = results
        .iter()
        .map(|n| match n {
            Node::SearchResult(n) => n.resource().identity().unwrap().0,
            other => panic!("expected search result, got {:?}", other),
        })
        .collect();
    assert_eq!(ids, vec!["org.acme.shared", "org.acme.local"]);

    // Derived entry-version nodes carry parsed identity and version.
    match &results[1] {
        Node::SearchResult(n) => {
            let derived = n.version_node().unwrap();
            assert_eq!(derived.parent.id, "org.acme.local");
            assert_eq!(derived.version, Version::new(0, 1, 0));
        }
        other => panic!("expected search result, got {:?}", other),
    }
}

#[test]
fn filtered_listings_use_distinct_cache_slots() {
    let source = MemorySource::new("central")
        .with_entry("http.client", &[])
        .with_entry("http.server", &[])
        .with_entry("io.core", &[]);
    let mut registry = SourceRegistry::new();
    registry.register(Arc::new(source));
    let (composer, coordinator) = composer_for(registry, 1_000);

    let elements = composer.get_elements(&Root::Registry);
    assert_eq!(composer.get_children(&elements[0]).len(), 3);

    composer.set_filter(Some("http"));
    assert_eq!(
        labels(&composer.get_children(&elements[0])),
        vec!["http.client", "http.server"]
    );

    composer.set_filter(None);
    assert_eq!(composer.get_children(&elements[0]).len(), 3);
    assert_eq!(coordinator.cache().len(), 2);
}

#[test]
fn direct_resolve_matches_tree_contract() {
    let source: Arc<dyn Source> = Arc::new(
        MemorySource::new("central")
            .with_entry("b.bundle", &[])
            .with_entry("a.bundle", &[]),
    );
    let coordinator =
        FetchCoordinator::new(Arc::new(CacheStore::new()), Duration::from_millis(1_000)).unwrap();

    match coordinator.resolve(&source, None) {
        FetchOutcome::Ready(nodes) => {
            assert_eq!(labels(&nodes), vec!["a.bundle", "b.bundle"]);
        }
        FetchOutcome::Loading => panic!("expected synchronous result"),
    }
}
