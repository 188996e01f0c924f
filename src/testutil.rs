//! Shared test stubs.

use crate::resource::{Provider, Requirement, Resource};
use crate::source::{Actionable, ProviderSearch, RemoteBrowse, Source, WorkspaceBacked};
use crate::types::Phase;
use crate::version::Version;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Configurable in-memory source used across unit tests. Optional
/// capabilities are advertised only when the matching field is set.
pub(crate) struct StubSource {
    pub name: String,
    pub ids: Vec<String>,
    pub versions: BTreeMap<String, Vec<Version>>,
    pub delay: Duration,
    pub fail_list: bool,
    pub fail_versions: bool,
    pub fail_search: bool,
    pub fail_title: bool,
    pub title_prefix: Option<String>,
    pub phases: Option<HashSet<Phase>>,
    pub providers: Option<HashMap<Requirement, Vec<Provider>>>,
    pub workspace_resources: Option<Vec<Arc<Resource>>>,
    pub remote_location: Option<String>,
    pub list_calls: AtomicUsize,
    pub title_calls: AtomicUsize,
}

impl StubSource {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ids: Vec::new(),
            versions: BTreeMap::new(),
            delay: Duration::ZERO,
            fail_list: false,
            fail_versions: false,
            fail_search: false,
            fail_title: false,
            title_prefix: None,
            phases: None,
            providers: None,
            workspace_resources: None,
            remote_location: None,
            list_calls: AtomicUsize::new(0),
            title_calls: AtomicUsize::new(0),
        }
    }
}

impl Source for StubSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn list(&self, filter: Option<&str>) -> anyhow::Result<Vec<String>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        if self.fail_list {
            anyhow::bail!("listing unavailable");
        }
        Ok(match filter {
            None => self.ids.clone(),
            Some(f) => self
                .ids
                .iter()
                .filter(|id| id.contains(f))
                .cloned()
                .collect(),
        })
    }

    fn versions(&self, id: &str) -> anyhow::Result<Vec<Version>> {
        if self.fail_versions {
            anyhow::bail!("version lookup unavailable");
        }
        Ok(self.versions.get(id).cloned().unwrap_or_default())
    }

    fn as_actionable(&self) -> Option<&dyn Actionable> {
        if self.title_prefix.is_some() || self.fail_title {
            Some(self)
        } else {
            None
        }
    }

    fn supported_phases(&self) -> Option<&HashSet<Phase>> {
        self.phases.as_ref()
    }

    fn as_provider_search(&self) -> Option<&dyn ProviderSearch> {
        self.providers.as_ref().map(|_| self as &dyn ProviderSearch)
    }

    fn as_workspace_backed(&self) -> Option<&dyn WorkspaceBacked> {
        self.workspace_resources
            .as_ref()
            .map(|_| self as &dyn WorkspaceBacked)
    }

    fn as_remote_browse(&self) -> Option<&dyn RemoteBrowse> {
        self.remote_location
            .as_ref()
            .map(|_| self as &dyn RemoteBrowse)
    }
}

impl Actionable for StubSource {
    fn title(&self, target: &[&str]) -> anyhow::Result<String> {
        self.title_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_title {
            anyhow::bail!("title unavailable");
        }
        let prefix = self.title_prefix.clone().unwrap_or_default();
        Ok(format!("{} {}", prefix, target.join(" "))
            .trim()
            .to_string())
    }

    fn tooltip(&self, target: &[&str]) -> anyhow::Result<String> {
        Ok(format!("{} ({})", target.join(" "), self.name))
    }

    fn actions(&self, _target: &[&str]) -> anyhow::Result<BTreeMap<String, String>> {
        Ok(BTreeMap::new())
    }
}

impl ProviderSearch for StubSource {
    fn find_providers(
        &self,
        requirements: &[Requirement],
    ) -> anyhow::Result<HashMap<Requirement, Vec<Provider>>> {
        if self.fail_search {
            anyhow::bail!("search backend unavailable");
        }
        let table = self.providers.clone().unwrap_or_default();
        Ok(requirements
            .iter()
            .map(|r| (r.clone(), table.get(r).cloned().unwrap_or_default()))
            .collect())
    }
}

impl WorkspaceBacked for StubSource {
    fn resources(&self) -> anyhow::Result<Vec<Arc<Resource>>> {
        Ok(self.workspace_resources.clone().unwrap_or_default())
    }
}

impl RemoteBrowse for StubSource {
    fn search_location(&self, filter: &str) -> anyhow::Result<String> {
        match &self.remote_location {
            Some(base) => Ok(format!("{}?q={}", base, filter)),
            None => anyhow::bail!("no remote search configured"),
        }
    }
}
