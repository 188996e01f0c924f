//! Requirement, capability, and resource descriptors used by search fan-out.
//!
//! A requirement names a namespace plus attribute constraints; a capability
//! declares a namespace plus attribute values owned by a resource. Resources
//! always travel behind `Arc`; search deduplication is by that identity.

use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Namespace under which resources declare their identity.
pub const IDENTITY_NAMESPACE: &str = "identity";

/// Identity attribute carrying the entry identifier.
pub const IDENTITY_ID_ATTR: &str = "id";

/// Identity attribute carrying the entry version.
pub const IDENTITY_VERSION_ATTR: &str = "version";

/// A need to be satisfied: a namespace and the attribute values a matching
/// capability must declare.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Requirement {
    pub namespace: String,
    pub attributes: BTreeMap<String, String>,
}

impl Requirement {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }
}

/// A declared capability of a resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capability {
    pub namespace: String,
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Capability {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Attribute rendered as a plain string, for matching and display.
    pub fn attribute_str(&self, key: &str) -> Option<String> {
        self.attributes.get(key).map(|value| match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Whether this capability satisfies the requirement: same namespace,
    /// and every required attribute present with an equal value.
    pub fn satisfies(&self, requirement: &Requirement) -> bool {
        if self.namespace != requirement.namespace {
            return false;
        }
        requirement
            .attributes
            .iter()
            .all(|(key, want)| self.attribute_str(key).as_deref() == Some(want.as_str()))
    }
}

/// A resource: the owner of a set of declared capabilities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub capabilities: Vec<Capability>,
}

impl Resource {
    pub fn new(capabilities: Vec<Capability>) -> Self {
        Self { capabilities }
    }

    /// Entry identifier and version declared under the identity namespace.
    /// A missing or unparseable version attribute yields [`Version::EMPTY`],
    /// never an absent version.
    pub fn identity(&self) -> Option<(String, Version)> {
        let capability = self
            .capabilities
            .iter()
            .find(|c| c.namespace == IDENTITY_NAMESPACE)?;
        let id = capability.attribute_str(IDENTITY_ID_ATTR)?;
        let version = capability
            .attribute_str(IDENTITY_VERSION_ATTR)
            .and_then(|raw| Version::parse(&raw).ok())
            .unwrap_or(Version::EMPTY);
        Some((id, version))
    }
}

/// A matched capability together with its owning resource.
#[derive(Debug, Clone)]
pub struct Provider {
    pub capability: Capability,
    pub resource: Arc<Resource>,
}
