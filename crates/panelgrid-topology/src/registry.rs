//! Topology registry
//!
//! Provides [`TopologyRegistry`], a read-only lookup from topology id to
//! [`Topology`]. Registration order is preserved for listing.

use crate::catalog;
use crate::error::{TopologyError, TopologyResult};
use crate::topology::Topology;
use indexmap::IndexMap;
use once_cell::sync::Lazy;

static BUILTIN: Lazy<TopologyRegistry> = Lazy::new(|| {
    catalog::builtin()
        .and_then(TopologyRegistry::from_topologies)
        .unwrap_or_default()
});

/// Registry of available topologies
#[derive(Debug, Default, Clone)]
pub struct TopologyRegistry {
    topologies: IndexMap<String, Topology>,
}

impl TopologyRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            topologies: IndexMap::new(),
        }
    }

    /// The built-in catalog
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// Create registry from a list of topologies
    ///
    /// # Errors
    /// Returns `TopologyError::DuplicateId` if two entries share an id
    pub fn from_topologies(topologies: impl IntoIterator<Item = Topology>) -> TopologyResult<Self> {
        let mut registry = Self::new();
        for topology in topologies {
            registry.register(topology)?;
        }
        Ok(registry)
    }

    /// Register a topology
    ///
    /// # Errors
    /// Returns `TopologyError::DuplicateId` if the id is taken
    pub fn register(&mut self, topology: Topology) -> TopologyResult<()> {
        if self.topologies.contains_key(topology.id()) {
            return Err(TopologyError::DuplicateId(topology.id().to_string()));
        }
        self.topologies.insert(topology.id().to_string(), topology);
        Ok(())
    }

    /// Look up a topology
    ///
    /// # Errors
    /// Returns `TopologyError::NotFound` for unknown ids
    pub fn lookup(&self, id: &str) -> TopologyResult<&Topology> {
        self.topologies
            .get(id)
            .ok_or_else(|| TopologyError::NotFound(id.to_string()))
    }

    /// Check if topology exists
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.topologies.contains_key(id)
    }

    /// Registered ids in registration order
    #[must_use]
    pub fn ids(&self) -> Vec<&str> {
        self.topologies.keys().map(String::as_str).collect()
    }

    /// Iterate over topologies in registration order
    pub fn iter(&self) -> impl Iterator<Item = &Topology> {
        self.topologies.values()
    }

    /// Get number of registered topologies
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.topologies.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topologies.is_empty()
    }
}
