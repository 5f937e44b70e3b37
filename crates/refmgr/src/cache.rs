//! Per-server endpoint cache

use crate::descriptor::EndpointDescriptor;

/// Collects descriptors while a server is being resolved
#[derive(Debug)]
pub struct EndpointCacheBuilder {
    server: String,
    entries: Vec<(String, EndpointDescriptor)>,
}

impl EndpointCacheBuilder {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            entries: Vec::new(),
        }
    }

    /// Store a descriptor, replacing any earlier one for the alias
    pub fn insert(&mut self, alias: impl Into<String>, descriptor: EndpointDescriptor) {
        let alias = alias.into();
        match self.entries.iter_mut().find(|(a, _)| *a == alias) {
            Some(entry) => entry.1 = descriptor,
            None => self.entries.push((alias, descriptor)),
        }
    }

    /// Finish population; the result cannot be changed
    pub fn freeze(self) -> EndpointCache {
        EndpointCache {
            server: self.server,
            entries: self.entries,
        }
    }
}

/// Alias → descriptor mapping of one server for one generation
///
/// Read-only once frozen, so it is shared between connection threads
/// behind an `Arc` without locking.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EndpointCache {
    server: String,
    entries: Vec<(String, EndpointDescriptor)>,
}

impl EndpointCache {
    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn get(&self, alias: &str) -> Option<&EndpointDescriptor> {
        self.entries
            .iter()
            .find(|(a, _)| a == alias)
            .map(|(_, d)| d)
    }

    /// Entries in resolution order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &EndpointDescriptor)> {
        self.entries.iter().map(|(a, d)| (a.as_str(), d))
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(a, _)| a.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
