//! Directory contents: naming contexts and their leaf bindings

use std::collections::HashMap;
use tracing::debug;
use crate::error::{NamingError, Result};
use crate::name::Name;
use crate::reference::ObjectReference;

/// Bindings held by a directory, keyed by context then leaf
#[derive(Debug, Default)]
pub struct NamingRegistry {
    contexts: HashMap<String, HashMap<String, ObjectReference>>,
}

impl NamingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a reference under a name
    ///
    /// Without `rebind` an existing binding is left untouched and
    /// `AlreadyBound` is returned.
    pub fn bind(&mut self, name: Name, reference: ObjectReference, rebind: bool) -> Result<()> {
        reference.validate()?;
        let context = self.contexts.entry(name.context.clone()).or_default();
        if !rebind && context.contains_key(&name.leaf) {
            return Err(NamingError::AlreadyBound(name.to_string()));
        }
        debug!("Directory: binding {} -> {}", name, reference);
        context.insert(name.leaf, reference);
        Ok(())
    }

    /// Remove a binding; an emptied context is dropped as well
    pub fn unbind(&mut self, name: &Name) -> Result<ObjectReference> {
        let context = self
            .contexts
            .get_mut(&name.context)
            .ok_or_else(|| NamingError::NotFound(name.to_string()))?;
        let reference = context
            .remove(&name.leaf)
            .ok_or_else(|| NamingError::NotFound(name.to_string()))?;
        if context.is_empty() {
            self.contexts.remove(&name.context);
        }
        debug!("Directory: unbound {}", name);
        Ok(reference)
    }

    /// Look up the reference bound under a name
    pub fn resolve(&self, name: &Name) -> Option<&ObjectReference> {
        self.contexts.get(&name.context)?.get(&name.leaf)
    }

    /// All bindings of a context, sorted by leaf
    pub fn list(&self, context: &str) -> Vec<(String, ObjectReference)> {
        let mut entries: Vec<_> = self
            .contexts
            .get(context)
            .map(|c| c.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Total number of bindings
    pub fn len(&self) -> usize {
        self.contexts.values().map(|c| c.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}
