//! Object proxies and the live proxy table

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use parking_lot::Mutex;
use naming::ObjectReference;

/// Live local proxy to a remote object
///
/// Proxies are owned by exactly one connection and are not `Clone`;
/// handing one back to the runtime is the only way to release it.
#[derive(Debug)]
pub struct ObjectProxy {
    id: u64,
    reference: ObjectReference,
}

impl ObjectProxy {
    /// Proxy id, unique within its runtime
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Reference this proxy was created from
    pub fn reference(&self) -> &ObjectReference {
        &self.reference
    }

    /// `host:port` of the exporting server
    pub fn endpoint(&self) -> String {
        self.reference.endpoint()
    }

    pub fn type_id(&self) -> &str {
        &self.reference.type_id
    }

    pub fn object_key(&self) -> &[u8] {
        &self.reference.object_key
    }

    /// Both proxies designate the same remote object
    pub fn same_object(&self, other: &ObjectProxy) -> bool {
        self.reference == other.reference
    }
}

/// Proxy table entry
#[derive(Clone, Debug)]
pub struct ProxyEntry {
    pub id: u64,
    pub endpoint: String,
    pub type_id: String,
}

/// Tracks every proxy a runtime has handed out and not yet taken back
pub struct ProxyTable {
    entries: Mutex<HashMap<u64, ProxyEntry>>,
    next_id: AtomicU64,
}

impl ProxyTable {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a proxy for `reference`
    pub fn register(&self, reference: ObjectReference) -> ObjectProxy {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.lock().insert(
            id,
            ProxyEntry {
                id,
                endpoint: reference.endpoint(),
                type_id: reference.type_id.clone(),
            },
        );
        ObjectProxy { id, reference }
    }

    /// Remove a proxy; `None` if it was never registered or already removed
    pub fn remove(&self, id: u64) -> Option<ProxyEntry> {
        self.entries.lock().remove(&id)
    }

    pub fn contains(&self, id: u64) -> bool {
        self.entries.lock().contains_key(&id)
    }

    /// Snapshot of the live entries
    pub fn entries(&self) -> Vec<ProxyEntry> {
        let mut entries: Vec<_> = self.entries.lock().values().cloned().collect();
        entries.sort_by_key(|e| e.id);
        entries
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl Default for ProxyTable {
    fn default() -> Self {
        Self::new()
    }
}
