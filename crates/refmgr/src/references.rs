//! Per-connection reference set
//!
//! Built when a connection starts, read by other components while it lasts,
//! and released when it ends. Other components only get shared access, so
//! a handle borrowed from the set cannot outlive it.

use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;
use crate::guard::{ConnectionId, ReleaseGuard};
use crate::runtime::ObjectRuntime;

/// Connection lifecycle as seen by the manager
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionPhase {
    Start,
    Building,
    Ready,
    Releasing,
    Done,
}

impl fmt::Display for ConnectionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Start => "start",
            Self::Building => "building",
            Self::Ready => "ready",
            Self::Releasing => "releasing",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Outcome of releasing a reference set
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReleaseReport {
    pub released: usize,
    pub failed: usize,
}

/// Alias → live handle mapping of one connection
pub struct ConnectionReferences<R: ObjectRuntime> {
    conn: ConnectionId,
    server: String,
    guards: BTreeMap<String, ReleaseGuard<R>>,
    phase: ConnectionPhase,
}

impl<R: ObjectRuntime> ConnectionReferences<R> {
    pub(crate) fn new(server: impl Into<String>, conn: ConnectionId) -> Self {
        let mut set = Self {
            conn,
            server: server.into(),
            guards: BTreeMap::new(),
            phase: ConnectionPhase::Start,
        };
        set.enter(ConnectionPhase::Building);
        set
    }

    /// Add an already guarded handle
    pub(crate) fn insert(&mut self, guard: ReleaseGuard<R>) {
        // An alias maps to one handle; the displaced guard releases on drop
        self.guards.insert(guard.alias().to_string(), guard);
    }

    pub(crate) fn finish(mut self) -> Self {
        self.enter(ConnectionPhase::Ready);
        self
    }

    fn enter(&mut self, phase: ConnectionPhase) {
        debug!(
            "connection {} on server {}: {} -> {}",
            self.conn, self.server, self.phase, phase
        );
        self.phase = phase;
    }

    /// Handle published under `alias`
    pub fn get(&self, alias: &str) -> Option<&R::Handle> {
        self.guards.get(alias).and_then(|g| g.handle())
    }

    pub fn contains(&self, alias: &str) -> bool {
        self.guards.contains_key(alias)
    }

    /// Published aliases, sorted
    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.guards.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.conn
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn phase(&self) -> ConnectionPhase {
        self.phase
    }

    /// Release every handle now
    pub fn close(mut self) -> ReleaseReport {
        self.release_all()
    }

    fn release_all(&mut self) -> ReleaseReport {
        let mut report = ReleaseReport::default();
        if self.phase == ConnectionPhase::Done {
            return report;
        }

        self.enter(ConnectionPhase::Releasing);
        for (_, guard) in std::mem::take(&mut self.guards) {
            match guard.release() {
                Ok(()) => report.released += 1,
                Err(_) => report.failed += 1,
            }
        }
        self.enter(ConnectionPhase::Done);
        report
    }
}

impl<R: ObjectRuntime> Drop for ConnectionReferences<R> {
    fn drop(&mut self) {
        self.release_all();
    }
}

impl<R: ObjectRuntime> fmt::Debug for ConnectionReferences<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionReferences")
            .field("conn", &self.conn)
            .field("server", &self.server)
            .field("aliases", &self.guards.keys().collect::<Vec<_>>())
            .field("phase", &self.phase)
            .finish()
    }
}
