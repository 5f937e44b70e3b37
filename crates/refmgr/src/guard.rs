//! Release guard for materialized handles

use std::fmt;
use tracing::{debug, error};
use crate::error::Result;
use crate::runtime::{ObjectRuntime, RuntimeHandle};

/// Identifier of a client connection
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owns one handle and releases it exactly once
///
/// The guard keeps the runtime alive, so a handle can never outlive the
/// runtime that created it.
pub struct ReleaseGuard<R: ObjectRuntime> {
    runtime: RuntimeHandle<R>,
    alias: String,
    conn: ConnectionId,
    handle: Option<R::Handle>,
}

impl<R: ObjectRuntime> ReleaseGuard<R> {
    pub fn new(
        runtime: RuntimeHandle<R>,
        alias: impl Into<String>,
        conn: ConnectionId,
        handle: R::Handle,
    ) -> Self {
        Self {
            runtime,
            alias: alias.into(),
            conn,
            handle: Some(handle),
        }
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.conn
    }

    /// The guarded handle, `None` once released
    pub fn handle(&self) -> Option<&R::Handle> {
        self.handle.as_ref()
    }

    /// Release now instead of at drop
    pub fn release(mut self) -> Result<()> {
        self.release_once()
    }

    fn release_once(&mut self) -> Result<()> {
        let Some(handle) = self.handle.take() else {
            return Ok(());
        };
        match self.runtime.release(handle) {
            Ok(()) => {
                debug!(
                    "reference with alias '{}', belonging to connection {} was released",
                    self.alias, self.conn
                );
                Ok(())
            }
            Err(e) => {
                error!(
                    "failed to release reference with alias '{}', belonging to connection {}: {}",
                    self.alias, self.conn, e
                );
                Err(e)
            }
        }
    }
}

impl<R: ObjectRuntime> Drop for ReleaseGuard<R> {
    fn drop(&mut self) {
        let _ = self.release_once();
    }
}

impl<R: ObjectRuntime> fmt::Debug for ReleaseGuard<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseGuard")
            .field("alias", &self.alias)
            .field("conn", &self.conn)
            .field("released", &self.handle.is_none())
            .finish()
    }
}
