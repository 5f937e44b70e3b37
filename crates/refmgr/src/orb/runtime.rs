//! Tokio-backed object runtime

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use parking_lot::Mutex;
use tokio::runtime::{Handle, Runtime};
use tracing::{debug, warn};
use naming::{NamingClient, NamingError, ObjectReference};
use crate::config::DirectoryLocation;
use crate::descriptor::EndpointDescriptor;
use crate::error::{RefError, Result};
use crate::runtime::ObjectRuntime;
use super::directory::RemoteDirectory;
use super::proxy::{ObjectProxy, ProxyEntry, ProxyTable};
use super::OrbConfig;

/// How long shutdown waits for in-flight directory calls
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Object runtime owning a Tokio runtime for its network I/O
///
/// Every operation blocks the calling thread until its I/O completes, so
/// none of them may be called from inside an async task of this runtime.
pub struct OrbRuntime {
    runtime: Mutex<Option<Runtime>>,
    handle: Handle,
    config: OrbConfig,
    proxies: ProxyTable,
    closed: AtomicBool,
}

impl OrbRuntime {
    pub(crate) fn new(runtime: Runtime, config: OrbConfig) -> Self {
        Self {
            handle: runtime.handle().clone(),
            runtime: Mutex::new(Some(runtime)),
            config,
            proxies: ProxyTable::new(),
            closed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &OrbConfig {
        &self.config
    }

    /// Number of proxies handed out and not yet released
    pub fn live_proxies(&self) -> usize {
        self.proxies.len()
    }

    /// Snapshot of the live proxies
    pub fn proxy_entries(&self) -> Vec<ProxyEntry> {
        self.proxies.entries()
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(RefError::RuntimeShutDown);
        }
        Ok(())
    }

    async fn connect(&self, location: &DirectoryLocation) -> std::result::Result<NamingClient, NamingError> {
        let addrs: Vec<SocketAddr> = tokio::time::timeout(
            self.config.connect_timeout,
            tokio::net::lookup_host((location.host.as_str(), location.port)),
        )
        .await
        .map_err(|_| NamingError::Timeout)??
        .collect();

        let mut last_error = NamingError::ConnectionClosed;
        for addr in addrs {
            match NamingClient::connect_with_timeout(
                addr,
                self.config.connect_timeout,
                self.config.call_timeout,
            )
            .await
            {
                Ok(client) => return Ok(client),
                Err(e) => {
                    debug!("naming directory candidate {} failed: {}", addr, e);
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }
}

impl ObjectRuntime for OrbRuntime {
    type Handle = ObjectProxy;
    type Directory = RemoteDirectory;

    fn open_directory(&self, location: &DirectoryLocation) -> Result<RemoteDirectory> {
        self.ensure_open()?;
        let client = self
            .handle
            .block_on(self.connect(location))
            .map_err(|e| RefError::DirectoryUnavailable {
                location: location.to_string(),
                reason: e.to_string(),
            })?;
        debug!("naming directory reference for {} acquired", location);
        Ok(RemoteDirectory::new(client, self.handle.clone()))
    }

    fn endpoint_to_handle(&self, descriptor: &EndpointDescriptor) -> Result<ObjectProxy> {
        self.ensure_open()?;
        let reference = ObjectReference::parse_stringified(descriptor.as_str())
            .map_err(|e| RefError::InvalidDescriptor(e.to_string()))?;
        Ok(self.proxies.register(reference))
    }

    fn release(&self, handle: ObjectProxy) -> Result<()> {
        self.proxies
            .remove(handle.id())
            .map(|_| ())
            .ok_or_else(|| RefError::Release(format!("proxy {} is not live", handle.id())))
    }

    fn shutdown(&self) -> Result<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(RefError::RuntimeShutDown);
        }

        let live = self.proxy_entries();
        if !live.is_empty() {
            warn!("runtime shutting down with {} live proxies", live.len());
            for entry in &live {
                debug!("live proxy {}: {} at {}", entry.id, entry.type_id, entry.endpoint);
            }
        }

        let runtime = self.runtime.lock().take().ok_or(RefError::RuntimeShutDown)?;
        // Blocking on the worker threads is not allowed from async code
        if Handle::try_current().is_ok() {
            debug!("runtime released from an async context, shutting down in background");
            runtime.shutdown_background();
        } else {
            runtime.shutdown_timeout(SHUTDOWN_GRACE);
        }
        Ok(())
    }
}
