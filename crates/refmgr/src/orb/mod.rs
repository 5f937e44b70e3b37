//! Concrete runtime over the `naming` directory protocol
//!
//! Handles are [`ObjectProxy`] values created from stringified object
//! references; the directory is reached with a [`naming::NamingClient`]
//! driven by a Tokio runtime the [`OrbRuntime`] owns.

mod directory;
mod proxy;
mod runtime;

use std::time::Duration;
use tracing::debug;
use crate::error::{RefError, Result};
use crate::runtime::RuntimeFactory;

pub use directory::RemoteDirectory;
pub use proxy::{ObjectProxy, ProxyEntry, ProxyTable};
pub use runtime::OrbRuntime;

/// Configuration for the object runtime
#[derive(Clone, Debug)]
pub struct OrbConfig {
    /// Tokio worker threads driving network I/O
    pub worker_threads: usize,
    /// Bound on resolving and connecting to the directory
    pub connect_timeout: Duration,
    /// Bound on each directory request
    pub call_timeout: Duration,
}

impl Default for OrbConfig {
    fn default() -> Self {
        Self {
            worker_threads: 2,
            connect_timeout: Duration::from_secs(5),
            call_timeout: Duration::from_secs(5),
        }
    }
}

impl OrbConfig {
    pub fn with_worker_threads(mut self, threads: usize) -> Self {
        self.worker_threads = threads.max(1);
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}

/// Builds an [`OrbRuntime`] for every generation
#[derive(Clone, Debug, Default)]
pub struct OrbRuntimeFactory {
    config: OrbConfig,
}

impl OrbRuntimeFactory {
    pub fn new(config: OrbConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OrbConfig {
        &self.config
    }
}

impl RuntimeFactory for OrbRuntimeFactory {
    type Runtime = OrbRuntime;

    fn init(&self) -> Result<OrbRuntime> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.worker_threads.max(1))
            .thread_name("refmgr-orb")
            .enable_all()
            .build()
            .map_err(|e| RefError::RuntimeInitFailed(e.to_string()))?;
        debug!(
            "object runtime started with {} worker thread(s)",
            self.config.worker_threads
        );
        Ok(OrbRuntime::new(runtime, self.config.clone()))
    }
}
