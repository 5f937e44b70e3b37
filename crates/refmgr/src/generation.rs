//! Host lifecycle hooks
//!
//! A host drives the manager through four events:
//!
//! 1. configuration finalized: [`ReferenceModule::post_config`] builds a
//!    [`Generation`], initializing the runtime and resolving every enabled
//!    server;
//! 2. connection started: [`Generation::process_connection`] returns the
//!    connection's reference set;
//! 3. connection ended: the set is closed or dropped;
//! 4. configuration discarded: [`Generation::shutdown`] (or drop).

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use crate::cache::EndpointCache;
use crate::config::{ResolutionMode, ServerReferenceConfig};
use crate::error::Result;
use crate::factory::{materialize, MaterializeStrategy};
use crate::guard::ConnectionId;
use crate::references::ConnectionReferences;
use crate::resolver::resolve_all;
use crate::runtime::{ObjectRuntime, RuntimeFactory, RuntimeHandle, RuntimeManager};

/// Lifecycle of a configuration generation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GenerationState {
    Uninitialized,
    RuntimeReady,
    CachesPopulated,
    Serving,
    ShuttingDown,
    TornDown,
}

impl fmt::Display for GenerationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::RuntimeReady => "runtime ready",
            Self::CachesPopulated => "caches populated",
            Self::Serving => "serving",
            Self::ShuttingDown => "shutting down",
            Self::TornDown => "torn down",
        };
        f.write_str(name)
    }
}

/// Per-server state of an enabled server
#[derive(Clone, Debug)]
pub struct ServerReferences {
    pub name: String,
    pub strategy: MaterializeStrategy,
    /// Number of configured managed objects
    pub configured: usize,
}

/// One configuration generation: its runtime and its enabled servers
pub struct Generation<R: ObjectRuntime> {
    id: u64,
    runtime: Option<RuntimeHandle<R>>,
    servers: HashMap<String, ServerReferences>,
    state: GenerationState,
    next_conn: AtomicU64,
}

impl<R: ObjectRuntime> Generation<R> {
    fn new(id: u64) -> Self {
        Self {
            id,
            runtime: None,
            servers: HashMap::new(),
            state: GenerationState::Uninitialized,
            next_conn: AtomicU64::new(1),
        }
    }

    fn enter(&mut self, state: GenerationState) {
        debug!("generation {}: {} -> {}", self.id, self.state, state);
        self.state = state;
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn state(&self) -> GenerationState {
        self.state
    }

    pub fn runtime(&self) -> Option<&RuntimeHandle<R>> {
        self.runtime.as_ref()
    }

    /// State of an enabled server
    pub fn server(&self, name: &str) -> Option<&ServerReferences> {
        self.servers.get(name)
    }

    /// Names of the enabled servers
    pub fn servers(&self) -> impl Iterator<Item = &str> {
        self.servers.keys().map(String::as_str)
    }

    /// Frozen cache of a server in cached mode
    pub fn cache(&self, server: &str) -> Option<&EndpointCache> {
        match &self.servers.get(server)?.strategy {
            MaterializeStrategy::Cached(cache) => Some(&**cache),
            MaterializeStrategy::Direct { .. } => None,
        }
    }

    /// Allocate a fresh connection id
    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId(self.next_conn.fetch_add(1, Ordering::Relaxed))
    }

    /// Build the reference set of a new connection
    ///
    /// Returns `None` when the server is unknown or not enabled; the
    /// connection then proceeds without published references.
    pub fn process_connection(
        &self,
        server: &str,
        conn: ConnectionId,
    ) -> Option<ConnectionReferences<R>> {
        if self.state != GenerationState::Serving {
            debug!(
                "generation {}: connection {} declined, generation is {}",
                self.id, conn, self.state
            );
            return None;
        }
        let entry = self.servers.get(server)?;
        let runtime = self.runtime.as_ref()?;

        let set = materialize(&entry.name, &entry.strategy, runtime, conn);
        debug!(
            "connection {} on server {}: {} of {} reference(s) published",
            conn,
            server,
            set.len(),
            entry.configured
        );
        Some(set)
    }

    /// Tear the generation down
    ///
    /// The runtime shuts down as soon as no connection holds it any more.
    pub fn shutdown(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.state == GenerationState::TornDown {
            return;
        }
        self.enter(GenerationState::ShuttingDown);
        self.servers.clear();

        if let Some(runtime) = self.runtime.take() {
            let others = runtime.holders() - 1;
            if others > 0 {
                warn!(
                    "generation {}: {} reference(s) still hold the runtime, shutdown deferred",
                    self.id, others
                );
            }
        }
        self.enter(GenerationState::TornDown);
        info!("generation {}: reference manager shut down", self.id);
    }
}

impl<R: ObjectRuntime> Drop for Generation<R> {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl<R: ObjectRuntime> fmt::Debug for Generation<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generation")
            .field("id", &self.id)
            .field("state", &self.state)
            .field("servers", &self.servers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Entry point a host registers with
pub struct ReferenceModule<F: RuntimeFactory> {
    factory: F,
    generations: AtomicU64,
}

impl<F: RuntimeFactory> ReferenceModule<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            generations: AtomicU64::new(0),
        }
    }

    /// Build a generation from finalized server configurations
    ///
    /// Only a runtime initialization failure is an error; directory and
    /// per-alias failures degrade the affected server and are logged.
    pub fn post_config(
        &self,
        servers: &[ServerReferenceConfig],
    ) -> Result<Generation<F::Runtime>> {
        let id = self.generations.fetch_add(1, Ordering::Relaxed) + 1;

        // Nothing else is built when the runtime cannot start
        let runtime = RuntimeManager::initialize(&self.factory).map_err(|e| {
            error!("generation {}: {}", id, e);
            e
        })?;
        let mut generation = Generation::new(id);
        generation.runtime = Some(runtime.clone());
        generation.enter(GenerationState::RuntimeReady);

        for server in servers {
            if !server.enabled {
                debug!("server {}: reference manager not enabled", server.name);
                continue;
            }

            let strategy = match server.resolution_mode() {
                ResolutionMode::Cached => MaterializeStrategy::Cached(Arc::new(resolve_all(
                    &server.name,
                    &server.directory(),
                    &server.managed_objects,
                    server.naming_context(),
                    runtime.runtime(),
                ))),
                ResolutionMode::Direct => {
                    if server.managed_objects.is_empty() {
                        warn!(
                            "server {}: module enabled but no objects to manage were configured",
                            server.name
                        );
                    }
                    MaterializeStrategy::Direct {
                        location: server.directory(),
                        objects: server.managed_objects.clone(),
                        default_context: server.naming_context().to_string(),
                    }
                }
            };

            generation.servers.insert(
                server.name.clone(),
                ServerReferences {
                    name: server.name.clone(),
                    strategy,
                    configured: server.managed_objects.len(),
                },
            );
        }
        generation.enter(GenerationState::CachesPopulated);
        generation.enter(GenerationState::Serving);

        info!(
            "generation {}: reference manager initialized successfully ({} server(s) enabled)",
            id,
            generation.servers.len()
        );
        Ok(generation)
    }
}
