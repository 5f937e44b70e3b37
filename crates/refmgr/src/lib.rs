//! Object-reference lifecycle manager
//!
//! Resolves configured logical names to endpoint descriptors through a
//! naming directory, caches them per server, materializes one live handle
//! per alias at the start of every connection, publishes the handles to
//! other components by alias, and releases each of them exactly once when
//! the connection ends.
//!
//! # Architecture
//!
//! ```text
//! post_config ──► RuntimeManager ──► resolve_all (per enabled server)
//!                                        │
//!                                        ▼
//!                                   EndpointCache (frozen)
//!                                        │
//! process_connection ──► materialize ◄───┘  (or the directory, in direct mode)
//!                            │
//!                            ▼
//!                 ConnectionReferences { alias → ReleaseGuard }
//!                            │
//! connection end ────────────┴──► every guard releases its handle
//! ```
//!
//! # Example
//!
//! ```no_run
//! use refmgr::orb::OrbRuntimeFactory;
//! use refmgr::{ConfigFile, ReferenceModule};
//!
//! fn main() -> refmgr::Result<()> {
//!     let config = ConfigFile::load("references.conf")?;
//!     let module = ReferenceModule::new(OrbRuntimeFactory::default());
//!     let generation = module.post_config(&config.servers())?;
//!
//!     let conn = generation.next_connection_id();
//!     if let Some(references) = generation.process_connection("main", conn) {
//!         if let Some(registry) = references.get("registry") {
//!             println!("registry lives at {}", registry.endpoint());
//!         }
//!     }
//!
//!     generation.shutdown();
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod descriptor;
pub mod config;
pub mod runtime;
pub mod cache;
pub mod resolver;
pub mod guard;
pub mod references;
pub mod factory;
pub mod generation;
pub mod orb;

#[cfg(test)]
mod test_support;

pub use error::{ConfigError, RefError, Result};
pub use descriptor::{EndpointDescriptor, LogicalName};
pub use config::{
    ConfigFile, Directive, DirectoryLocation, ManagedObject, ManagedObjects, ResolutionMode,
    ServerReferenceConfig,
};
pub use runtime::{NamingDirectory, ObjectRuntime, RuntimeFactory, RuntimeHandle, RuntimeManager};
pub use cache::{EndpointCache, EndpointCacheBuilder};
pub use resolver::resolve_all;
pub use guard::{ConnectionId, ReleaseGuard};
pub use references::{ConnectionPhase, ConnectionReferences, ReleaseReport};
pub use factory::{materialize, MaterializeStrategy};
pub use generation::{Generation, GenerationState, ReferenceModule, ServerReferences};
