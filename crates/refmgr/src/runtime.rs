//! Communication runtime
//!
//! The manager never talks to the network itself. Everything it needs from
//! the distributed-object system goes through the traits below, and the
//! single runtime instance of a generation is shared by reference counting:
//! the generation holds one reference and every live handle guard holds
//! another, so the runtime is shut down only after the last of them ends.

use std::ops::Deref;
use std::sync::Arc;
use tracing::{debug, error};
use crate::config::DirectoryLocation;
use crate::descriptor::EndpointDescriptor;
use crate::error::{RefError, Result};

/// An open connection to a naming directory
pub trait NamingDirectory {
    /// Look up `leaf` in `context`
    fn resolve(&self, context: &str, leaf: &str) -> Result<EndpointDescriptor>;

    /// Release the directory connection
    fn close(self) -> Result<()>
    where
        Self: Sized;
}

/// Runtime able to reach the naming directory and create handles
pub trait ObjectRuntime: Send + Sync + 'static {
    /// Live reference to a remote object
    type Handle: Send + Sync + 'static;

    /// Directory connection type
    type Directory: NamingDirectory;

    /// Connect to the naming directory at `location`
    fn open_directory(&self, location: &DirectoryLocation) -> Result<Self::Directory>;

    /// Turn a descriptor into a live handle
    fn endpoint_to_handle(&self, descriptor: &EndpointDescriptor) -> Result<Self::Handle>;

    /// Release a handle created by this runtime
    fn release(&self, handle: Self::Handle) -> Result<()>;

    /// Tear the runtime down; called exactly once
    fn shutdown(&self) -> Result<()>;
}

/// Creates the runtime of a generation
pub trait RuntimeFactory {
    type Runtime: ObjectRuntime;

    fn init(&self) -> Result<Self::Runtime>;
}

/// Owner of the runtime; shuts it down when the last holder drops
struct RuntimeCell<R: ObjectRuntime> {
    runtime: R,
}

impl<R: ObjectRuntime> Drop for RuntimeCell<R> {
    fn drop(&mut self) {
        match self.runtime.shutdown() {
            Ok(()) => debug!("global runtime released"),
            Err(e) => error!("failed to release global runtime: {}", e),
        }
    }
}

/// Shared reference to the runtime of one generation
pub struct RuntimeHandle<R: ObjectRuntime> {
    inner: Arc<RuntimeCell<R>>,
}

impl<R: ObjectRuntime> RuntimeHandle<R> {
    fn new(runtime: R) -> Self {
        Self {
            inner: Arc::new(RuntimeCell { runtime }),
        }
    }

    pub fn runtime(&self) -> &R {
        &self.inner.runtime
    }

    /// Number of live holders, this one included
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl<R: ObjectRuntime> Clone for RuntimeHandle<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: ObjectRuntime> Deref for RuntimeHandle<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.inner.runtime
    }
}

/// Initializes the runtime once per generation
pub struct RuntimeManager;

impl RuntimeManager {
    /// Create the runtime through `factory`
    ///
    /// Any failure is reported as [`RefError::RuntimeInitFailed`].
    pub fn initialize<F: RuntimeFactory>(factory: &F) -> Result<RuntimeHandle<F::Runtime>> {
        match factory.init() {
            Ok(runtime) => {
                debug!("global runtime initialized");
                Ok(RuntimeHandle::new(runtime))
            }
            Err(e @ RefError::RuntimeInitFailed(_)) => Err(e),
            Err(e) => Err(RefError::RuntimeInitFailed(e.to_string())),
        }
    }
}
