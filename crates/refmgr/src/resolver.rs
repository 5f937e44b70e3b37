//! Endpoint resolution
//!
//! Runs once per enabled server when a configuration generation is built.
//! Failures are contained: a bad alias drops only that alias, an
//! unreachable directory leaves only that server with an empty cache.

use tracing::{debug, error, warn};
use crate::cache::{EndpointCache, EndpointCacheBuilder};
use crate::config::{DirectoryLocation, ManagedObjects};
use crate::descriptor::{EndpointDescriptor, LogicalName};
use crate::error::Result;
use crate::runtime::{NamingDirectory, ObjectRuntime};

/// Resolve every managed object of `server` into a frozen cache
pub fn resolve_all<R: ObjectRuntime>(
    server: &str,
    location: &DirectoryLocation,
    objects: &ManagedObjects,
    default_context: &str,
    runtime: &R,
) -> EndpointCache {
    let mut builder = EndpointCacheBuilder::new(server);

    if objects.is_empty() {
        warn!(
            "server {}: module enabled but no objects to manage were configured",
            server
        );
        return builder.freeze();
    }

    let directory = match runtime.open_directory(location) {
        Ok(directory) => directory,
        Err(e) => {
            error!(
                "server {}: cannot reach naming directory at {}: {}",
                server, location, e
            );
            return builder.freeze();
        }
    };

    for object in objects.iter() {
        match resolve_one(&directory, &object.logical_name, default_context) {
            Ok(descriptor) => {
                debug!(
                    "server {}: stored descriptor for '{}' as '{}': {:?}",
                    server, object.logical_name, object.alias, descriptor
                );
                builder.insert(object.alias.clone(), descriptor);
            }
            Err(e) => error!(
                "server {}: failed to resolve '{}' for alias '{}': {}",
                server, object.logical_name, object.alias, e
            ),
        }
    }

    if let Err(e) = directory.close() {
        error!(
            "server {}: failed to release naming directory reference: {}",
            server, e
        );
    }

    builder.freeze()
}

/// Resolve one logical name through an open directory
pub fn resolve_one<D: NamingDirectory>(
    directory: &D,
    logical_name: &str,
    default_context: &str,
) -> Result<EndpointDescriptor> {
    let name = LogicalName::parse(logical_name, default_context)?;
    directory.resolve(&name.context, &name.leaf)
}
