//! Handle materialization

use std::sync::Arc;
use tracing::{debug, error};
use crate::cache::EndpointCache;
use crate::config::{DirectoryLocation, ManagedObjects};
use crate::guard::{ConnectionId, ReleaseGuard};
use crate::references::ConnectionReferences;
use crate::resolver::resolve_one;
use crate::runtime::{NamingDirectory, ObjectRuntime, RuntimeHandle};

/// How a server produces the handles of a connection
///
/// Chosen once per server when the generation is built.
#[derive(Clone, Debug)]
pub enum MaterializeStrategy {
    /// Convert descriptors resolved at configuration load
    Cached(Arc<EndpointCache>),
    /// Resolve against the directory for every connection
    Direct {
        location: DirectoryLocation,
        objects: ManagedObjects,
        default_context: String,
    },
}

/// Build the reference set of one connection
///
/// Aliases that cannot be resolved or converted are left out; every
/// handle is guarded before it enters the set.
pub fn materialize<R: ObjectRuntime>(
    server: &str,
    strategy: &MaterializeStrategy,
    runtime: &RuntimeHandle<R>,
    conn: ConnectionId,
) -> ConnectionReferences<R> {
    let mut set = ConnectionReferences::new(server, conn);

    match strategy {
        MaterializeStrategy::Cached(cache) => {
            for (alias, descriptor) in cache.iter() {
                match runtime.endpoint_to_handle(descriptor) {
                    Ok(handle) => {
                        set.insert(ReleaseGuard::new(runtime.clone(), alias, conn, handle));
                        debug!("connection {}: acquired reference with alias '{}'", conn, alias);
                    }
                    Err(e) => error!(
                        "connection {}: cannot create reference with alias '{}': {}",
                        conn, alias, e
                    ),
                }
            }
        }
        MaterializeStrategy::Direct {
            location,
            objects,
            default_context,
        } => {
            if objects.is_empty() {
                return set.finish();
            }
            let directory = match runtime.open_directory(location) {
                Ok(directory) => directory,
                Err(e) => {
                    error!(
                        "connection {}: cannot reach naming directory at {}: {}",
                        conn, location, e
                    );
                    return set.finish();
                }
            };

            for object in objects.iter() {
                let handle = resolve_one(&directory, &object.logical_name, default_context)
                    .and_then(|descriptor| runtime.endpoint_to_handle(&descriptor));
                match handle {
                    Ok(handle) => {
                        set.insert(ReleaseGuard::new(runtime.clone(), &object.alias, conn, handle));
                        debug!(
                            "connection {}: acquired reference with alias '{}'",
                            conn, object.alias
                        );
                    }
                    Err(e) => error!(
                        "connection {}: cannot create reference '{}' with alias '{}': {}",
                        conn, object.logical_name, object.alias, e
                    ),
                }
            }

            if let Err(e) = directory.close() {
                error!(
                    "connection {}: failed to release naming directory reference: {}",
                    conn, e
                );
            }
        }
    }

    set.finish()
}
