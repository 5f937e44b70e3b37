//! Naming directory server
//!
//! Each accepted connection runs in its own Tokio task and serves
//! request/response frames against a shared registry until the peer
//! disconnects.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{RwLock, Semaphore};
use tracing::{debug, info, warn};
use crate::error::{NamingError, Result};
use crate::name::Name;
use crate::protocol::{Request, Response};
use crate::reference::ObjectReference;
use crate::registry::NamingRegistry;
use crate::transport::{FrameTransport, DEFAULT_MAX_FRAME_SIZE};

/// Naming server configuration
#[derive(Debug, Clone)]
pub struct NamingServerConfig {
    pub max_frame_size: usize,
    pub max_connections: usize,
}

impl Default for NamingServerConfig {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            max_connections: 1024,
        }
    }
}

/// Server statistics
#[derive(Debug, Default)]
pub struct NamingServerStats {
    pub connections_accepted: AtomicU64,
    pub connections_rejected: AtomicU64,
    pub requests_processed: AtomicU64,
    pub resolve_misses: AtomicU64,
}

/// Naming directory server
pub struct NamingServer {
    registry: Arc<RwLock<NamingRegistry>>,
    config: NamingServerConfig,
    stats: Arc<NamingServerStats>,
}

impl NamingServer {
    pub fn new() -> Self {
        Self::with_config(NamingServerConfig::default())
    }

    pub fn with_config(config: NamingServerConfig) -> Self {
        Self {
            registry: Arc::new(RwLock::new(NamingRegistry::new())),
            config,
            stats: Arc::new(NamingServerStats::default()),
        }
    }

    /// Shared registry served by this server
    pub fn registry(&self) -> &Arc<RwLock<NamingRegistry>> {
        &self.registry
    }

    pub fn stats(&self) -> &Arc<NamingServerStats> {
        &self.stats
    }

    /// Bind an object locally, without going through the wire
    pub async fn bind(&self, name: Name, reference: ObjectReference) -> Result<()> {
        self.registry.write().await.bind(name, reference, true)
    }

    /// Run the server on the given address
    pub async fn run(&self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr).await?;
        self.run_on(listener).await
    }

    /// Run the server on an already bound listener
    pub async fn run_on(&self, listener: TcpListener) -> Result<()> {
        self.run_until(listener, std::future::pending()).await
    }

    /// Run the server until `shutdown` completes
    pub async fn run_until<F: Future<Output = ()>>(
        &self,
        listener: TcpListener,
        shutdown: F,
    ) -> Result<()> {
        info!(
            "Naming server listening on {} (max_connections: {})",
            listener.local_addr()?,
            self.config.max_connections
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_connections));
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Naming server shutting down");
                    return Ok(());
                }

                result = listener.accept() => {
                    let (stream, peer_addr) = result?;

                    let permit = match semaphore.clone().try_acquire_owned() {
                        Ok(permit) => permit,
                        Err(_) => {
                            self.stats.connections_rejected.fetch_add(1, Ordering::Relaxed);
                            warn!("Connection limit reached, rejecting connection from {}", peer_addr);
                            continue;
                        }
                    };

                    self.stats.connections_accepted.fetch_add(1, Ordering::Relaxed);
                    debug!("Accepted connection from {}", peer_addr);

                    let registry = Arc::clone(&self.registry);
                    let stats = Arc::clone(&self.stats);
                    let max_frame_size = self.config.max_frame_size;

                    tokio::spawn(async move {
                        let _permit = permit;
                        match handle_connection(stream, registry, max_frame_size, &stats).await {
                            Ok(()) | Err(NamingError::ConnectionClosed) => {
                                debug!("Connection closed from {}", peer_addr);
                            }
                            Err(e) => warn!("Connection error from {}: {}", peer_addr, e),
                        }
                    });
                }
            }
        }
    }
}

impl Default for NamingServer {
    fn default() -> Self {
        Self::new()
    }
}

async fn handle_connection(
    stream: TcpStream,
    registry: Arc<RwLock<NamingRegistry>>,
    max_frame_size: usize,
    stats: &NamingServerStats,
) -> Result<()> {
    stream.set_nodelay(true)?;
    let mut transport = FrameTransport::new(stream).with_max_frame_size(max_frame_size);

    loop {
        let frame = transport.read_frame().await?;
        let response = match Request::decode(&frame) {
            Ok(request) => process_request(&registry, request, stats).await,
            Err(e) => {
                warn!("Malformed directory request: {}", e);
                Response::Failed(e.to_string())
            }
        };
        stats.requests_processed.fetch_add(1, Ordering::Relaxed);
        let reply = match response.encode() {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Cannot encode directory response: {}", e);
                Response::Failed(e.to_string()).encode()?
            }
        };
        transport.write_frame(&reply).await?;
    }
}

async fn process_request(
    registry: &RwLock<NamingRegistry>,
    request: Request,
    stats: &NamingServerStats,
) -> Response {
    match request {
        Request::Resolve(name) => match registry.read().await.resolve(&name) {
            Some(reference) => {
                debug!("resolve {}: found", name);
                Response::Resolved(reference.clone())
            }
            None => {
                debug!("resolve {}: not found", name);
                stats.resolve_misses.fetch_add(1, Ordering::Relaxed);
                Response::NotFound(name)
            }
        },
        Request::Bind {
            name,
            reference,
            rebind,
        } => match registry.write().await.bind(name.clone(), reference, rebind) {
            Ok(()) => Response::Done,
            Err(NamingError::AlreadyBound(_)) => Response::AlreadyBound(name),
            Err(e) => Response::Failed(e.to_string()),
        },
        Request::Unbind(name) => match registry.write().await.unbind(&name) {
            Ok(_) => Response::Done,
            Err(NamingError::NotFound(_)) => Response::NotFound(name),
            Err(e) => Response::Failed(e.to_string()),
        },
        Request::List(context) => Response::Listing(registry.read().await.list(&context)),
    }
}
