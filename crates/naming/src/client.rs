//! Naming directory client

use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tracing::debug;
use crate::error::{NamingError, Result};
use crate::name::Name;
use crate::protocol::{Request, Response};
use crate::reference::ObjectReference;
use crate::transport::FrameTransport;

/// Default connect and call timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for a naming directory
///
/// Requests are serialized over a single connection; the client may be
/// shared between tasks.
pub struct NamingClient {
    transport: Mutex<FrameTransport<TcpStream>>,
    peer: SocketAddr,
    call_timeout: Duration,
}

impl NamingClient {
    /// Connect with the default timeouts
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        Self::connect_with_timeout(addr, DEFAULT_TIMEOUT, DEFAULT_TIMEOUT).await
    }

    /// Connect, bounding both the connect and every later call
    pub async fn connect_with_timeout(
        addr: SocketAddr,
        connect_timeout: Duration,
        call_timeout: Duration,
    ) -> Result<Self> {
        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| NamingError::Timeout)??;
        stream.set_nodelay(true)?;
        debug!("Connected to naming directory at {}", addr);

        Ok(Self {
            transport: Mutex::new(FrameTransport::new(stream)),
            peer: addr,
            call_timeout,
        })
    }

    /// Address of the directory
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Resolve a name to the reference bound under it
    pub async fn resolve(&self, name: &Name) -> Result<ObjectReference> {
        match self.call(Request::Resolve(name.clone())).await? {
            Response::Resolved(reference) => Ok(reference),
            Response::NotFound(name) => Err(NamingError::NotFound(name.to_string())),
            other => Err(unexpected(other)),
        }
    }

    /// Bind a reference, failing if the name is taken
    pub async fn bind(&self, name: &Name, reference: &ObjectReference) -> Result<()> {
        self.bind_inner(name, reference, false).await
    }

    /// Bind a reference, replacing any existing binding
    pub async fn rebind(&self, name: &Name, reference: &ObjectReference) -> Result<()> {
        self.bind_inner(name, reference, true).await
    }

    async fn bind_inner(&self, name: &Name, reference: &ObjectReference, rebind: bool) -> Result<()> {
        let request = Request::Bind {
            name: name.clone(),
            reference: reference.clone(),
            rebind,
        };
        match self.call(request).await? {
            Response::Done => Ok(()),
            Response::AlreadyBound(name) => Err(NamingError::AlreadyBound(name.to_string())),
            other => Err(unexpected(other)),
        }
    }

    /// Remove a binding
    pub async fn unbind(&self, name: &Name) -> Result<()> {
        match self.call(Request::Unbind(name.clone())).await? {
            Response::Done => Ok(()),
            Response::NotFound(name) => Err(NamingError::NotFound(name.to_string())),
            other => Err(unexpected(other)),
        }
    }

    /// List the bindings of a context
    pub async fn list(&self, context: &str) -> Result<Vec<(String, ObjectReference)>> {
        match self.call(Request::List(context.to_string())).await? {
            Response::Listing(entries) => Ok(entries),
            other => Err(unexpected(other)),
        }
    }

    async fn call(&self, request: Request) -> Result<Response> {
        let mut transport = self.transport.lock().await;
        let exchange = async {
            transport.write_frame(&request.encode()?).await?;
            let frame = transport.read_frame().await?;
            Response::decode(&frame)
        };
        let response = tokio::time::timeout(self.call_timeout, exchange)
            .await
            .map_err(|_| NamingError::Timeout)??;

        match response {
            Response::Failed(message) => Err(NamingError::Remote(message)),
            response => Ok(response),
        }
    }
}

fn unexpected(response: Response) -> NamingError {
    NamingError::UnexpectedResponse(format!("{:?}", response))
}
