//! Naming directory
//!
//! A small directory service mapping two-level names (`context/leaf`) to
//! object references, with a Tokio TCP server and an async client.
//!
//! # Example
//!
//! ```no_run
//! use naming::{Name, NamingClient, NamingServer, ObjectReference};
//!
//! #[tokio::main]
//! async fn main() -> naming::Result<()> {
//!     let server = NamingServer::new();
//!     server
//!         .bind(
//!             Name::new("fred", "Registry")?,
//!             ObjectReference::new("IDL:Registry:1.0", "10.0.0.7", 40123, &b"registry"[..]),
//!         )
//!         .await?;
//!     tokio::spawn(async move { server.run("127.0.0.1:2809".parse().unwrap()).await });
//!
//!     let client = NamingClient::connect("127.0.0.1:2809".parse().unwrap()).await?;
//!     let reference = client.resolve(&Name::new("fred", "Registry")?).await?;
//!     println!("{}", reference.to_stringified()?);
//!     Ok(())
//! }
//! ```

mod codec;
pub mod error;
pub mod name;
pub mod protocol;
pub mod reference;
pub mod registry;
pub mod transport;
pub mod server;
pub mod client;

pub use error::{NamingError, Result};
pub use name::Name;
pub use reference::ObjectReference;
pub use registry::NamingRegistry;
pub use server::{NamingServer, NamingServerConfig, NamingServerStats};
pub use client::NamingClient;

/// Default naming directory port
pub const DEFAULT_PORT: u16 = 2809;
