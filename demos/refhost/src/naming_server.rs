//! Naming Directory Server
//!
//! Serves a naming directory pre-populated from the command line.
//!
//! USAGE:
//!   naming-server [OPTIONS]
//!
//! EXAMPLES:
//!   naming-server                                          # empty directory on 127.0.0.1:2809
//!   naming-server --bind fred.Registry=127.0.0.1:40123     # one object
//!   naming-server --port 9999 --bind billing.Invoice=10.0.0.7:40124

mod common;

use clap::Parser;
use common::*;
use naming::{Name, NamingServer, ObjectReference};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "naming-server")]
#[command(version)]
#[command(about = "Naming directory server for the reference manager demo")]
struct Args {
    /// Host address to bind to
    #[arg(long, default_value = DEFAULT_HOST)]
    host: String,

    /// Port number to listen on
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Object to bind, as context.Leaf=host:port (repeatable)
    #[arg(short, long = "bind", value_name = "NAME=ENDPOINT")]
    bindings: Vec<String>,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

/// Parse `context.Leaf=host:port`
fn parse_binding(arg: &str) -> Result<(Name, ObjectReference), String> {
    let (name, endpoint) = arg
        .split_once('=')
        .ok_or_else(|| format!("'{}' is not NAME=ENDPOINT", arg))?;
    let (context, leaf) = name
        .split_once('.')
        .ok_or_else(|| format!("'{}' is not context.Leaf", name))?;
    let (host, port) = endpoint
        .rsplit_once(':')
        .ok_or_else(|| format!("'{}' is not host:port", endpoint))?;
    let port: u16 = port
        .parse()
        .map_err(|_| format!("bad port in '{}'", endpoint))?;

    let name = Name::new(context, leaf).map_err(|e| e.to_string())?;
    let reference = ObjectReference::new(
        format!("IDL:{}:1.0", leaf),
        host,
        port,
        leaf.as_bytes().to_vec(),
    );
    Ok((name, reference))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let server = NamingServer::new();
    for binding in &args.bindings {
        let (name, reference) = parse_binding(binding)?;
        info!("Binding {} -> {}", name, reference.endpoint());
        server.bind(name, reference).await?;
    }

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = TcpListener::bind(addr).await?;
    server
        .run_until(listener, async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
