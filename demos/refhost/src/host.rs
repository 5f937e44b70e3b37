//! Simulated Host
//!
//! Loads a reference configuration, builds a generation, and runs a batch
//! of concurrent simulated connections against one server, printing the
//! references each connection sees.
//!
//! USAGE:
//!   refhost --config FILE [OPTIONS]
//!
//! EXAMPLES:
//!   refhost --config references.conf
//!   refhost --config references.conf --server billing.example --connections 8 -v

mod common;

use clap::Parser;
use common::init_tracing;
use refmgr::orb::{OrbConfig, OrbRuntimeFactory};
use refmgr::{ConfigFile, ReferenceModule};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "refhost")]
#[command(version)]
#[command(about = "Simulated host process publishing remote object references per connection")]
struct Args {
    /// Reference configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Server whose connections are simulated
    #[arg(short, long, default_value = refmgr::config::MAIN_SERVER)]
    server: String,

    /// Number of concurrent connections
    #[arg(short = 'n', long, default_value_t = 4)]
    connections: usize,

    /// Directory connect and call timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let config = ConfigFile::load(&args.config)?;
    let timeout = Duration::from_millis(args.timeout_ms);
    let factory = OrbRuntimeFactory::new(
        OrbConfig::default()
            .with_connect_timeout(timeout)
            .with_call_timeout(timeout),
    );

    let module = ReferenceModule::new(factory);
    let generation = module.post_config(&config.servers())?;

    if generation.server(&args.server).is_none() {
        warn!("server {} is unknown or not enabled; connections get no references", args.server);
    }

    std::thread::scope(|scope| {
        for _ in 0..args.connections {
            let generation = &generation;
            let server = args.server.as_str();
            scope.spawn(move || {
                let conn = generation.next_connection_id();
                let Some(references) = generation.process_connection(server, conn) else {
                    println!("connection {}: no references", conn);
                    return;
                };
                for alias in references.aliases() {
                    if let Some(proxy) = references.get(alias) {
                        println!(
                            "connection {}: {} -> {} ({})",
                            conn,
                            alias,
                            proxy.endpoint(),
                            proxy.type_id()
                        );
                    }
                }
                let report = references.close();
                println!(
                    "connection {}: released {} reference(s), {} failure(s)",
                    conn, report.released, report.failed
                );
            });
        }
    });

    generation.shutdown();
    info!("Host finished");
    Ok(())
}
