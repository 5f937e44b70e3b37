//! Connection soak run
//!
//! Starts a private naming directory, builds one generation with a cached
//! and a direct server, drives many connections through each from several
//! threads and reports what was published and released per server.
//!
//! ```text
//! cargo run -p integration-tests -- --threads 8 --connections 200
//! ```


use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;
use common::*;
use parking_lot::Mutex;
use refmgr::ReleaseReport;

const SERVERS: &[&str] = &["cached.example", "direct.example"];

#[derive(Parser, Debug)]
#[command(name = "integration-tests")]
#[command(about = "Drive many connections through a live reference manager")]
struct Args {
    /// Worker threads per server
    #[arg(short, long, default_value_t = 4)]
    threads: usize,

    /// Connections per thread
    #[arg(short, long, default_value_t = 50)]
    connections: usize,
}

/// Totals of one server
#[derive(Default, Debug)]
struct ServerTotals {
    connections: usize,
    declined: usize,
    published: usize,
    released: usize,
    failed: usize,
    elapsed: Duration,
}

impl ServerTotals {
    fn add(&mut self, published: usize, report: ReleaseReport) {
        self.connections += 1;
        self.published += published;
        self.released += report.released;
        self.failed += report.failed;
    }

    fn balanced(&self) -> bool {
        self.declined == 0 && self.failed == 0 && self.published == self.released
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    let directory = TestDirectory::start();
    directory.bind("fred", "Registry", 40123);
    directory.bind("fred", "Whois", 40124);
    directory.bind("billing", "Invoice", 40125);

    let generation = generation(&format!(
        "ReferencesDirectory {}\n\
         ReferencesObject fred.Registry registry\n\
         ReferencesObject fred.Whois whois\n\
         ReferencesObject billing.Invoice invoice\n\
         <Server cached.example>\n\
             ReferencesEnable on\n\
         </Server>\n\
         <Server direct.example>\n\
             ReferencesEnable on\n\
             ReferencesMode direct\n\
         </Server>\n",
        directory.location()
    ));

    let mut results = Vec::new();
    for server in SERVERS {
        let totals = Mutex::new(ServerTotals::default());
        let start = Instant::now();
        std::thread::scope(|scope| {
            for _ in 0..args.threads {
                scope.spawn(|| {
                    for _ in 0..args.connections {
                        let conn = generation.next_connection_id();
                        match generation.process_connection(server, conn) {
                            Some(references) => {
                                let published = references.len();
                                let report = references.close();
                                totals.lock().add(published, report);
                            }
                            None => totals.lock().declined += 1,
                        }
                    }
                });
            }
        });
        let mut totals = totals.into_inner();
        totals.elapsed = start.elapsed();
        results.push((*server, totals));
    }

    let leaked = live_proxies(&generation);
    generation.shutdown();

    println!(
        "{:<18} {:>11} {:>9} {:>10} {:>9} {:>7} {:>12}",
        "server", "connections", "declined", "published", "released", "failed", "elapsed"
    );
    for (server, totals) in &results {
        println!(
            "{:<18} {:>11} {:>9} {:>10} {:>9} {:>7} {:>12?}",
            server,
            totals.connections,
            totals.declined,
            totals.published,
            totals.released,
            totals.failed,
            totals.elapsed
        );
    }
    println!("proxies still live after the run: {}", leaked);

    if leaked == 0 && results.iter().all(|(_, totals)| totals.balanced()) {
        ExitCode::SUCCESS
    } else {
        eprintln!("published and released references do not balance");
        ExitCode::FAILURE
    }
}
