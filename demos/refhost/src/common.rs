//! Definitions shared between the demo binaries

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Default directory address
#[allow(dead_code)]
pub const DEFAULT_HOST: &str = "127.0.0.1";
#[allow(dead_code)]
pub const DEFAULT_PORT: u16 = naming::DEFAULT_PORT;

/// Install the global subscriber
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(if verbose { Level::DEBUG } else { Level::INFO })
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
