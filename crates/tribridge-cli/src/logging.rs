//! Log output for the binary
//!
//! Library crates only emit `tracing` events; this installs the subscriber
//! that prints them to stderr. `RUST_LOG` wins when set.

use tracing_subscriber::EnvFilter;

pub fn init(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
