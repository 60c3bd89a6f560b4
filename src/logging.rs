//! Subscriber setup for the binary.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(verbose: bool, debug: bool) -> &'static str {
    if debug {
        "dashladder=trace,dashladder_av=debug,dashladder_plan=debug"
    } else if verbose {
        "info"
    } else {
        "warn"
    }
}

/// Install the global subscriber. Logs go to stderr so stdout stays clean
/// for `--json`.
pub fn init(verbose: bool, debug: bool) {
    // Respect RUST_LOG env var if set, otherwise use defaults based on flags
    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| default_filter(verbose, debug).to_string());

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(env_filter))
        .with_writer(std::io::stderr)
        .with_target(debug)
        .init();
}
