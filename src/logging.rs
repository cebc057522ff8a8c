//! Logging init: structured `tracing` output on stderr.

use tracing_subscriber::EnvFilter;

/// `RUST_LOG` takes precedence; otherwise the level follows `--verbose` / `--quiet`.
pub fn init_logging(verbose: bool, quiet: bool) {
    let default = if verbose {
        "info,license_fetchr=debug"
    } else if quiet {
        "warn"
    } else {
        "info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
