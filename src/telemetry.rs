use std::io;

use anyhow::Result;
use once_cell::sync::OnceCell;
use tracing::subscriber;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt};

static TRACING_INITIALIZED: OnceCell<()> = OnceCell::new();

/// Install the stderr subscriber. `RUST_LOG` overrides the default level.
///
/// Logs go to stderr so they never interleave with the gate on stdout.
pub fn init_tracing(verbose: bool) -> Result<()> {
    if TRACING_INITIALIZED.get().is_some() {
        return Ok(());
    }

    let default_level = if verbose {
        "appcycle=debug"
    } else {
        "appcycle=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::registry().with(filter).with(
        fmt::layer()
            .with_target(false)
            .without_time()
            .with_writer(io::stderr),
    );

    subscriber::set_global_default(subscriber)?;
    let _ = TRACING_INITIALIZED.set(());
    Ok(())
}
