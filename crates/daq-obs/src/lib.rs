use std::fs::File;
use std::io;
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};

/// Default filter when RUST_LOG is unset; HTTP plumbing is kept quiet.
const DEFAULT_FILTER: &str = "info,daq=debug,hyper=error,reqwest=error";

/// Build the logging subscriber without installing it.
/// - console (stderr) at INFO
/// - `<name>.log` in `dir` with everything the filter admits
/// - `<name>.err` in `dir` at WARN and above
///
/// Both files are truncated.
pub fn subscriber(
    name: &str,
    dir: &Path,
) -> io::Result<impl tracing::Subscriber + Send + Sync + 'static> {
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_FILTER.to_string());
    layered(name, dir, EnvFilter::new(env_filter))
}

fn layered(
    name: &str,
    dir: &Path,
    filter: EnvFilter,
) -> io::Result<impl tracing::Subscriber + Send + Sync + 'static> {
    let log_file = Arc::new(File::create(dir.join(format!("{}.log", name)))?);
    let err_file = Arc::new(File::create(dir.join(format!("{}.err", name)))?);

    Ok(tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_filter(LevelFilter::INFO),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(log_file),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(err_file)
                .with_filter(LevelFilter::WARN),
        ))
}

/// Initialize logging for the process, writing log files to the working
/// directory.
pub fn init(name: &str) -> io::Result<()> {
    subscriber(name, Path::new("."))?.init();
    tracing::info!(service = %name, "Logging initialized");
    Ok(())
}
