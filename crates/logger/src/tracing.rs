use std::env::var;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing::{level_filters::LevelFilter, warn};
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize tracing to stderr.
pub fn init_tracing() {
    let layer = format_layer(LevelFilter::INFO, io::stderr);
    tracing_subscriber::registry().with(layer).init();
}

/// Initialize tracing into an append-only log file, for full-screen UIs that
/// own the terminal.
pub fn init_tracing_to_file(path: impl AsRef<Path>) -> io::Result<()> {
    let file: File = OpenOptions::new().create(true).append(true).open(path)?;
    let layer = format_layer(LevelFilter::INFO, Mutex::new(file));
    tracing_subscriber::registry().with(layer).init();
    Ok(())
}

/// Build the fmt layer with the default filter, honouring `RUST_LOG` and
/// `RUST_LOG_FORMAT=json`.
fn format_layer<S, W>(level: LevelFilter, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    W: for<'w> tracing_subscriber::fmt::MakeWriter<'w> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let log_format = var("RUST_LOG_FORMAT")
        .inspect_err(|error| {
            warn!("Failed to read RUST_LOG_FORMAT, falling back to default: {error}")
        })
        .unwrap_or_default();

    match log_format.as_str() {
        "json" => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(writer)
            .with_filter(env_filter)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_writer(writer)
            .with_filter(env_filter)
            .boxed(),
    }
}
