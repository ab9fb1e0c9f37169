//! Log output.
//!
//! Level filtering follows `RUST_LOG` and defaults to `info`. Per-request
//! lines are logged at `debug`.

use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

/// How log lines are written to stderr.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable single lines
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_tracing(format: LogFormat) -> Result<(), tracing_subscriber::util::TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        LogFormat::Text => Registry::default().with(filter).with(fmt_layer).try_init(),
        LogFormat::Json => Registry::default()
            .with(filter)
            .with(fmt_layer.json().with_current_span(false))
            .try_init(),
    }
}
