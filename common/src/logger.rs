//! Process-wide tracing setup, shared by every binary in the workspace.

use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, fmt};

static LOGGER_INIT: OnceCell<()> = OnceCell::new();

/// Initializes the global `tracing` subscriber exactly once.
///
/// `json` selects structured output for production deployments; pretty,
/// human-readable output is used otherwise. Safe to call from multiple
/// places (tests included) since only the first call takes effect.
pub fn init_tracing(json: bool) {
    LOGGER_INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        let builder = fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_line_number(true)
            .with_span_events(fmt::format::FmtSpan::CLOSE);

        if json {
            builder.json().init();
        } else {
            builder.pretty().init();
        }

        tracing::info!("logger initialized");
    });
}
