//! # Tracing Setup
//!
//! Structured logging for controllers built on this framework.
//!
//! The controller emits:
//! - lifecycle events (`Controller started`, `Controller stopping`, `Shutdown`)
//! - one `worker` span per primary identity, carrying `kind` and `object`
//! - `Reconciled` / `Reconcile failed` per attempt with the generation and status
//! - `Retry scheduled` with the backoff delay
//!
//! Reconcilers are expected to add their own per-step events inside the worker span.
//!
//! **Usage:**
//! ```bash
//! RUST_LOG=info cargo run                        # outcomes only
//! RUST_LOG=debug cargo run                       # every step and dispatch decision
//! RUST_LOG=operator_framework=debug cargo run    # framework internals only
//! ```

use std::sync::Once;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Output format of the fmt subscriber.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, human-oriented output.
    Pretty,
    /// One line per event.
    #[default]
    Compact,
}

/// Initializes the tracing subscriber with `RUST_LOG` filtering (default `info`).
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn setup_tracing() {
    setup_tracing_with(LogFormat::default());
}

pub fn setup_tracing_with(format: LogFormat) {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let builder = tracing_subscriber::fmt().with_env_filter(filter);
        let result = match format {
            LogFormat::Pretty => builder.pretty().try_init(),
            LogFormat::Compact => builder.compact().try_init(),
        };
        if let Err(e) = result {
            eprintln!("tracing subscriber already installed: {e}");
        }
    });
}
