#![forbid(unsafe_code)]

//! Structured logging.
//!
//! Every engine event is recorded under [`TARGET`] through the macros
//! re-exported here. Events carry `sub_id`, `source` and `coordinator`
//! fields; the drain loop runs inside a `coordinator_run` span. Installing a
//! subscriber is left to the application, except for the optional JSON
//! helper behind the `tracing-json` feature.
//!
//! | Level | Event |
//! |-------|-------|
//! | debug | subscription created, completed, errored, cancelled, terminated |
//! | debug | drain summary (`executed`) |
//! | trace | every action, with `CoordinatorConfig::trace_actions` |
//! | warn  | re-entrant `run()` refused |

/// Target under which every engine event is recorded.
pub const TARGET: &str = "rill_flow";

pub use tracing::{debug, debug_span, trace, warn};

/// Install a global JSON subscriber filtered by `RUST_LOG`, falling back to
/// `default_filter` (for example `"rill_flow=debug"`).
///
/// Returns `false` if a global subscriber was already installed.
#[cfg(feature = "tracing-json")]
pub fn init_json_logging(default_filter: &str) -> bool {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .try_init()
        .is_ok()
}
