//! Tracing subscriber for debug output.

use std::sync::Once;

/// Environment variable holding the tracing filter, e.g. `HYBRIS_LOG=debug`
/// or `HYBRIS_LOG=hybris_eval::interpreter=trace`.
pub const LOG_ENV: &str = "HYBRIS_LOG";

static TRACING_INIT: Once = Once::new();

/// Install the global subscriber when `HYBRIS_LOG` is set.
///
/// Call once at startup. Later calls do nothing.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{prelude::*, EnvFilter};

        let Ok(directives) = std::env::var(LOG_ENV) else {
            return;
        };
        let layer = tracing_tree::HierarchicalLayer::new(2)
            .with_writer(std::io::stderr)
            .with_targets(true)
            .with_bracketed_fields(true);
        tracing_subscriber::registry()
            .with(EnvFilter::new(directives))
            .with(layer)
            .init();
    });
}
