//! Tracing subscriber setup.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence. Without it, `app_name` (with `-` mapped to `_`,
/// as cargo does for crate targets) and the workspace crates log at
/// `default_level`, everything else at `warn`.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn setup_logger(app_name: &str, default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(app_name, default_level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true))
        .try_init();
}

fn default_directives(app_name: &str, default_level: &str) -> String {
    format!(
        "warn,{app}={level},murmur_server={level},murmur_client={level},tower_http={level}",
        app = app_name.replace('-', "_"),
        level = default_level,
    )
}
