use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    EnvFilter, filter::Targets, fmt, prelude::__tracing_subscriber_SubscriberExt,
    util::SubscriberInitExt,
};

/// Installs the global subscriber. `verbose` forces debug output for the
/// crate; otherwise `default_level` applies unless `RUST_LOG` says otherwise.
pub fn init_logging(verbose: bool, default_level: LevelFilter) {
    let level_filter = if verbose {
        LevelFilter::DEBUG
    } else {
        default_level
    };
    let app_filter = Targets::new()
        .with_target("kurlar", level_filter)
        .with_target("tower_http", level_filter);
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_filter.to_string().to_lowercase()));

    // a second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().pretty().without_time())
        .with(app_filter)
        .with(env_filter)
        .try_init();
}
