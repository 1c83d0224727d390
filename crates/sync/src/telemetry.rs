//! Tracing and Sentry setup for host processes.
//!
//! The host calls [`init`] once at startup and keeps the returned guard alive
//! until shutdown so buffered Sentry events are flushed.

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::SyncConfig;

/// Default filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "identity_sync=info,sqlx=warn";

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &SyncConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

/// Install the global tracing subscriber and, if configured, Sentry.
///
/// Must be called at most once per process.
#[must_use = "dropping the guard disables Sentry reporting"]
pub fn init(config: &SyncConfig) -> Option<sentry::ClientInitGuard> {
    // Initialize Sentry (must be done before tracing subscriber)
    let guard = init_sentry(config);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_sentry_without_dsn() {
        let config = SyncConfig::from_lookup(|key| {
            (key == "SYNC_DATABASE_URL").then(|| "postgres://localhost/sync".to_string())
        })
        .unwrap_or_else(|e| panic!("config should load: {e}"));
        assert!(init_sentry(&config).is_none());
    }

    #[test]
    fn test_default_filter_parses() {
        assert!(tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());
    }
}
