//! Logging setup for the `switchyard` binary
//!
//! Logs go to stderr so that stdout carries only the agent's answer (or the
//! `--json` document). HTTP client crates are capped at `warn`; at `debug`
//! they would otherwise log every connection made to a provider.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter directives used when `RUST_LOG` is not set
pub fn default_directives(log_level: &str) -> String {
    format!(
        "{level},hyper=warn,reqwest=warn,rustls=warn,switchyard_engine={level}",
        level = log_level
    )
}

/// Install the global subscriber
///
/// Priority: `RUST_LOG` > `log_level` (from `--log` or `core.log_level`).
/// Debug builds print human-readable lines; release builds print JSON with
/// the current span, so the `run` span's `request_id` is on every line.
///
/// Calling it again is a no-op.
pub fn init_telemetry_with_level(log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)));

    #[cfg(debug_assertions)]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init()
            .ok();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .ok();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("reqwest=warn"));
        assert!(directives.ends_with("switchyard_engine=debug"));

        // Must be accepted by the filter parser
        assert!(EnvFilter::try_new(&directives).is_ok());
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_telemetry_with_level("info");
        init_telemetry_with_level("debug");
    }
}
