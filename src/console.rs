//! Console output and logging
//!
//! Once bootstrap has run, fds 0-2 are `/dev/console`. User-facing text goes
//! to stdout; diagnostics go through the `log` facade into a
//! `tracing-subscriber` formatter on stderr, so they can be silenced
//! independently with the configured log level.

use std::io::{self, Write};

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

// ============================================================================
// Output
// ============================================================================

/// Print a string to the console and flush (prompts have no newline)
pub fn print(s: &str) {
    let mut out = io::stdout().lock();
    let _ = out.write_all(s.as_bytes());
    let _ = out.flush();
}

// ============================================================================
// Logger
// ============================================================================

/// Map a `log` level onto the subscriber's filter
fn subscriber_level(level: log::LevelFilter) -> LevelFilter {
    match level {
        log::LevelFilter::Off => LevelFilter::OFF,
        log::LevelFilter::Error => LevelFilter::ERROR,
        log::LevelFilter::Warn => LevelFilter::WARN,
        log::LevelFilter::Info => LevelFilter::INFO,
        log::LevelFilter::Debug => LevelFilter::DEBUG,
        log::LevelFilter::Trace => LevelFilter::TRACE,
    }
}

/// Install the stderr subscriber. `log` records are bridged into it, so
/// the rest of the crate keeps using the `log` macros.
///
/// Only the first call takes effect.
pub fn init_logger(level: log::LevelFilter) {
    let installed = tracing_subscriber::registry()
        .with(subscriber_level(level))
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(false)
                .without_time(),
        )
        .try_init();
    if let Err(e) = installed {
        log::debug!("logger already installed: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_level_mapping() {
        assert_eq!(subscriber_level(log::LevelFilter::Off), LevelFilter::OFF);
        assert_eq!(subscriber_level(log::LevelFilter::Warn), LevelFilter::WARN);
        assert_eq!(subscriber_level(log::LevelFilter::Trace), LevelFilter::TRACE);
    }

    #[test]
    fn test_init_logger_twice() {
        init_logger(log::LevelFilter::Info);
        init_logger(log::LevelFilter::Debug);
        log::info!("still logging");
    }
}
