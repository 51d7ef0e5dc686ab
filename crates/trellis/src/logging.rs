//! Tracing subscriber setup for applications and demos.
//!
//! The filter is taken from, in order:
//!
//! 1. `TRELLIS_LOG` (e.g. `trellis_router=debug,warn`)
//! 2. `RUST_LOG`
//! 3. [`LogOptions::level`], `warn` by default

use tracing::Level;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "TRELLIS_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOptions {
    /// Level used when neither environment variable is set.
    pub level: Level,
    pub ansi: bool,
    /// Include timestamps, span open/close and targets.
    pub verbose: bool,
}

impl Default for LogOptions {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            ansi: true,
            verbose: false,
        }
    }
}

impl LogOptions {
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn ansi(mut self, ansi: bool) -> Self {
        self.ansi = ansi;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// Install a global stderr subscriber.
///
/// Returns `false` when a global subscriber was already installed, which
/// leaves the existing one in place.
pub fn init(options: LogOptions) -> bool {
    let use_ansi = options.ansi && std::io::IsTerminal::is_terminal(&std::io::stderr());
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(use_ansi)
        .with_target(options.verbose);

    let registry = tracing_subscriber::registry().with(env_filter(options.level));
    let installed = if options.verbose {
        registry
            .with(layer.with_span_events(fmt::format::FmtSpan::CLOSE).with_timer(fmt::time::uptime()))
            .try_init()
    } else {
        registry.with(layer.without_time().compact()).try_init()
    };
    installed.is_ok()
}

fn env_filter(level: Level) -> EnvFilter {
    if let Ok(directives) = std::env::var(LOG_ENV) {
        if let Ok(filter) = EnvFilter::try_new(&directives) {
            return filter;
        }
    }
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    EnvFilter::new(level.as_str().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_default_to_warnings() {
        let options = LogOptions::default();
        assert_eq!(options.level, Level::WARN);
        assert!(!options.verbose);
        assert_eq!(options.verbose(true).level(Level::DEBUG).level, Level::DEBUG);
    }

    #[test]
    fn second_init_keeps_the_first_subscriber() {
        init(LogOptions::default().ansi(false));
        assert!(!init(LogOptions::default()));
    }
}
