//! Stderr logger for the binaries. Stdout stays free for scores and JSON.

use log::{LevelFilter, Log, Metadata, Record};

/// Environment variable holding the log level filter.
pub const LOG_ENV: &str = "FLEETMATCH_LOG";

struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let module = record.target().strip_prefix("fleetmatch::").unwrap_or(record.target());
        eprintln!("[{:<5} {}] {}", record.level(), module, record.args());
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

/// Parse a level filter such as `debug` or `off`; anything else means `info`.
pub fn level_from(value: Option<&str>) -> LevelFilter {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(LevelFilter::Info)
}

/// Install the stderr logger with the level named by `FLEETMATCH_LOG`.
/// Calling it again keeps the first logger.
pub fn init_logging() {
    let level = level_from(std::env::var(LOG_ENV).ok().as_deref());
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}
