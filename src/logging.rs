//! Console backend for the `log` facade
//!
//! Records go to stderr as `[LEVEL target] message`. The library only uses
//! the `log` macros; binaries pick the level at startup.

use log::{Level, LevelFilter, Log, Metadata, Record};

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let tag = match record.level() {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
            Level::Trace => "TRACE",
        };
        eprintln!("[{} {}] {}", tag, record.target(), record.args());
    }

    fn flush(&self) {}
}

/// Parse a level name (case-insensitive)
pub fn parse_level(name: &str) -> Option<LevelFilter> {
    name.trim().parse().ok()
}

/// Install the console logger. Calling it again only changes the level.
pub fn init(level: LevelFilter) {
    // set_logger fails only if a logger is already installed
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(level);
}

/// Install the console logger at a named level, falling back to info
pub fn init_named(name: &str) {
    match parse_level(name) {
        Some(level) => init(level),
        None => {
            init(LevelFilter::Info);
            log::warn!("unknown log level '{}', using info", name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level_names() {
        assert_eq!(parse_level("debug"), Some(LevelFilter::Debug));
        assert_eq!(parse_level("WARN"), Some(LevelFilter::Warn));
        assert_eq!(parse_level(" off "), Some(LevelFilter::Off));
        assert_eq!(parse_level("chatty"), None);
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init(LevelFilter::Warn);
        init(LevelFilter::Error);
        assert_eq!(log::max_level(), LevelFilter::Error);
    }
}
