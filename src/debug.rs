//! Debug logging for webnest.
//!
//! Everything goes to `<temp>/webnest_debug.log` (`/tmp/webnest_debug.log` on
//! Unix) so stdout stays free for the IPC channel. Two entry points feed it:
//!
//! - the `log` facade, via [`init_log_bridge`]
//! - the category macros `debug_error!`, `debug_info!`, `debug_log!`,
//!   `debug_trace!`, e.g. `crate::debug_info!("SESSION", "switched to {}", id)`
//!
//! When `RUST_LOG` is set, lines are mirrored to stderr as well.

use chrono::Local;
use log::{LevelFilter, Log, Metadata, Record};
use parking_lot::Mutex;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Debug level, ordered from quietest to noisiest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugLevel {
    Off = 0,
    Error = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl DebugLevel {
    fn from_filter(filter: LevelFilter) -> Self {
        match filter {
            LevelFilter::Off => DebugLevel::Off,
            LevelFilter::Error | LevelFilter::Warn => DebugLevel::Error,
            LevelFilter::Info => DebugLevel::Info,
            LevelFilter::Debug => DebugLevel::Debug,
            LevelFilter::Trace => DebugLevel::Trace,
        }
    }
}

/// Location of the debug log.
pub fn log_path() -> PathBuf {
    #[cfg(unix)]
    {
        PathBuf::from("/tmp/webnest_debug.log")
    }
    #[cfg(not(unix))]
    {
        std::env::temp_dir().join("webnest_debug.log")
    }
}

struct DebugLogger {
    level: DebugLevel,
    file: Option<File>,
    mirror_stderr: bool,
}

impl DebugLogger {
    fn open(level: DebugLevel, mirror_stderr: bool) -> Self {
        let file = if level != DebugLevel::Off {
            // Silently run without a file if it can't be opened
            OpenOptions::new()
                .write(true)
                .truncate(true)
                .create(true)
                .open(log_path())
                .ok()
        } else {
            None
        };

        let mut logger = DebugLogger {
            level,
            file,
            mirror_stderr,
        };
        if logger.file.is_some() {
            logger.write_raw(&format!(
                "{}\nwebnest debug session started at {} (level={:?})\n{}\n",
                "=".repeat(80),
                timestamp(),
                level,
                "=".repeat(80)
            ));
        }
        logger
    }

    fn write_raw(&mut self, msg: &str) {
        if let Some(ref mut file) = self.file {
            let _ = file.write_all(msg.as_bytes());
            let _ = file.flush();
        }
        if self.mirror_stderr {
            eprint!("{msg}");
        }
    }

    fn log(&mut self, level: DebugLevel, category: &str, msg: &str) {
        if level > self.level {
            return;
        }
        let level_str = match level {
            DebugLevel::Error => "ERROR",
            DebugLevel::Info => "INFO ",
            DebugLevel::Debug => "DEBUG",
            DebugLevel::Trace => "TRACE",
            DebugLevel::Off => return,
        };
        self.write_raw(&format!(
            "[{}] [{}] [{}] {}\n",
            timestamp(),
            level_str,
            category,
            msg
        ));
    }
}

static LOGGER: OnceLock<Mutex<DebugLogger>> = OnceLock::new();

fn get_logger() -> &'static Mutex<DebugLogger> {
    LOGGER.get_or_init(|| Mutex::new(DebugLogger::open(DebugLevel::Off, false)))
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

/// Check if debugging is enabled at given level
pub fn is_enabled(level: DebugLevel) -> bool {
    level <= get_logger().lock().level
}

/// Log a message at specified level
pub fn log(level: DebugLevel, category: &str, msg: &str) {
    get_logger().lock().log(level, category, msg);
}

/// Log formatted message
pub fn logf(level: DebugLevel, category: &str, args: fmt::Arguments) {
    if is_enabled(level) {
        log(level, category, &format!("{}", args));
    }
}

/// Adapter from the `log` facade into the debug log.
struct LogBridge;

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let level = match record.level() {
            log::Level::Error | log::Level::Warn => DebugLevel::Error,
            log::Level::Info => DebugLevel::Info,
            log::Level::Debug => DebugLevel::Debug,
            log::Level::Trace => DebugLevel::Trace,
        };
        let message = if record.level() == log::Level::Warn {
            format!("WARN: {}", record.args())
        } else {
            record.args().to_string()
        };
        log(level, record.target(), &message);
    }

    fn flush(&self) {}
}

static BRIDGE: LogBridge = LogBridge;

/// Resolve the effective filter: CLI flag, then `RUST_LOG`, then config.
pub fn resolve_level(cli: Option<LevelFilter>, config: LevelFilter) -> LevelFilter {
    cli.or_else(|| {
        std::env::var("RUST_LOG")
            .ok()
            .and_then(|v| v.trim().parse::<LevelFilter>().ok())
    })
    .unwrap_or(config)
}

/// Install the `log` bridge. Later calls only adjust the level.
pub fn init_log_bridge(level: LevelFilter) {
    let mirror_stderr = std::env::var_os("RUST_LOG").is_some();
    let debug_level = DebugLevel::from_filter(level);

    match LOGGER.get() {
        Some(logger) => {
            let mut logger = logger.lock();
            if logger.file.is_none() && debug_level != DebugLevel::Off {
                *logger = DebugLogger::open(debug_level, mirror_stderr);
            } else {
                logger.level = debug_level;
            }
        }
        None => {
            let _ = LOGGER.set(Mutex::new(DebugLogger::open(debug_level, mirror_stderr)));
        }
    }

    let _ = log::set_logger(&BRIDGE);
    log::set_max_level(level);
}

// Convenience macros for logging
#[macro_export]
macro_rules! debug_error {
    ($category:expr, $($arg:tt)*) => {
        $crate::debug::logf($crate::debug::DebugLevel::Error, $category, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_info {
    ($category:expr, $($arg:tt)*) => {
        $crate::debug::logf($crate::debug::DebugLevel::Info, $category, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_log {
    ($category:expr, $($arg:tt)*) => {
        $crate::debug::logf($crate::debug::DebugLevel::Debug, $category, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! debug_trace {
    ($category:expr, $($arg:tt)*) => {
        $crate::debug::logf($crate::debug::DebugLevel::Trace, $category, format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_level_prefers_cli() {
        assert_eq!(
            resolve_level(Some(LevelFilter::Trace), LevelFilter::Info),
            LevelFilter::Trace
        );
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(DebugLevel::from_filter(LevelFilter::Warn), DebugLevel::Error);
        assert_eq!(DebugLevel::from_filter(LevelFilter::Off), DebugLevel::Off);
        assert!(DebugLevel::Trace > DebugLevel::Info);
    }
}
