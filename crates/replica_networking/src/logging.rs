//! # Logging
//!
//! Engines and managers report through an injected [`Logger`] instead of a
//! process-wide singleton. [`TracingLogger`] forwards to `tracing`;
//! [`MemoryLogger`] keeps entries around so tests can inspect them.

use std::fmt;

use parking_lot::Mutex;
use tracing::Level;

/// Log sink capability.
pub trait Logger: Send + Sync {
    /// Records one message.
    fn log(&self, level: Level, message: fmt::Arguments<'_>);
}

/// Formats a message and hands it to a [`Logger`] at the given level.
macro_rules! report {
    ($logger:expr, $level:ident, $($arg:tt)+) => {
        $crate::logging::Logger::log(&*$logger, ::tracing::Level::$level, format_args!($($arg)+))
    };
}

pub(crate) use report;

/// Forwards every message to `tracing` under the `replica` target.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: Level, message: fmt::Arguments<'_>) {
        match level {
            Level::ERROR => tracing::error!(target: "replica", "{}", message),
            Level::WARN => tracing::warn!(target: "replica", "{}", message),
            Level::INFO => tracing::info!(target: "replica", "{}", message),
            Level::DEBUG => tracing::debug!(target: "replica", "{}", message),
            _ => tracing::trace!(target: "replica", "{}", message),
        }
    }
}

/// Records every message in memory.
#[derive(Debug, Default)]
pub struct MemoryLogger {
    entries: Mutex<Vec<(Level, String)>>,
}

impl MemoryLogger {
    /// Creates an empty logger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of all entries recorded so far.
    #[must_use]
    pub fn entries(&self) -> Vec<(Level, String)> {
        self.entries.lock().clone()
    }

    /// Returns true if any entry at `level` contains `needle`.
    #[must_use]
    pub fn contains(&self, level: Level, needle: &str) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|(l, message)| *l == level && message.contains(needle))
    }

    /// Number of entries recorded at `level`.
    #[must_use]
    pub fn count(&self, level: Level) -> usize {
        self.entries.lock().iter().filter(|(l, _)| *l == level).count()
    }

    /// Drops all recorded entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl Logger for MemoryLogger {
    fn log(&self, level: Level, message: fmt::Arguments<'_>) {
        self.entries.lock().push((level, message.to_string()));
    }
}
