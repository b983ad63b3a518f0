//! Paramon library exports for testing

use clap::ValueEnum;
use simplelog::LevelFilter;

pub mod agent;
pub mod clipboard;
pub mod core;
pub mod input;
pub mod protocol;

#[cfg(test)]
pub mod test_support;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    #[default]
    Debug,
    Trace,
}

impl LogLevel {
    /// Parses the `[logging] level` config value. Unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::from_str(name, true).ok()
    }
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}
