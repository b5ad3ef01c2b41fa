// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

//! Per-reactor log level and the reactor-scoped logger.
//!
//! The runtime itself logs through `tracing` directly. Reactors get a [`Logger`]
//! carrying their name and declared [`LogLevel`]; records below the reactor's level
//! are dropped before they reach the sink, so a chatty reactor can be silenced
//! without touching the global subscriber.

/// Severity threshold a reactor logs at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash,
         strum_macros::Display)]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

/// Cheap, cloneable logger scoped to one reactor.
///
/// Clone it into callbacks; every record carries the reactor's name as a field.
#[derive(Clone, Debug)]
pub struct Logger {
    reactor: String,
    level: LogLevel,
}

impl Logger {
    pub(crate) fn new(reactor: String, level: LogLevel) -> Self { Self { reactor, level } }

    #[must_use]
    pub fn level(&self) -> LogLevel { self.level }

    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.level {
            return;
        }
        match level {
            LogLevel::Trace => tracing::trace!(reactor = %self.reactor, "{message}"),
            LogLevel::Debug => tracing::debug!(reactor = %self.reactor, "{message}"),
            LogLevel::Info => tracing::info!(reactor = %self.reactor, "{message}"),
            LogLevel::Warn => tracing::warn!(reactor = %self.reactor, "{message}"),
            LogLevel::Error => tracing::error!(reactor = %self.reactor, "{message}"),
        }
    }

    pub fn trace(&self, message: &str) { self.log(LogLevel::Trace, message); }
    pub fn debug(&self, message: &str) { self.log(LogLevel::Debug, message); }
    pub fn info(&self, message: &str) { self.log(LogLevel::Info, message); }
    pub fn warn(&self, message: &str) { self.log(LogLevel::Warn, message); }
    pub fn error(&self, message: &str) { self.log(LogLevel::Error, message); }
}
