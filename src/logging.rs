//! Logging collaborator for the calculation cache
//!
//! The cache reports what it does through an injected [`CacheLogger`]
//! capability rather than a process-global logger. Calls are best-effort
//! and fire-and-forget: an implementation must never panic or block the
//! calling operation.

use serde_json::Value;
use tracing::{debug, error, info, warn};

// == Log Level ==
/// Severity of a cache log event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

// == Logger Capability ==
/// Sink for cache observability events.
///
/// `metadata` carries structured context (key, entry counts, eviction
/// figures) as a JSON object when available.
pub trait CacheLogger: Send + Sync {
    fn log(&self, level: LogLevel, message: &str, metadata: Option<&Value>);
}

// == Tracing Logger ==
/// Default logger forwarding events to the `tracing` macros.
#[derive(Debug, Default, Clone)]
pub struct TracingLogger;

impl CacheLogger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str, metadata: Option<&Value>) {
        match (level, metadata) {
            (LogLevel::Debug, Some(meta)) => debug!(%meta, "{message}"),
            (LogLevel::Debug, None) => debug!("{message}"),
            (LogLevel::Info, Some(meta)) => info!(%meta, "{message}"),
            (LogLevel::Info, None) => info!("{message}"),
            (LogLevel::Warning, Some(meta)) => warn!(%meta, "{message}"),
            (LogLevel::Warning, None) => warn!("{message}"),
            (LogLevel::Error, Some(meta)) => error!(%meta, "{message}"),
            (LogLevel::Error, None) => error!("{message}"),
        }
    }
}

// == Noop Logger ==
/// Logger that drops every event, for fully silent embedding.
#[derive(Debug, Default, Clone)]
pub struct NoopLogger;

impl CacheLogger for NoopLogger {
    fn log(&self, _level: LogLevel, _message: &str, _metadata: Option<&Value>) {}
}
