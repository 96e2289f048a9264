//! Pluggable diagnostic sink for the router.
//!
//! Routing diagnostics (registrations, matches, alias translations) go
//! through a [`DebugLogger`] installed on the router. The default sink
//! discards everything, so an application that never installs one pays a
//! virtual call and nothing else.

use std::fmt;

/// Sink for router diagnostics.
///
/// Implementations must be callable from any task; the router invokes the
/// sink while dispatching concurrently.
pub trait DebugLogger: Send + Sync {
    /// Record one diagnostic line.
    fn log(&self, args: fmt::Arguments<'_>);
}

/// Sink that discards all diagnostics. Installed by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl DebugLogger for NoopLogger {
    fn log(&self, _args: fmt::Arguments<'_>) {}
}

/// Sink that forwards diagnostics to [`tracing`] at DEBUG level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl DebugLogger for TracingLogger {
    fn log(&self, args: fmt::Arguments<'_>) {
        // ---
        tracing::debug!("{args}");
    }
}
