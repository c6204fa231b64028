//! Command output logging.
//!
//! Remote commands stream their output line by line; where those lines go
//! is the caller's choice. The session executor only knows `record`.

use std::sync::Mutex;

/// Receives remote command output, one line at a time, in arrival order.
pub trait CommandLog: Send + Sync {
    /// Record one line of combined stdout/stderr output.
    fn record(&self, line: &str);
}

/// Forwards every line to `tracing` at info level.
///
/// The default sink for production wiring; filter on the `remote` target
/// to separate command output from the runner's own logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl CommandLog for TracingLog {
    fn record(&self, line: &str) {
        tracing::info!(target: "remote", "{line}");
    }
}

/// Captures lines in memory. Useful in tests and anywhere the caller wants
/// the output back instead of logged.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything recorded so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl CommandLog for MemoryLog {
    fn record(&self, line: &str) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line.to_string());
        }
    }
}
