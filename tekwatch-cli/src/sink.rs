//! Output sinks for tailed container logs
//!
//! The tailer is generic over [`LogSink`] so the binary can print to stdout
//! while tests collect chunks in memory.

use std::io::Write;
use tekwatch_core::domain::log::ContainerKey;

/// Destination for newly observed log text
pub trait LogSink: Send {
    /// Write one chunk of new log text for a container
    ///
    /// # Arguments
    /// * `key` - The (pod, container) the text came from
    /// * `chunk` - Text appended since the previous poll
    fn write(&mut self, key: &ContainerKey, chunk: &str);
}

/// Writes chunks to stdout, each followed by a newline
///
/// Diagnostics go to stderr through tracing, so stdout carries nothing but
/// the pipeline's own output.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl LogSink for StdoutSink {
    fn write(&mut self, _key: &ContainerKey, chunk: &str) {
        let mut stdout = std::io::stdout().lock();
        // A closed stdout (e.g. `| head`) must not abort the watch
        let _ = writeln!(stdout, "{}", chunk);
        let _ = stdout.flush();
    }
}
