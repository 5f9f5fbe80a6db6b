// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Global `log` backend writing to an [`Output`].

use super::output::{LogLevel, Output};
use std::io;
use std::sync::{Arc, OnceLock};

static OUTPUT: OnceLock<Arc<dyn Output>> = OnceLock::new();

/// Bridges `log` records to the configured output.
struct GlobalLogger {
    output: Arc<dyn Output>,
    level_filter: LogLevel,
}

impl log::Log for GlobalLogger {
    fn enabled(&self, metadata: &log::Metadata<'_>) -> bool {
        metadata.target().starts_with("hrpc")
            && LogLevel::from(metadata.level()) >= self.level_filter
    }

    fn log(&self, record: &log::Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // Nowhere to report a failing log sink.
        let _ = self
            .output
            .write(LogLevel::from(record.level()), &record.args().to_string());
    }

    fn flush(&self) {
        let _ = self.output.flush();
    }
}

/// Install `output` as the process-wide destination of hrpc's log records.
///
/// Only the first call takes effect, and only when no other `log` backend
/// is installed. Returns whether this call installed the logger.
///
/// # Example
/// ```
/// use hrpc::logging::{init_logger, ConsoleOutput, LogLevel};
/// use std::sync::Arc;
///
/// init_logger(Arc::new(ConsoleOutput::new(LogLevel::Info)), LogLevel::Info);
/// ```
pub fn init_logger(output: Arc<dyn Output>, level: LogLevel) -> bool {
    if OUTPUT.set(Arc::clone(&output)).is_err() {
        return false;
    }
    let logger = Box::leak(Box::new(GlobalLogger {
        output,
        level_filter: level,
    }));
    if log::set_logger(logger).is_err() {
        return false;
    }
    log::set_max_level(level.to_filter());
    true
}

/// Flush the global logger's output.
///
/// Safe to call even if logger not initialized.
pub fn flush_logger() -> io::Result<()> {
    match OUTPUT.get() {
        Some(output) => output.flush(),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Capture {
        lines: Mutex<Vec<(LogLevel, String)>>,
    }

    impl Output for Capture {
        fn write(&self, level: LogLevel, message: &str) -> io::Result<()> {
            self.lines.lock().push((level, message.to_owned()));
            Ok(())
        }

        fn flush(&self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_records_reach_output_once_installed() {
        let capture = Arc::new(Capture::default());
        let installed = init_logger(capture.clone(), LogLevel::Info);
        // Another test of this binary may have installed a logger first.
        if !installed {
            return;
        }
        log::debug!("[test] filtered out");
        log::warn!("[test] kept {}", 7);
        assert!(!init_logger(capture.clone(), LogLevel::Debug));
        assert!(flush_logger().is_ok());

        let lines = capture.lines.lock();
        assert!(lines.contains(&(LogLevel::Warning, "[test] kept 7".to_owned())));
        assert!(!lines.iter().any(|(_, m)| m.contains("filtered out")));
    }
}
