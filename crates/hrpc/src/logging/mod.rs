// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Optional log backend (feature `logging`).
//!
//! hrpc reports through the `log` facade: `[component]`-prefixed messages,
//! `warn!` for dropped or undecodable input, `debug!` for call lifecycle,
//! `trace!` per frame. Applications with their own `log` backend need
//! nothing from here. Others can install the simple console or file
//! output below:
//!
//! ```no_run
//! use hrpc::logging::{flush_logger, init_logger, FileOutput, LogLevel};
//! use std::sync::Arc;
//!
//! let file = FileOutput::new("/tmp/hrpc.log", LogLevel::Debug).unwrap();
//! init_logger(Arc::new(file), LogLevel::Debug);
//! // ...
//! flush_logger().unwrap();
//! ```

mod logger;
mod output;

pub use logger::{flush_logger, init_logger};
pub use output::{ConsoleOutput, FileOutput, LogLevel, Output};
