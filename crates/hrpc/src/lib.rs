// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # HRPC - dynamic RPC messaging core
//!
//! Typed, introspectable remote objects over a binary message protocol:
//! objects advertise methods, signals and properties at runtime, peers
//! fetch their meta-object and call them by name, and every value on the
//! wire carries (or is checked against) a type signature.
//!
//! ## Quick Start
//!
//! ```rust
//! use hrpc::object::ObjectBuilder;
//! use hrpc::session::{LocalDirectory, Session};
//! use hrpc::{Result, Value};
//! use std::sync::Arc;
//!
//! fn main() -> Result<()> {
//!     let (server, client) = Session::pair(Arc::new(LocalDirectory::new()))?;
//!
//!     let mut builder = ObjectBuilder::new();
//!     builder.advertise_fn("greet", |name: String| format!("hello {}", name))?;
//!     server.register_service("greeter", Arc::new(builder.build()))?;
//!
//!     let greeter = client.service("greeter")?;
//!     let text: String = greeter.call_as("greet", vec![Value::from("bob")])?;
//!     assert_eq!(text, "hello bob");
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                           Session                                   |
//! |   ServiceDirectory | ObjectHost (inbound) | RemoteObject (outbound) |
//! +---------------------------------------------------------------------+
//! |                        MessageDispatcher                            |
//! |   call ids | pending table | CompletionHandle | events | cancel     |
//! +---------------------------------------------------------------------+
//! |                      Frames and codec                               |
//! |   24-byte header | FrameReader | signature-driven binary encoding  |
//! +---------------------------------------------------------------------+
//! |                  Signatures, types, values                          |
//! |   grammar | TypeRegistry | Value | conversion rules                 |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Signature`] | Parsed type signature (`"(is[d])"`) |
//! | [`Value`] | Self-describing dynamic value |
//! | [`message::Frame`] | One protocol message |
//! | [`object::DynamicObject`] | Object with advertised members |
//! | [`dispatch::MessageDispatcher`] | Call/response correlation over a transport |
//! | [`session::Session`] | Endpoint serving and reaching services |
//!
//! ## Features
//!
//! - `config-loaders` (default): YAML [`config::MessagingConfig`]
//! - `async`: [`dispatch::CompletionHandle`] deadlines on tokio
//! - `logging`: console/file backend for the `log` records hrpc emits

/// Signature grammar: parsing, printing, compatibility.
pub mod signature;

/// Runtime type descriptors and the type registry.
pub mod types;

/// Dynamic values and conversion rules.
pub mod value;

/// Binary encoding of values.
pub mod codec;

/// Message frames and stream reassembly.
pub mod message;

/// Meta-objects, dynamic objects, overload resolution.
pub mod object;

/// Call/response correlation.
pub mod dispatch;

/// Byte transports.
pub mod transport;

/// Sessions, services and remote objects.
pub mod session;

/// Worker pool for multi-threaded objects.
pub mod executor;

/// Global configuration (wire constants, runtime limits).
pub mod config;

/// Error types.
pub mod error;

#[cfg(feature = "logging")]
pub mod logging;

pub use error::{CallError, Error, Result};
pub use signature::Signature;
pub use value::Value;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
