// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Call correlation.
//!
//! One [`MessageDispatcher`] sits on each transport. It numbers outgoing
//! calls, remembers them in a pending table, and resolves the
//! [`CompletionHandle`] of each call exactly once: with the peer's reply,
//! with the peer's error, on cancellation, or with
//! [`CallError::Disconnected`](crate::error::CallError::Disconnected) when
//! the transport goes away.
//!
//! ```
//! use hrpc::dispatch::{CallRequest, MessageDispatcher};
//! use hrpc::message::{Frame, MessageAddress, MessageKind};
//! use hrpc::transport::Transport;
//! use hrpc::Value;
//! use std::sync::Arc;
//!
//! struct Discard;
//! impl Transport for Discard {
//!     fn send_bytes(&self, _: Vec<u8>) -> std::io::Result<()> {
//!         Ok(())
//!     }
//! }
//!
//! let dispatcher = MessageDispatcher::new(Arc::new(Discard));
//! let address = MessageAddress::new(2, 1, 100);
//! let handle = dispatcher
//!     .send(CallRequest::inferred(address, vec![Value::I32(20)]))
//!     .unwrap();
//!
//! let request = Frame::new(MessageKind::Call, handle.id(), address);
//! dispatcher.on_frame_received(Frame::reply_to(&request, &Value::I32(42)));
//! assert_eq!(handle.wait(), Ok(Value::I32(42)));
//! ```

mod dispatcher;
mod handle;
mod pending;
mod stats;


pub use dispatcher::{CallRequest, InboundHandler, MessageDispatcher, WeakDispatcher};
pub use handle::{CallResult, CallStatus, CompletionHandle};
pub use stats::DispatcherStats;
