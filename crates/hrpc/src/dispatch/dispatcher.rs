// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Message dispatcher: correlates calls with their responses on one
//! transport and routes everything else.

use super::handle::{CallCanceller, CallResult, CallShared, CompletionHandle};
use super::pending::{PendingCall, PendingTable};
use super::stats::{DispatcherMetrics, DispatcherStats};
use crate::config::RuntimeConfig;
use crate::error::CallError;
use crate::message::{Frame, FrameReader, MessageAddress, MessageKind};
use crate::object::{LinkId, Subscriber};
use crate::signature::Signature;
use crate::transport::{ByteSink, Transport};
use crate::value::Value;
use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

/// An outgoing call or post: target, parameter signature and arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct CallRequest {
    pub address: MessageAddress,
    pub signature: Signature,
    pub args: Vec<Value>,
}

impl CallRequest {
    /// `args` are encoded as `signature`; they must convert to it.
    #[must_use]
    pub fn new(address: MessageAddress, signature: Signature, args: Vec<Value>) -> Self {
        Self {
            address,
            signature,
            args,
        }
    }

    /// Request whose signature is inferred from the arguments.
    #[must_use]
    pub fn inferred(address: MessageAddress, args: Vec<Value>) -> Self {
        let signature = crate::object::args_signature(&args);
        Self::new(address, signature, args)
    }
}

/// Receives the Call, Post and Cancel frames sent by the peer.
pub trait InboundHandler: Send + Sync + 'static {
    fn handle_frame(&self, frame: Frame);
}

impl<F> InboundHandler for F
where
    F: Fn(Frame) + Send + Sync + 'static,
{
    fn handle_frame(&self, frame: Frame) {
        self(frame);
    }
}

struct DispatcherInner {
    transport: Arc<dyn Transport>,
    config: RuntimeConfig,
    pending: Mutex<PendingTable>,
    reader: Mutex<FrameReader>,
    inbound: ArcSwapOption<Box<dyn InboundHandler>>,
    events: DashMap<MessageAddress, Vec<(LinkId, Subscriber)>>,
    next_link: AtomicU64,
    metrics: DispatcherMetrics,
    weak_self: Weak<DispatcherInner>,
}

/// Correlates outgoing calls with the responses of one transport.
///
/// * `send` registers a pending call under a fresh id and returns its
///   [`CompletionHandle`].
/// * Reply, Error and Canceled frames resolve the matching pending call;
///   unmatched ones are counted as anomalies and dropped.
/// * Event frames go to the subscribers of their `(service, object, action)`.
/// * Call, Post and Cancel frames go to the [`InboundHandler`].
///
/// No lock is held while user code or the transport runs. Clones share
/// the same state.
#[derive(Clone)]
pub struct MessageDispatcher {
    inner: Arc<DispatcherInner>,
}

impl MessageDispatcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_config(transport, RuntimeConfig::new())
    }

    pub fn with_config(transport: Arc<dyn Transport>, config: RuntimeConfig) -> Self {
        let max_frame_size = config.limits().max_frame_size;
        let inner = Arc::new_cyclic(|weak_self| DispatcherInner {
            transport,
            config,
            pending: Mutex::new(PendingTable::new()),
            reader: Mutex::new(FrameReader::new(max_frame_size)),
            inbound: ArcSwapOption::empty(),
            events: DashMap::new(),
            next_link: AtomicU64::new(1),
            metrics: DispatcherMetrics::default(),
            weak_self: weak_self.clone(),
        });
        Self { inner }
    }

    #[inline]
    pub fn config(&self) -> &RuntimeConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn downgrade(&self) -> WeakDispatcher {
        WeakDispatcher {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Route inbound Call/Post/Cancel frames to `handler`, replacing any
    /// previous one.
    pub fn set_inbound_handler<H: InboundHandler>(&self, handler: H) {
        let boxed: Box<dyn InboundHandler> = Box::new(handler);
        self.inner.inbound.store(Some(Arc::new(boxed)));
    }

    pub fn clear_inbound_handler(&self) {
        self.inner.inbound.store(None);
    }

    // ===================================================================
    // Outgoing
    // ===================================================================

    /// Send a call and track its response.
    ///
    /// Fails with [`CallError::Disconnected`] once the transport was lost,
    /// with a conversion error when the arguments do not fit the signature,
    /// and with [`CallError::SendFailed`] when the transport refuses the
    /// bytes (the call is then no longer pending).
    pub fn send(&self, request: CallRequest) -> Result<CompletionHandle, CallError> {
        let inner = &self.inner;
        let mut frame = Frame::with_args(
            MessageKind::Call,
            0,
            request.address,
            &request.signature,
            &request.args,
        )?;

        let shared = {
            let mut table = inner.pending.lock();
            if table.is_closed() {
                return Err(CallError::Disconnected);
            }
            let id = table.allocate_id();
            frame.id = id;
            let shared = CallShared::new(id);
            table.insert(
                id,
                PendingCall {
                    shared: Arc::clone(&shared),
                    address: request.address,
                },
            );
            shared
        };
        let id = frame.id;

        if let Err(e) = inner.transport.send_bytes(frame.encode()) {
            log::debug!("[dispatch] call {} to {} not sent: {}", id, request.address, e);
            inner.pending.lock().remove(id);
            let error = CallError::SendFailed(e.to_string());
            shared.complete(Err(error.clone()));
            return Err(error);
        }
        shared.mark_awaiting();
        inner.metrics.record_call_sent();
        log::trace!("[dispatch] call {} -> {}", id, request.address);

        let canceller: Weak<dyn CallCanceller> = inner.weak_self.clone();
        Ok(CompletionHandle::new(shared, canceller))
    }

    /// Send a fire-and-forget post.
    pub fn post(&self, request: CallRequest) -> Result<(), CallError> {
        let mut frame = Frame::with_args(
            MessageKind::Post,
            0,
            request.address,
            &request.signature,
            &request.args,
        )?;
        {
            let mut table = self.inner.pending.lock();
            if table.is_closed() {
                return Err(CallError::Disconnected);
            }
            frame.id = table.allocate_id();
        }
        self.send_frame(&frame)?;
        self.inner.metrics.record_post_sent();
        Ok(())
    }

    /// Send an already built frame (replies, errors, events).
    pub fn send_frame(&self, frame: &Frame) -> Result<(), CallError> {
        if self.inner.pending.lock().is_closed() {
            return Err(CallError::Disconnected);
        }
        self.inner
            .transport
            .send_bytes(frame.encode())
            .map_err(|e| CallError::SendFailed(e.to_string()))
    }

    /// Cancel the call behind `handle`; see [`CompletionHandle::cancel`].
    ///
    /// False for a handle issued by another dispatcher.
    pub fn cancel(&self, handle: &CompletionHandle) -> bool {
        if handle.is_finished() || !handle.is_tracked_by(Arc::as_ptr(&self.inner).cast()) {
            return false;
        }
        self.inner.cancel_call(handle.id())
    }

    // ===================================================================
    // Incoming
    // ===================================================================

    /// Feed a chunk of the transport byte stream.
    ///
    /// Frames that fail to decode are counted as protocol errors and
    /// skipped; the stream continues with the next frame.
    pub fn on_bytes_received(&self, chunk: &[u8]) {
        let frames = {
            let mut reader = self.inner.reader.lock();
            reader.set_max_size(self.inner.config.limits().max_frame_size);
            reader.feed(chunk);
            let mut frames = Vec::new();
            while let Some(next) = reader.next_frame() {
                match next {
                    Ok(frame) => frames.push(frame),
                    Err(e) => {
                        log::warn!("[dispatch] dropping undecodable frame: {}", e);
                        self.inner.metrics.record_protocol_error();
                    }
                }
            }
            frames
        };
        for frame in frames {
            self.on_frame_received(frame);
        }
    }

    /// Route one decoded frame.
    pub fn on_frame_received(&self, frame: Frame) {
        match frame.kind {
            MessageKind::Reply | MessageKind::Error | MessageKind::Canceled => {
                self.inner.complete_from(frame);
            }
            MessageKind::Event => self.inner.deliver_event(&frame),
            MessageKind::Call | MessageKind::Post | MessageKind::Cancel => {
                self.inner.deliver_inbound(frame);
            }
        }
    }

    /// The transport is gone: fail every pending call with
    /// [`CallError::Disconnected`] and refuse further sends.
    ///
    /// Idempotent.
    pub fn on_transport_lost(&self) {
        let drained = self.inner.pending.lock().close();
        if !drained.is_empty() {
            log::info!(
                "[dispatch] transport lost, failing {} pending call(s)",
                drained.len()
            );
        }
        for call in drained {
            if call.shared.complete(Err(CallError::Disconnected)) {
                self.inner.metrics.record_failed();
            }
        }
    }

    /// Whether [`on_transport_lost`](Self::on_transport_lost) ran.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.pending.lock().is_closed()
    }

    /// Close the transport, then fail pending calls.
    pub fn close(&self) {
        self.inner.transport.close();
        self.on_transport_lost();
    }

    // ===================================================================
    // Events
    // ===================================================================

    /// Receive the arguments of Event frames addressed to `address`.
    pub fn subscribe_events(&self, address: MessageAddress, subscriber: Subscriber) -> LinkId {
        let link = self.inner.next_link.fetch_add(1, Ordering::Relaxed);
        self.inner
            .events
            .entry(address)
            .or_default()
            .push((link, subscriber));
        link
    }

    /// Drop an event subscription; false for an unknown link.
    pub fn unsubscribe_events(&self, link: LinkId) -> bool {
        let mut removed = false;
        self.inner.events.retain(|_, subscribers| {
            let before = subscribers.len();
            subscribers.retain(|(id, _)| *id != link);
            removed |= subscribers.len() != before;
            !subscribers.is_empty()
        });
        removed
    }

    // ===================================================================
    // Introspection
    // ===================================================================

    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }

    #[must_use]
    pub fn stats(&self) -> DispatcherStats {
        self.inner.metrics.snapshot()
    }
}

impl std::fmt::Debug for MessageDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageDispatcher")
            .field("pending", &self.pending_count())
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl DispatcherInner {
    fn complete_from(&self, frame: Frame) {
        let Some(call) = self.pending.lock().remove(frame.id) else {
            log::debug!(
                "[dispatch] {} for unknown call {} from {} dropped",
                frame.kind,
                frame.id,
                frame.address
            );
            self.metrics.record_anomaly();
            return;
        };

        let result = self.response_result(&frame);
        match &result {
            Ok(_) => self.metrics.record_completed(),
            Err(CallError::Canceled) => self.metrics.record_canceled(),
            Err(_) => self.metrics.record_failed(),
        }
        call.shared.complete(result);
    }

    fn response_result(&self, frame: &Frame) -> CallResult {
        if frame.kind == MessageKind::Canceled {
            return Err(CallError::Canceled);
        }
        let value = match frame.dynamic_value(&self.config.limits()) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("[dispatch] undecodable {} for call {}: {}", frame.kind, frame.id, e);
                self.metrics.record_protocol_error();
                return Err(e.into());
            }
        };
        match (frame.kind, value) {
            (MessageKind::Error, Value::String(message)) => Err(CallError::Remote(message)),
            (MessageKind::Error, other) => Err(CallError::Remote(other.to_string())),
            (_, value) => Ok(value),
        }
    }

    fn deliver_event(&self, frame: &Frame) {
        let subscribers: Vec<Subscriber> = match self.events.get(&frame.address) {
            Some(entry) => entry.iter().map(|(_, s)| Arc::clone(s)).collect(),
            None => Vec::new(),
        };
        self.metrics.record_event();
        if subscribers.is_empty() {
            log::trace!("[dispatch] event {} has no subscriber", frame.address);
            return;
        }
        let args = match frame.args(&self.config.limits()) {
            Ok(args) => args,
            Err(e) => {
                log::warn!("[dispatch] undecodable event {}: {}", frame.address, e);
                self.metrics.record_protocol_error();
                return;
            }
        };
        for subscriber in subscribers {
            if catch_unwind(AssertUnwindSafe(|| subscriber(&args))).is_err() {
                log::debug!("[dispatch] event subscriber of {} panicked", frame.address);
            }
        }
    }

    fn deliver_inbound(&self, frame: Frame) {
        self.metrics.record_inbound();
        let Some(handler) = self.inbound.load_full() else {
            log::debug!("[dispatch] no inbound handler for {} {}", frame.kind, frame.address);
            if frame.kind == MessageKind::Call {
                let answer = Frame::error_to(&frame, "no object host on this endpoint");
                if let Err(e) = self.transport.send_bytes(answer.encode()) {
                    log::debug!("[dispatch] error answer not sent: {}", e);
                }
            }
            return;
        };
        let (id, kind) = (frame.id, frame.kind);
        if catch_unwind(AssertUnwindSafe(|| handler.handle_frame(frame))).is_err() {
            log::warn!("[dispatch] inbound handler panicked on {} {}", kind, id);
        }
    }
}

impl CallCanceller for DispatcherInner {
    fn cancel_call(&self, id: u32) -> bool {
        let Some(call) = self.pending.lock().remove(id) else {
            return false;
        };
        if call.shared.complete(Err(CallError::Canceled)) {
            self.metrics.record_canceled();
        }
        let cancel = Frame::cancel(id, call.address, id);
        if let Err(e) = self.transport.send_bytes(cancel.encode()) {
            log::debug!("[dispatch] cancel of call {} not sent: {}", id, e);
        }
        true
    }
}

/// Non-owning dispatcher reference, used by hosts, proxies and the
/// transport pump.
#[derive(Clone)]
pub struct WeakDispatcher {
    inner: Weak<DispatcherInner>,
}

impl WeakDispatcher {
    #[must_use]
    pub fn upgrade(&self) -> Option<MessageDispatcher> {
        self.inner.upgrade().map(|inner| MessageDispatcher { inner })
    }
}

impl ByteSink for WeakDispatcher {
    fn on_bytes(&self, chunk: &[u8]) {
        if let Some(dispatcher) = self.upgrade() {
            dispatcher.on_bytes_received(chunk);
        }
    }

    fn on_closed(&self) {
        if let Some(dispatcher) = self.upgrade() {
            dispatcher.on_transport_lost();
        }
    }
}
