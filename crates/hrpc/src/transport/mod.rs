// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte transports underneath a dispatcher.
//!
//! The core only needs two things from a connection: a way to push encoded
//! frames out ([`Transport`]) and someone to hand incoming chunks and the
//! end-of-stream event to ([`ByteSink`]). Sockets live outside this crate;
//! [`MemoryTransport`] connects two endpoints inside one process.
//!
//! ```text
//!   dispatcher A ──send_bytes──► [channel] ──pump──► sink B (dispatcher B)
//!   dispatcher A ◄──pump─────── [channel] ◄──send_bytes── dispatcher B
//! ```

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Outgoing side of a connection.
pub trait Transport: Send + Sync {
    /// Queue `bytes` (one or more whole frames) for the peer.
    fn send_bytes(&self, bytes: Vec<u8>) -> io::Result<()>;

    /// Stop sending and receiving. Idempotent.
    fn close(&self) {}
}

/// Incoming side of a connection.
pub trait ByteSink: Send + Sync {
    /// A chunk of the peer's byte stream, in order, arbitrarily split.
    fn on_bytes(&self, chunk: &[u8]);

    /// The stream ended; called once.
    fn on_closed(&self);
}

/// One endpoint of an in-process connection.
pub struct MemoryTransport {
    name: String,
    outgoing: Mutex<Option<Sender<Vec<u8>>>>,
    incoming: Mutex<Option<Receiver<Vec<u8>>>>,
    shutdown_tx: Mutex<Option<Sender<()>>>,
    shutdown_rx: Receiver<()>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl MemoryTransport {
    /// Two connected endpoints.
    #[must_use]
    pub fn pair() -> (Arc<Self>, Arc<Self>) {
        let (a_tx, b_rx) = channel::unbounded();
        let (b_tx, a_rx) = channel::unbounded();
        (
            Arc::new(Self::endpoint("a", a_tx, a_rx)),
            Arc::new(Self::endpoint("b", b_tx, b_rx)),
        )
    }

    fn endpoint(name: &str, outgoing: Sender<Vec<u8>>, incoming: Receiver<Vec<u8>>) -> Self {
        let (shutdown_tx, shutdown_rx) = channel::bounded(1);
        Self {
            name: name.to_owned(),
            outgoing: Mutex::new(Some(outgoing)),
            incoming: Mutex::new(Some(incoming)),
            shutdown_tx: Mutex::new(Some(shutdown_tx)),
            shutdown_rx,
            pump: Mutex::new(None),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Deliver incoming chunks to `sink` from a dedicated thread.
    ///
    /// Fails with `AlreadyExists` when started twice.
    pub fn start(&self, sink: Arc<dyn ByteSink>) -> io::Result<()> {
        let incoming = self.incoming.lock().take().ok_or_else(|| {
            io::Error::new(io::ErrorKind::AlreadyExists, "transport already started")
        })?;
        let shutdown = self.shutdown_rx.clone();
        let handle = std::thread::Builder::new()
            .name(format!("hrpc-pump-{}", self.name))
            .spawn(move || pump(&incoming, &shutdown, sink.as_ref()))?;
        *self.pump.lock() = Some(handle);
        Ok(())
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.outgoing.lock().is_none()
    }
}

fn pump(incoming: &Receiver<Vec<u8>>, shutdown: &Receiver<()>, sink: &dyn ByteSink) {
    loop {
        channel::select! {
            recv(incoming) -> chunk => match chunk {
                Ok(chunk) => sink.on_bytes(&chunk),
                Err(_) => break,
            },
            recv(shutdown) -> _ => break,
        }
    }
    log::debug!("[transport] pump finished");
    sink.on_closed();
}

impl Transport for MemoryTransport {
    fn send_bytes(&self, bytes: Vec<u8>) -> io::Result<()> {
        let guard = self.outgoing.lock();
        let sender = guard
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "transport closed"))?;
        sender
            .send(bytes)
            .map_err(|_| io::Error::new(io::ErrorKind::BrokenPipe, "peer gone"))
    }

    fn close(&self) {
        // Dropping the sender ends the peer's pump; dropping ours ends ours.
        self.outgoing.lock().take();
        self.shutdown_tx.lock().take();
        let handle = self.pump.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() != std::thread::current().id() && handle.join().is_err() {
                log::warn!("[transport] pump of {} panicked", self.name);
            }
        }
    }
}

impl Drop for MemoryTransport {
    fn drop(&mut self) {
        self.outgoing.get_mut().take();
        self.shutdown_tx.get_mut().take();
    }
}
