// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dispatcher counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters of one dispatcher.
#[derive(Debug, Default)]
pub(crate) struct DispatcherMetrics {
    /// Call frames handed to the transport
    calls_sent: AtomicU64,
    /// Post frames handed to the transport
    posts_sent: AtomicU64,
    /// Calls resolved with a value
    completed: AtomicU64,
    /// Calls resolved with an error (remote, decode, disconnect)
    failed: AtomicU64,
    /// Calls canceled locally or by the peer
    canceled: AtomicU64,
    /// Event frames delivered to at least zero subscribers
    events: AtomicU64,
    /// Call/Post/Cancel frames passed to the inbound handler
    inbound: AtomicU64,
    /// Responses matching no pending call
    anomalies: AtomicU64,
    /// Undecodable frames or payloads
    protocol_errors: AtomicU64,
}

macro_rules! recorders {
    ($($fn_name:ident => $field:ident),* $(,)?) => {
        $(
            #[inline]
            pub(crate) fn $fn_name(&self) {
                self.$field.fetch_add(1, Ordering::Relaxed);
            }
        )*
    };
}

impl DispatcherMetrics {
    recorders! {
        record_call_sent => calls_sent,
        record_post_sent => posts_sent,
        record_completed => completed,
        record_failed => failed,
        record_canceled => canceled,
        record_event => events,
        record_inbound => inbound,
        record_anomaly => anomalies,
        record_protocol_error => protocol_errors,
    }

    pub(crate) fn snapshot(&self) -> DispatcherStats {
        DispatcherStats {
            calls_sent: self.calls_sent.load(Ordering::Relaxed),
            posts_sent: self.posts_sent.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            canceled: self.canceled.load(Ordering::Relaxed),
            events: self.events.load(Ordering::Relaxed),
            inbound: self.inbound.load(Ordering::Relaxed),
            anomalies: self.anomalies.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the dispatcher counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatcherStats {
    pub calls_sent: u64,
    pub posts_sent: u64,
    pub completed: u64,
    pub failed: u64,
    pub canceled: u64,
    pub events: u64,
    pub inbound: u64,
    /// Replies, errors or cancel acknowledgements with no pending call.
    pub anomalies: u64,
    pub protocol_errors: u64,
}

impl DispatcherStats {
    /// Calls that reached a terminal state.
    #[must_use]
    pub fn finished(&self) -> u64 {
        self.completed + self.failed + self.canceled
    }
}
