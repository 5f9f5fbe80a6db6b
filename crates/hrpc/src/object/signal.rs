// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Subscriber lists for signals and property-change notifications.

use crate::value::Value;
use parking_lot::Mutex;
use std::sync::Arc;

/// Handle of one subscription, unique within an object.
pub type LinkId = u64;

/// Callback receiving the (converted) signal arguments.
pub type Subscriber = Arc<dyn Fn(&[Value]) + Send + Sync>;

/// Ordered subscriber list of one signal.
///
/// Delivery snapshots the list and calls subscribers with no lock held, so
/// a subscriber may connect or disconnect from inside its callback.
#[derive(Default)]
pub(crate) struct SignalHub {
    subscribers: Mutex<Vec<(LinkId, Subscriber)>>,
}

impl SignalHub {
    pub(crate) fn connect(&self, link: LinkId, subscriber: Subscriber) {
        self.subscribers.lock().push((link, subscriber));
    }

    /// Remove `link`; false when it is not subscribed here.
    pub(crate) fn disconnect(&self, link: LinkId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(id, _)| *id != link);
        subscribers.len() != before
    }

    /// Deliver `args` to every subscriber, in subscription order.
    ///
    /// A panicking subscriber is logged and skipped; the others still run.
    /// Returns the number of subscribers called.
    pub(crate) fn emit(&self, args: &[Value]) -> usize {
        let snapshot: Vec<(LinkId, Subscriber)> = self
            .subscribers
            .lock()
            .iter()
            .map(|(link, s)| (*link, Arc::clone(s)))
            .collect();
        for (link, subscriber) in &snapshot {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                subscriber(args);
            }));
            if result.is_err() {
                log::debug!("[signal] subscriber {} panicked during delivery", link);
            }
        }
        snapshot.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.subscribers.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_in_subscription_order() {
        let hub = SignalHub::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in 0..3 {
            let seen = Arc::clone(&seen);
            hub.connect(tag, Arc::new(move |_: &[Value]| seen.lock().push(tag)));
        }
        assert_eq!(hub.emit(&[]), 3);
        assert_eq!(*seen.lock(), vec![0, 1, 2]);
    }

    #[test]
    fn test_disconnect_stale_link_is_noop() {
        let hub = SignalHub::default();
        hub.connect(1, Arc::new(|_: &[Value]| {}));
        assert!(hub.disconnect(1));
        assert!(!hub.disconnect(1));
        assert_eq!(hub.len(), 0);
        assert_eq!(hub.emit(&[Value::I32(1)]), 0);
    }

    #[test]
    fn test_panicking_subscriber_isolated() {
        let hub = SignalHub::default();
        let hits = Arc::new(Mutex::new(0));
        hub.connect(1, Arc::new(|_: &[Value]| panic!("subscriber failure")));
        let counter = Arc::clone(&hits);
        hub.connect(2, Arc::new(move |_: &[Value]| *counter.lock() += 1));
        assert_eq!(hub.emit(&[]), 2);
        assert_eq!(*hits.lock(), 1);
    }

    #[test]
    fn test_subscriber_may_disconnect_itself() {
        let hub = Arc::new(SignalHub::default());
        let weak = Arc::downgrade(&hub);
        hub.connect(
            5,
            Arc::new(move |_: &[Value]| {
                if let Some(hub) = weak.upgrade() {
                    hub.disconnect(5);
                }
            }),
        );
        assert_eq!(hub.emit(&[]), 1);
        assert_eq!(hub.emit(&[]), 0);
    }
}
