// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Table of calls awaiting a response.

use super::handle::CallShared;
use crate::message::MessageAddress;
use std::collections::HashMap;
use std::sync::Arc;

pub(crate) struct PendingCall {
    pub(crate) shared: Arc<CallShared>,
    pub(crate) address: MessageAddress,
}

/// Pending calls keyed by id, plus the id allocator.
///
/// Ids come from a wrapping counter that skips 0 and any id still pending.
/// Once closed (transport lost) nothing can be registered again.
pub(crate) struct PendingTable {
    entries: HashMap<u32, PendingCall>,
    next_id: u32,
    closed: bool,
}

impl PendingTable {
    pub(crate) fn new() -> Self {
        Self::starting_at(1)
    }

    pub(crate) fn starting_at(next_id: u32) -> Self {
        Self {
            entries: HashMap::new(),
            next_id,
            closed: false,
        }
    }

    pub(crate) fn allocate_id(&mut self) -> u32 {
        loop {
            let id = self.next_id;
            self.next_id = self.next_id.wrapping_add(1);
            if id != 0 && !self.entries.contains_key(&id) {
                return id;
            }
        }
    }

    pub(crate) fn insert(&mut self, id: u32, call: PendingCall) {
        self.entries.insert(id, call);
    }

    pub(crate) fn remove(&mut self, id: u32) -> Option<PendingCall> {
        self.entries.remove(&id)
    }

    #[inline]
    pub(crate) fn is_closed(&self) -> bool {
        self.closed
    }

    /// Close the table and hand back everything still pending.
    pub(crate) fn close(&mut self) -> Vec<PendingCall> {
        self.closed = true;
        self.entries.drain().map(|(_, call)| call).collect()
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(id: u32) -> PendingCall {
        PendingCall {
            shared: CallShared::new(id),
            address: MessageAddress::new(1, 1, 100),
        }
    }

    #[test]
    fn test_ids_wrap_and_skip_zero() {
        let mut table = PendingTable::starting_at(u32::MAX);
        assert_eq!(table.allocate_id(), u32::MAX);
        assert_eq!(table.allocate_id(), 1);
    }

    #[test]
    fn test_ids_skip_pending_entries() {
        let mut table = PendingTable::new();
        let first = table.allocate_id();
        table.insert(first, call(first));

        let mut wrapped = PendingTable::starting_at(first);
        wrapped.insert(first, call(first));
        assert_eq!(wrapped.allocate_id(), first + 1);
    }

    #[test]
    fn test_close_drains_entries() {
        let mut table = PendingTable::new();
        for _ in 0..3 {
            let id = table.allocate_id();
            table.insert(id, call(id));
        }
        assert_eq!(table.close().len(), 3);
        assert!(table.is_closed());
        assert_eq!(table.len(), 0);
        assert!(table.remove(1).is_none());
    }
}
