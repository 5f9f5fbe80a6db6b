// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Completion handles: the caller side of an outstanding call.

use crate::error::CallError;
use crate::types::NativeType;
use crate::value::Value;
use parking_lot::{Condvar, Mutex};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Weak};
use std::task::{Context, Poll, Waker};
use std::time::{Duration, Instant};

/// Outcome of a call, as seen by its handle.
pub type CallResult = Result<Value, CallError>;

type Continuation = Box<dyn FnOnce(&CallResult) + Send>;

/// Life cycle of a call.
///
/// `Created -> AwaitingReply -> Completed | Failed | Canceled`. The first
/// terminal transition wins; later ones are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStatus {
    Created,
    AwaitingReply,
    Completed,
    Failed,
    Canceled,
}

impl CallStatus {
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Canceled)
    }
}

/// Cancels a call by id at whatever tracks it (the dispatcher).
pub(crate) trait CallCanceller: Send + Sync {
    /// Returns true when the call was still pending.
    fn cancel_call(&self, id: u32) -> bool;
}

struct CallState {
    status: CallStatus,
    result: Option<CallResult>,
    wakers: Vec<Waker>,
    continuations: Vec<Continuation>,
}

/// State shared between a handle (and its clones) and the pending table.
pub(crate) struct CallShared {
    id: u32,
    state: Mutex<CallState>,
    done: Condvar,
}

impl CallShared {
    pub(crate) fn new(id: u32) -> Arc<Self> {
        Arc::new(Self {
            id,
            state: Mutex::new(CallState {
                status: CallStatus::Created,
                result: None,
                wakers: Vec::new(),
                continuations: Vec::new(),
            }),
            done: Condvar::new(),
        })
    }

    pub(crate) fn mark_awaiting(&self) {
        let mut state = self.state.lock();
        if state.status == CallStatus::Created {
            state.status = CallStatus::AwaitingReply;
        }
    }

    /// Move to the terminal state matching `result`.
    ///
    /// Returns false, and drops `result`, when the call already finished.
    pub(crate) fn complete(&self, result: CallResult) -> bool {
        let (wakers, continuations) = {
            let mut state = self.state.lock();
            if state.status.is_terminal() {
                return false;
            }
            state.status = match &result {
                Ok(_) => CallStatus::Completed,
                Err(CallError::Canceled) => CallStatus::Canceled,
                Err(_) => CallStatus::Failed,
            };
            state.result = Some(result);
            (
                std::mem::take(&mut state.wakers),
                std::mem::take(&mut state.continuations),
            )
        };
        self.done.notify_all();
        for waker in wakers {
            waker.wake();
        }
        if !continuations.is_empty() {
            if let Some(result) = self.state.lock().result.clone() {
                for continuation in continuations {
                    run_continuation(self.id, continuation, &result);
                }
            }
        }
        true
    }
}

fn run_continuation(id: u32, continuation: Continuation, result: &CallResult) {
    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| continuation(result)));
    if outcome.is_err() {
        log::debug!("[dispatch] continuation of call {} panicked", id);
    }
}

/// Observes the eventual result of one call.
///
/// Clones observe the same call. Results are delivered by value to every
/// observer. The handle can be waited on, polled, awaited (it implements
/// [`Future`]) or given continuations.
#[derive(Clone)]
pub struct CompletionHandle {
    shared: Arc<CallShared>,
    canceller: Option<Weak<dyn CallCanceller>>,
}

impl CompletionHandle {
    pub(crate) fn new(shared: Arc<CallShared>, canceller: Weak<dyn CallCanceller>) -> Self {
        Self {
            shared,
            canceller: Some(canceller),
        }
    }

    /// A handle that is already finished with `result`.
    #[must_use]
    pub fn resolved(result: CallResult) -> Self {
        let shared = CallShared::new(0);
        shared.complete(result);
        Self {
            shared,
            canceller: None,
        }
    }

    /// Call id on the wire (0 for locally resolved handles).
    #[inline]
    #[must_use]
    pub fn id(&self) -> u32 {
        self.shared.id
    }

    #[must_use]
    pub fn status(&self) -> CallStatus {
        self.shared.state.lock().status
    }

    #[inline]
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status().is_terminal()
    }

    /// The result, if the call has finished.
    #[must_use]
    pub fn try_result(&self) -> Option<CallResult> {
        self.shared.state.lock().result.clone()
    }

    /// Block until the call finishes.
    pub fn wait(&self) -> CallResult {
        let mut state = self.shared.state.lock();
        loop {
            if let Some(result) = &state.result {
                return result.clone();
            }
            self.shared.done.wait(&mut state);
        }
    }

    /// Block until the call finishes or `timeout` elapses.
    ///
    /// Returns `None` on timeout; the call stays pending.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<CallResult> {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        loop {
            if let Some(result) = &state.result {
                return Some(result.clone());
            }
            if self.shared.done.wait_until(&mut state, deadline).timed_out() {
                return state.result.clone();
            }
        }
    }

    /// Wait at most `timeout`, canceling the call when it expires.
    pub fn wait_or_cancel(&self, timeout: Duration) -> CallResult {
        match self.wait_timeout(timeout) {
            Some(result) => result,
            None => self.cancel_expired(),
        }
    }

    /// Cancel after a timeout. A reply or error that won the race against
    /// the cancel is returned as is.
    fn cancel_expired(&self) -> CallResult {
        self.cancel();
        match self.try_result() {
            None | Some(Err(CallError::Canceled)) => Err(CallError::Timeout),
            Some(result) => result,
        }
    }

    /// Whether `owner` is the tracker this handle cancels through.
    pub(crate) fn is_tracked_by(&self, owner: *const ()) -> bool {
        self.canceller
            .as_ref()
            .is_some_and(|canceller| canceller.as_ptr().cast::<()>() == owner)
    }

    /// Block until finished and convert the value to `T`.
    pub fn wait_as<T: NativeType>(&self) -> Result<T, CallError> {
        Ok(T::from_value(self.wait()?)?)
    }

    /// Run `continuation` with the result once the call finishes.
    ///
    /// Runs immediately, on the calling thread, when already finished.
    /// Otherwise it runs on the thread that completes the call.
    pub fn then<F>(&self, continuation: F)
    where
        F: FnOnce(&CallResult) + Send + 'static,
    {
        let result = {
            let mut state = self.shared.state.lock();
            match &state.result {
                Some(result) => result.clone(),
                None => {
                    state.continuations.push(Box::new(continuation));
                    return;
                }
            }
        };
        run_continuation(self.shared.id, Box::new(continuation), &result);
    }

    /// Request cancellation.
    ///
    /// No-op (returns false) when the call already finished. Otherwise the
    /// handle resolves to [`CallError::Canceled`] at once and the peer is
    /// told, best effort.
    pub fn cancel(&self) -> bool {
        if self.is_finished() {
            return false;
        }
        match self.canceller.as_ref().and_then(Weak::upgrade) {
            Some(canceller) => canceller.cancel_call(self.shared.id),
            None => self.shared.complete(Err(CallError::Canceled)),
        }
    }

    /// Await the result, canceling the call if `timeout` elapses first.
    #[cfg(feature = "async")]
    pub async fn with_timeout(self, timeout: Duration) -> CallResult {
        match tokio::time::timeout(timeout, self.clone()).await {
            Ok(result) => result,
            Err(_) => self.cancel_expired(),
        }
    }
}

impl Future for CompletionHandle {
    type Output = CallResult;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<CallResult> {
        let mut state = self.shared.state.lock();
        if let Some(result) = &state.result {
            return Poll::Ready(result.clone());
        }
        if !state.wakers.iter().any(|w| w.will_wake(cx.waker())) {
            state.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

impl std::fmt::Debug for CompletionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionHandle")
            .field("id", &self.shared.id)
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    fn pending(id: u32) -> (Arc<CallShared>, CompletionHandle) {
        let shared = CallShared::new(id);
        let handle = CompletionHandle {
            shared: Arc::clone(&shared),
            canceller: None,
        };
        (shared, handle)
    }

    #[test]
    fn test_first_terminal_transition_wins() {
        let (shared, handle) = pending(1);
        assert_eq!(handle.status(), CallStatus::Created);
        shared.mark_awaiting();
        assert_eq!(handle.status(), CallStatus::AwaitingReply);

        assert!(shared.complete(Ok(Value::I32(1))));
        assert!(!shared.complete(Err(CallError::Remote("late".into()))));
        assert!(!handle.cancel());
        assert_eq!(handle.status(), CallStatus::Completed);
        assert_eq!(handle.try_result(), Some(Ok(Value::I32(1))));
    }

    #[test]
    fn test_status_follows_result_kind() {
        let (failed, handle) = pending(2);
        failed.complete(Err(CallError::Disconnected));
        assert_eq!(handle.status(), CallStatus::Failed);

        let (_, handle) = pending(3);
        assert!(handle.cancel());
        assert_eq!(handle.status(), CallStatus::Canceled);
        assert_eq!(handle.wait(), Err(CallError::Canceled));
    }

    #[test]
    fn test_wait_wakes_on_completion() {
        let (shared, handle) = pending(4);
        let waiter = thread::spawn(move || handle.wait());
        thread::sleep(Duration::from_millis(20));
        shared.complete(Ok(Value::String("done".into())));
        assert_eq!(waiter.join().expect("join"), Ok(Value::String("done".into())));
    }

    #[test]
    fn test_wait_timeout_leaves_call_pending() {
        let (_, handle) = pending(5);
        assert_eq!(handle.wait_timeout(Duration::from_millis(10)), None);
        assert!(!handle.is_finished());
        assert_eq!(
            handle.wait_or_cancel(Duration::from_millis(10)),
            Err(CallError::Timeout)
        );
        assert_eq!(handle.status(), CallStatus::Canceled);
    }

    /// Tracker whose cancel loses to an error reply arriving first.
    struct ErrorWins(Arc<CallShared>);

    impl CallCanceller for ErrorWins {
        fn cancel_call(&self, _id: u32) -> bool {
            self.0.complete(Err(CallError::Remote("overloaded".into())));
            false
        }
    }

    #[test]
    fn test_timeout_keeps_result_that_beat_the_cancel() {
        let shared = CallShared::new(8);
        let tracker: Arc<dyn CallCanceller> = Arc::new(ErrorWins(Arc::clone(&shared)));
        let handle = CompletionHandle::new(Arc::clone(&shared), Arc::downgrade(&tracker));

        assert_eq!(
            handle.wait_or_cancel(Duration::from_millis(10)),
            Err(CallError::Remote("overloaded".into()))
        );
        assert_eq!(handle.status(), CallStatus::Failed);
    }

    #[test]
    fn test_tracked_by_compares_tracker_identity() {
        let shared = CallShared::new(9);
        let tracker: Arc<dyn CallCanceller> = Arc::new(ErrorWins(Arc::clone(&shared)));
        let other: Arc<dyn CallCanceller> = Arc::new(ErrorWins(Arc::clone(&shared)));
        let handle = CompletionHandle::new(shared, Arc::downgrade(&tracker));

        assert!(handle.is_tracked_by(Arc::as_ptr(&tracker).cast()));
        assert!(!handle.is_tracked_by(Arc::as_ptr(&other).cast()));
        assert!(!CompletionHandle::resolved(Ok(Value::Void)).is_tracked_by(Arc::as_ptr(&tracker).cast()));
    }

    #[test]
    fn test_continuations_run_once() {
        let (shared, handle) = pending(6);
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        handle.then(move |result| {
            assert_eq!(result, &Ok(Value::U8(9)));
            counter.fetch_add(1, Ordering::SeqCst);
        });
        handle.then(|_| panic!("isolated"));
        shared.complete(Ok(Value::U8(9)));
        shared.complete(Ok(Value::U8(10)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // Registered after completion: runs inline.
        let counter = Arc::clone(&hits);
        handle.then(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_resolved_handle_and_native_result() {
        let handle = CompletionHandle::resolved(Ok(Value::I64(12)));
        assert_eq!(handle.id(), 0);
        assert_eq!(handle.wait_as::<u16>(), Ok(12));
        assert!(handle.wait_as::<String>().is_err());
    }
}
