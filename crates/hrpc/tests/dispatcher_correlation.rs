// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Two dispatchers over an in-memory transport: correlation under
//! concurrency, reordering and connection loss.

use hrpc::config::Limits;
use hrpc::dispatch::{CallRequest, CallStatus, MessageDispatcher};
use hrpc::message::{Frame, MessageAddress, MessageKind};
use hrpc::transport::MemoryTransport;
use hrpc::{CallError, Value};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const ADDRESS: MessageAddress = MessageAddress::new(2, 1, 100);
const WAIT: Duration = Duration::from_secs(5);

fn connected() -> (MessageDispatcher, MessageDispatcher, Arc<MemoryTransport>) {
    let (ta, tb) = MemoryTransport::pair();
    let client = MessageDispatcher::new(ta.clone());
    let server = MessageDispatcher::new(tb.clone());
    ta.start(Arc::new(client.downgrade())).expect("start a");
    tb.start(Arc::new(server.downgrade())).expect("start b");
    (client, server, tb)
}

/// Answer every call with its first argument plus one.
fn serve_increment(server: &MessageDispatcher) {
    let weak = server.downgrade();
    server.set_inbound_handler(move |frame: Frame| {
        let Some(server) = weak.upgrade() else {
            return;
        };
        let args = frame.args(&Limits::default()).expect("args");
        let n = args[0].as_i64().expect("integer argument");
        server
            .send_frame(&Frame::reply_to(&frame, &Value::I64(n + 1)))
            .expect("reply");
    });
}

fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = Instant::now() + WAIT;
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn concurrent_callers_get_their_own_replies() {
    let (client, server, _tb) = connected();
    serve_increment(&server);

    let workers: Vec<_> = (0..8i64)
        .map(|worker| {
            let client = client.clone();
            thread::spawn(move || {
                for i in 0..100i64 {
                    let n = worker * 1000 + i;
                    let handle = client
                        .send(CallRequest::inferred(ADDRESS, vec![Value::I64(n)]))
                        .expect("send");
                    assert_eq!(handle.wait_timeout(WAIT), Some(Ok(Value::I64(n + 1))));
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().expect("worker");
    }

    let stats = client.stats();
    assert_eq!(stats.calls_sent, 800);
    assert_eq!(stats.completed, 800);
    assert_eq!(stats.anomalies, 0);
    assert_eq!(client.pending_count(), 0);
    assert_eq!(server.stats().inbound, 800);
}

#[test]
fn replies_in_reverse_order_reach_the_right_handles() {
    let (client, server, _tb) = connected();
    let held = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&held);
    server.set_inbound_handler(move |frame: Frame| sink.lock().push(frame));

    let handles: Vec<_> = (0..10)
        .map(|i| {
            client
                .send(CallRequest::inferred(ADDRESS, vec![Value::I32(i)]))
                .expect("send")
        })
        .collect();
    wait_until("all calls to arrive", || held.lock().len() == 10);

    let calls = std::mem::take(&mut *held.lock());
    for call in calls.iter().rev() {
        let arg = call.args(&Limits::default()).expect("args")[0].clone();
        server
            .send_frame(&Frame::reply_to(call, &Value::List(vec![arg])))
            .expect("reply");
    }
    for (i, handle) in handles.iter().enumerate() {
        assert_eq!(
            handle.wait_timeout(WAIT),
            Some(Ok(Value::List(vec![Value::I32(i as i32)])))
        );
    }
}

#[test]
fn continuation_runs_once_with_the_result() {
    let (client, server, _tb) = connected();
    serve_increment(&server);

    let (tx, rx) = crossbeam::channel::unbounded();
    let handle = client
        .send(CallRequest::inferred(ADDRESS, vec![Value::I32(41)]))
        .expect("send");
    handle.then(move |result| {
        let _ = tx.send(result.clone());
    });
    assert_eq!(rx.recv_timeout(WAIT), Ok(Ok(Value::I64(42))));
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
}

#[test]
fn peer_close_fails_every_pending_call() {
    let (client, server, tb) = connected();
    server.set_inbound_handler(|_frame: Frame| {});

    let handles: Vec<_> = (0..10)
        .map(|i| {
            client
                .send(CallRequest::inferred(ADDRESS, vec![Value::I32(i)]))
                .expect("send")
        })
        .collect();
    wait_until("calls to reach the server", || server.stats().inbound == 10);

    hrpc::transport::Transport::close(tb.as_ref());
    for handle in &handles {
        assert_eq!(handle.wait_timeout(WAIT), Some(Err(CallError::Disconnected)));
        assert_eq!(handle.status(), CallStatus::Failed);
    }
    assert!(client.is_closed());
    assert_eq!(client.stats().failed, 10);
    assert_eq!(
        client
            .send(CallRequest::inferred(ADDRESS, vec![]))
            .map(|h| h.id()),
        Err(CallError::Disconnected)
    );
}

#[test]
fn wait_or_cancel_gives_up_and_tells_the_peer() {
    let (client, server, _tb) = connected();
    let cancels = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&cancels);
    server.set_inbound_handler(move |frame: Frame| {
        if frame.kind == MessageKind::Cancel {
            seen.lock().push(frame.cancel_target().expect("cancel target"));
        }
    });

    let handle = client
        .send(CallRequest::inferred(ADDRESS, vec![Value::I32(1)]))
        .expect("send");
    assert_eq!(
        handle.wait_or_cancel(Duration::from_millis(20)),
        Err(CallError::Timeout)
    );
    assert_eq!(handle.status(), CallStatus::Canceled);
    wait_until("cancel frame", || cancels.lock().as_slice() == [handle.id()]);
}

#[cfg(feature = "async")]
#[tokio::test]
async fn handles_are_futures() {
    let (client, server, _tb) = connected();
    serve_increment(&server);

    let handle = client
        .send(CallRequest::inferred(ADDRESS, vec![Value::I32(1)]))
        .expect("send");
    assert_eq!(handle.await, Ok(Value::I64(2)));

    server.set_inbound_handler(|_frame: Frame| {});
    let silent = client
        .send(CallRequest::inferred(ADDRESS, vec![Value::I32(1)]))
        .expect("send");
    assert_eq!(
        silent.with_timeout(Duration::from_millis(20)).await,
        Err(CallError::Timeout)
    );
    assert_eq!(client.pending_count(), 0);
}
