// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::*;
use crate::dispatch::CallStatus;
use crate::error::CallError;
use crate::object::{DynamicObject, ObjectBuilder, Subscriber, ThreadingModel};
use crate::value::Value;
use crossbeam::channel::{self, Receiver, Sender};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(5);

fn calculator() -> DynamicObject {
    let mut builder = ObjectBuilder::new();
    builder
        .advertise_fn("add", |a: i32, b: i32| a + b)
        .expect("add(ii)");
    builder
        .advertise_fn("add", |a: String, b: String| a + &b)
        .expect("add(ss)");
    builder
        .advertise_try_fn("parse", |text: String| text.parse::<i32>())
        .expect("parse");
    builder.advertise_signal("ticked", "i").expect("signal");
    builder
        .advertise_property("volume", "i", Value::I32(3))
        .expect("property");
    builder.build()
}

fn serve(object: DynamicObject) -> (Session, Session, Arc<DynamicObject>) {
    let directory = Arc::new(LocalDirectory::new());
    let (server, client) = Session::pair(directory).expect("pair");
    let object = Arc::new(object);
    server
        .register_service("calculator", Arc::clone(&object))
        .expect("register");
    (server, client, object)
}

fn collector() -> (Subscriber, Receiver<Vec<Value>>) {
    let (tx, rx): (Sender<Vec<Value>>, _) = channel::unbounded();
    let subscriber: Subscriber = Arc::new(move |args: &[Value]| {
        let _ = tx.send(args.to_vec());
    });
    (subscriber, rx)
}

fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = Instant::now() + WAIT;
    while !condition() {
        assert!(Instant::now() < deadline, "timed out waiting for {}", what);
        std::thread::sleep(Duration::from_millis(2));
    }
}

#[test]
fn test_remote_overloads_resolve_on_the_client() {
    let (_server, client, _object) = serve(calculator());
    let remote = client.service("calculator").expect("proxy");

    assert_eq!(
        remote.call_as::<i32>("add", vec![Value::I32(2), Value::I32(40)]),
        Ok(42)
    );
    assert_eq!(
        remote.call_as::<String>("add", vec!["foo".into(), "bar".into()]),
        Ok("foobar".to_owned())
    );
    assert_eq!(
        remote.call_as::<i32>("add::(ii)", vec![Value::U8(1), Value::I64(1)]),
        Ok(2)
    );
    assert_eq!(remote.meta_object().overloads("add").count(), 2);
}

#[test]
fn test_remote_errors() {
    let (_server, client, _object) = serve(calculator());
    let remote = client.service("calculator").expect("proxy");

    match remote.call("parse", vec!["forty".into()]).expect("sent").wait() {
        Err(CallError::Remote(msg)) => assert!(msg.contains("invalid digit"), "{}", msg),
        other => panic!("unexpected {:?}", other),
    }

    let sent_before = client.dispatcher().stats().calls_sent;
    assert!(matches!(
        remote.call("missing", vec![]),
        Err(CallError::Resolution(_))
    ));
    assert_eq!(client.dispatcher().stats().calls_sent, sent_before);

    assert!(matches!(client.service("nope"), Err(Error::Directory(_))));
    match client.remote_object(99, MAIN_OBJECT_ID) {
        Err(Error::Call(CallError::Remote(msg))) => assert_eq!(msg, "unknown object 1"),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_properties_over_the_wire() {
    let (_server, client, object) = serve(calculator());
    let remote = client.service("calculator").expect("proxy");
    let volume = object.meta_object().property_id("volume").expect("volume");

    assert_eq!(remote.property("volume"), Ok(Value::I32(3)));
    remote
        .set_property("volume", Value::I64(7))
        .expect("set volume");
    assert_eq!(object.property(volume), Ok(Value::I32(7)));

    assert!(matches!(
        remote.set_property("volume", "loud".into()),
        Err(CallError::Remote(_))
    ));
    assert!(matches!(
        remote.property("pitch"),
        Err(CallError::Resolution(_))
    ));
}

#[test]
fn test_signal_subscription_round_trip() {
    let (server, client, object) = serve(calculator());
    let remote = client.service("calculator").expect("proxy");
    let ticked = object.meta_object().signal_id("ticked").expect("ticked");

    let (subscriber, events) = collector();
    let link = remote.connect("ticked", subscriber).expect("connect");
    assert_eq!(object.subscriber_count(ticked), 1);
    assert_eq!(server.host().remote_link_count(), 1);

    object.post(ticked, &[Value::I64(5)]).expect("post");
    assert_eq!(events.recv_timeout(WAIT), Ok(vec![Value::I32(5)]));

    remote.disconnect(link).expect("disconnect");
    assert_eq!(object.subscriber_count(ticked), 0);
    assert_eq!(server.host().remote_link_count(), 0);
    object.post(ticked, &[Value::I32(6)]).expect("post");
    assert!(events.recv_timeout(Duration::from_millis(50)).is_err());

    assert!(remote.disconnect(link).is_err());
}

#[test]
fn test_property_changes_are_events() {
    let (_server, client, object) = serve(calculator());
    let remote = client.service("calculator").expect("proxy");
    let volume = object.meta_object().property_id("volume").expect("volume");

    let (subscriber, events) = collector();
    remote.connect("volume", subscriber).expect("connect");
    object.set_property(volume, Value::I32(11)).expect("set");
    assert_eq!(events.recv_timeout(WAIT), Ok(vec![Value::I32(11)]));
}

#[test]
fn test_remote_post_emits_signal_on_server() {
    let (_server, client, object) = serve(calculator());
    let remote = client.service("calculator").expect("proxy");
    let ticked = object.meta_object().signal_id("ticked").expect("ticked");

    let (subscriber, events) = collector();
    object.connect(ticked, subscriber).expect("local connect");
    remote.post("ticked", vec![Value::I32(9)]).expect("post");
    assert_eq!(events.recv_timeout(WAIT), Ok(vec![Value::I32(9)]));
}

/// Object whose `block` method parks its worker until released.
fn blocking_object(
    runs: Arc<AtomicUsize>,
    release: Receiver<()>,
) -> DynamicObject {
    let mut builder = ObjectBuilder::new();
    builder.set_threading_model(ThreadingModel::MultiThread);
    builder
        .advertise_fn("block", move |tag: i32| {
            runs.fetch_add(1, Ordering::SeqCst);
            let _ = release.recv_timeout(WAIT);
            tag
        })
        .expect("block");
    builder.build()
}

#[test]
fn test_cancel_of_queued_call_never_runs_it() {
    let config = RuntimeConfig::new();
    config.set_executor_threads(1);
    let directory = Arc::new(LocalDirectory::new());
    let (server, client) = Session::pair_with_config(directory, config).expect("pair");

    let runs = Arc::new(AtomicUsize::new(0));
    let (release, released) = channel::unbounded();
    server
        .register_service(
            "slow",
            Arc::new(blocking_object(Arc::clone(&runs), released)),
        )
        .expect("register");
    let remote = client.service("slow").expect("proxy");

    let first = remote.call("block", vec![Value::I32(1)]).expect("first");
    wait_until("first call to start", || runs.load(Ordering::SeqCst) == 1);
    let second = remote.call("block", vec![Value::I32(2)]).expect("second");

    assert!(second.cancel());
    assert_eq!(second.status(), CallStatus::Canceled);
    // The server answers the cancel with a Canceled frame nobody waits for.
    wait_until("late Canceled frame", || {
        client.dispatcher().stats().anomalies == 1
    });

    release.send(()).expect("release");
    assert_eq!(first.wait(), Ok(Value::I32(1)));
    assert_eq!(second.wait(), Err(CallError::Canceled));
    server.close();
    assert_eq!(runs.load(Ordering::SeqCst), 1);
}

#[test]
fn test_closing_client_fails_pending_calls() {
    let directory = Arc::new(LocalDirectory::new());
    let (server, client) = Session::pair(directory).expect("pair");
    let runs = Arc::new(AtomicUsize::new(0));
    let (release, released) = channel::unbounded();
    server
        .register_service(
            "slow",
            Arc::new(blocking_object(Arc::clone(&runs), released)),
        )
        .expect("register");
    let remote = client.service("slow").expect("proxy");

    let pending = remote.call("block", vec![Value::I32(1)]).expect("sent");
    wait_until("call to start", || runs.load(Ordering::SeqCst) == 1);
    client.close();
    assert_eq!(pending.wait(), Err(CallError::Disconnected));
    assert_eq!(pending.status(), CallStatus::Failed);
    assert!(matches!(
        remote.call("block", vec![Value::I32(2)]),
        Err(CallError::Disconnected)
    ));

    release.send(()).expect("release");
    wait_until("server to see the disconnect", || {
        server.dispatcher().is_closed()
    });
}

#[test]
fn test_service_registration_lifecycle() {
    let directory = Arc::new(LocalDirectory::new());
    let (server, client) = Session::pair(directory.clone()).expect("pair");

    let id = server
        .register_service("calculator", Arc::new(calculator()))
        .expect("register");
    assert!(server
        .register_service("calculator", Arc::new(calculator()))
        .is_err());
    assert_eq!(
        client.lookup_service("calculator").map(|s| s.service_id),
        Some(id)
    );
    assert_eq!(client.services()[0].endpoint, server.endpoint());

    assert!(client.unregister_service(id).is_err());
    server.unregister_service(id).expect("unregister");
    assert!(directory.lookup_service("calculator").is_none());
    assert!(server.host().object(id, MAIN_OBJECT_ID).is_none());

    let again = server
        .register_service("calculator", Arc::new(calculator()))
        .expect("register again");
    drop(server);
    assert!(directory.lookup_service("calculator").is_none());
    assert!(directory.unregister_service(again).is_err());
}

/// Directory handing out one fixed id and refusing to forget it.
struct FixedIdDirectory;

impl ServiceDirectory for FixedIdDirectory {
    fn register_service(&self, _name: &str, _endpoint: &str) -> Result<u32> {
        Ok(500)
    }

    fn unregister_service(&self, id: u32) -> Result<()> {
        Err(crate::error::Error::Directory(format!("{} is pinned", id)))
    }

    fn lookup_service(&self, _name: &str) -> Option<ServiceInfo> {
        None
    }

    fn services(&self) -> Vec<ServiceInfo> {
        Vec::new()
    }
}

#[test]
fn test_failed_hosting_rolls_back_directory_entry() {
    let directory = Arc::new(LocalDirectory::new());
    let (server, _client) = Session::pair(directory.clone()).expect("pair");
    let next_id = crate::config::FIRST_USER_SERVICE_ID;
    server
        .host()
        .register(next_id, MAIN_OBJECT_ID, Arc::new(calculator()))
        .expect("occupy");

    let err = server
        .register_service("calculator", Arc::new(calculator()))
        .expect_err("slot taken");
    assert!(matches!(err, crate::error::Error::Directory(ref m) if m.contains("already hosted")));
    assert!(directory.lookup_service("calculator").is_none());
}

#[test]
fn test_failed_rollback_keeps_hosting_error() {
    let (server, _client) = Session::pair(Arc::new(FixedIdDirectory)).expect("pair");
    assert_eq!(
        server
            .register_service("first", Arc::new(calculator()))
            .expect("first"),
        500
    );
    let err = server
        .register_service("second", Arc::new(calculator()))
        .expect_err("id 500 already hosted");
    assert!(matches!(err, crate::error::Error::Directory(ref m) if m.contains("already hosted")));
    assert!(server.host().object(500, MAIN_OBJECT_ID).is_some());
}

#[test]
fn test_terminate_refuses_main_object() {
    let (_server, client, _object) = serve(calculator());
    let info = client.lookup_service("calculator").expect("info");
    let handle = client
        .dispatcher()
        .send(crate::dispatch::CallRequest::inferred(
            crate::message::MessageAddress::new(
                info.service_id,
                MAIN_OBJECT_ID,
                crate::config::ACTION_TERMINATE,
            ),
            vec![Value::U32(MAIN_OBJECT_ID)],
        ))
        .expect("sent");
    assert_eq!(
        handle.wait_timeout(WAIT),
        Some(Err(CallError::Remote(
            "main object cannot be terminated".into()
        )))
    );
}
