// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Serving local objects to the peer of a dispatcher.

use crate::config::{
    ACTION_GET_PROPERTY, ACTION_META_OBJECT, ACTION_PROPERTIES, ACTION_REGISTER_EVENT,
    ACTION_SET_PROPERTY, ACTION_TERMINATE, ACTION_UNREGISTER_EVENT, FIRST_USER_ACTION_ID,
    MAIN_OBJECT_ID,
};
use crate::dispatch::WeakDispatcher;
use crate::error::{CallError, Error};
use crate::executor::Executor;
use crate::message::{Frame, MessageAddress, MessageKind};
use crate::object::{
    convert_args, DynamicObject, LinkId, ObjectPtr, ResolutionError, Subscriber, ThreadingModel,
};
use crate::signature::{Element, Signature};
use crate::types::NativeType;
use crate::value::Value;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// `(service, object, link chosen by the peer)`
type RemoteLinkKey = (u32, u32, LinkId);

/// Answers Call, Post and Cancel frames addressed to local objects.
///
/// Actions below [`FIRST_USER_ACTION_ID`] are the built-ins every object
/// understands (meta-object, event registration, properties, terminate).
/// Other actions invoke the object's methods, inline for `SingleThread`
/// objects and on the executor for `MultiThread` ones. Every Call gets
/// exactly one answer: Reply, Error, or Canceled when a queued call is
/// canceled before it starts.
pub struct ObjectHost {
    objects: DashMap<(u32, u32), ObjectPtr>,
    dispatcher: WeakDispatcher,
    executor: Option<Arc<Executor>>,
    links: Mutex<HashMap<RemoteLinkKey, LinkId>>,
    queued: Mutex<HashSet<u32>>,
}

impl ObjectHost {
    pub fn new(dispatcher: WeakDispatcher, executor: Option<Arc<Executor>>) -> Self {
        Self {
            objects: DashMap::new(),
            dispatcher,
            executor,
            links: Mutex::new(HashMap::new()),
            queued: Mutex::new(HashSet::new()),
        }
    }

    /// Serve `object` at `(service, object_id)`.
    pub fn register(&self, service: u32, object_id: u32, object: ObjectPtr) -> Result<(), Error> {
        match self.objects.entry((service, object_id)) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(Error::Directory(format!(
                "object {}.{} already hosted",
                service, object_id
            ))),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(object);
                log::debug!("[host] serving object {}.{}", service, object_id);
                Ok(())
            }
        }
    }

    /// Stop serving an object; its remote subscriptions are dropped.
    pub fn unregister(&self, service: u32, object_id: u32) -> Option<ObjectPtr> {
        let (_, object) = self.objects.remove(&(service, object_id))?;
        let mut links = self.links.lock();
        links.retain(|&(s, o, _), local| {
            let keep = (s, o) != (service, object_id);
            if !keep {
                object.disconnect(*local);
            }
            keep
        });
        Some(object)
    }

    #[must_use]
    pub fn object(&self, service: u32, object_id: u32) -> Option<ObjectPtr> {
        self.objects.get(&(service, object_id)).map(|o| Arc::clone(&o))
    }

    /// Number of signal subscriptions held for the peer.
    #[must_use]
    pub fn remote_link_count(&self) -> usize {
        self.links.lock().len()
    }

    /// Drop every subscription held for the peer (connection gone).
    pub fn disconnect_remote_links(&self) {
        let links = std::mem::take(&mut *self.links.lock());
        for ((service, object_id, _), local) in links {
            if let Some(object) = self.object(service, object_id) {
                object.disconnect(local);
            }
        }
    }

    /// Entry point for inbound frames.
    pub fn handle_frame(self: &Arc<Self>, frame: Frame) {
        match frame.kind {
            MessageKind::Call => self.on_call(frame),
            MessageKind::Post => self.on_post(&frame),
            MessageKind::Cancel => self.on_cancel(&frame),
            other => log::debug!("[host] ignoring {} frame {}", other, frame.address),
        }
    }

    fn on_call(self: &Arc<Self>, frame: Frame) {
        let address = frame.address;
        let Some(object) = self.object(address.service, address.object) else {
            self.answer(
                &frame,
                Err(CallError::Unknown {
                    what: "object",
                    id: address.object,
                }),
            );
            return;
        };

        let queue = address.action >= FIRST_USER_ACTION_ID
            && object.threading_model() == ThreadingModel::MultiThread;
        if let (true, Some(executor)) = (queue, self.executor.as_ref()) {
            let id = frame.id;
            self.queued.lock().insert(id);
            let host = Arc::clone(self);
            let accepted = executor.spawn(move || {
                // Absent when canceled while waiting in the queue.
                if host.queued.lock().remove(&id) {
                    let result = host.execute(&object, &frame);
                    host.answer(&frame, result);
                }
            });
            if !accepted {
                self.queued.lock().remove(&id);
                self.answer(
                    &Frame::new(MessageKind::Call, id, address),
                    Err(CallError::Method("executor stopped".into())),
                );
            }
            return;
        }

        let result = self.execute(&object, &frame);
        self.answer(&frame, result);
    }

    fn on_post(&self, frame: &Frame) {
        let address = frame.address;
        let Some(object) = self.object(address.service, address.object) else {
            log::debug!("[host] post to unknown object {}", address);
            return;
        };
        let result = self.decode_args(frame).and_then(|args| {
            if object.meta_object().signal(address.action).is_some() {
                object.post(address.action, &args).map(|_| ())
            } else {
                object.invoke(address.action, &args).map(|_| ())
            }
        });
        if let Err(e) = result {
            log::debug!("[host] post to {} failed: {}", address, e);
        }
    }

    fn on_cancel(&self, frame: &Frame) {
        let target = match frame.cancel_target() {
            Ok(target) => target,
            Err(e) => {
                log::debug!("[host] bad cancel request from {}: {}", frame.address, e);
                return;
            }
        };
        if self.queued.lock().remove(&target) {
            log::debug!("[host] call {} canceled before it ran", target);
            self.send(&Frame::new(MessageKind::Canceled, target, frame.address));
        } else {
            log::trace!("[host] call {} is running or done, cancel ignored", target);
        }
    }

    fn decode_args(&self, frame: &Frame) -> Result<Vec<Value>, CallError> {
        let limits = match self.dispatcher.upgrade() {
            Some(dispatcher) => dispatcher.config().limits(),
            None => crate::config::Limits::default(),
        };
        Ok(frame.args(&limits)?)
    }

    fn execute(&self, object: &DynamicObject, frame: &Frame) -> Result<Value, CallError> {
        let args = self.decode_args(frame)?;
        let address = frame.address;
        match address.action {
            action if action >= FIRST_USER_ACTION_ID => object.invoke(action, &args),
            ACTION_META_OBJECT => Ok(object.meta_object().to_value()),
            ACTION_REGISTER_EVENT => {
                let (signal, remote) = link_args(&args)?;
                self.register_event(object, address, signal, remote)
            }
            ACTION_UNREGISTER_EVENT => {
                let (_, remote) = link_args(&args)?;
                let local = self
                    .links
                    .lock()
                    .remove(&(address.service, address.object, remote))
                    .ok_or_else(|| {
                        CallError::Method(format!("no event link {} on {}", remote, address))
                    })?;
                object.disconnect(local);
                Ok(Value::Void)
            }
            ACTION_TERMINATE => {
                if address.object == MAIN_OBJECT_ID {
                    return Err(CallError::Method("main object cannot be terminated".into()));
                }
                self.unregister(address.service, address.object);
                Ok(Value::Void)
            }
            ACTION_GET_PROPERTY => object.property(property_uid(object, args.first())?),
            ACTION_SET_PROPERTY => {
                let [key, value] = <[Value; 2]>::try_from(args).map_err(|args| {
                    CallError::ArgumentCount {
                        expected: 2,
                        found: args.len(),
                    }
                })?;
                object.set_property(property_uid(object, Some(&key))?, value.into_unwrapped())?;
                Ok(Value::Void)
            }
            ACTION_PROPERTIES => Ok(Value::List(
                object.property_names().into_iter().map(Value::String).collect(),
            )),
            action => Err(CallError::Unknown {
                what: "action",
                id: action,
            }),
        }
    }

    fn register_event(
        &self,
        object: &DynamicObject,
        address: MessageAddress,
        signal: u32,
        remote: LinkId,
    ) -> Result<Value, CallError> {
        let meta = object.meta_object();
        let signature = meta
            .signal(signal)
            .map(|s| s.signature.clone())
            .or_else(|| meta.property(signal).map(|p| p.signature.clone()))
            .ok_or(CallError::Unknown {
                what: "signal",
                id: signal,
            })?;
        let event_address = MessageAddress::new(address.service, address.object, signal);
        let dispatcher = self.dispatcher.clone();
        let forward: Subscriber = Arc::new(move |args: &[Value]| {
            let Some(dispatcher) = dispatcher.upgrade() else {
                return;
            };
            match Frame::with_args(MessageKind::Event, 0, event_address, &signature, args) {
                Ok(event) => {
                    if let Err(e) = dispatcher.send_frame(&event) {
                        log::debug!("[host] event {} not sent: {}", event_address, e);
                    }
                }
                Err(e) => log::warn!("[host] event {} not encodable: {}", event_address, e),
            }
        });
        let local = object.connect(signal, forward)?;
        let previous = self
            .links
            .lock()
            .insert((address.service, address.object, remote), local);
        if let Some(previous) = previous {
            object.disconnect(previous);
        }
        log::debug!(
            "[host] peer link {} -> local link {} on {}",
            remote,
            local,
            event_address
        );
        Ok(Value::U64(local))
    }

    fn answer(&self, request: &Frame, result: Result<Value, CallError>) {
        let response = match result {
            Ok(value) => Frame::reply_to(request, &value),
            Err(CallError::Canceled) => {
                Frame::new(MessageKind::Canceled, request.id, request.address)
            }
            Err(e) => {
                log::debug!("[host] call {} on {} failed: {}", request.id, request.address, e);
                Frame::error_to(request, &e.remote_message())
            }
        };
        self.send(&response);
    }

    fn send(&self, frame: &Frame) {
        match self.dispatcher.upgrade() {
            Some(dispatcher) => {
                if let Err(e) = dispatcher.send_frame(frame) {
                    log::debug!("[host] {} {} not sent: {}", frame.kind, frame.id, e);
                }
            }
            None => log::debug!("[host] dispatcher gone, {} {} dropped", frame.kind, frame.id),
        }
    }
}

impl std::fmt::Debug for ObjectHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectHost")
            .field("objects", &self.objects.len())
            .field("remote_links", &self.remote_link_count())
            .finish()
    }
}

/// `(object, signal, link)` arguments of the event registration actions.
fn link_args(args: &[Value]) -> Result<(u32, LinkId), CallError> {
    let params = Signature::new(vec![Element::UInt32, Element::UInt32, Element::UInt64]);
    match convert_args(args, &params)?.as_slice() {
        [_, Value::U32(signal), Value::U64(link)] => Ok((*signal, *link)),
        _ => Err(CallError::Method("malformed event link arguments".into())),
    }
}

/// Property id from a name or a numeric id.
fn property_uid(object: &DynamicObject, key: Option<&Value>) -> Result<u32, CallError> {
    match key.map(Value::unwrap_dynamic) {
        Some(Value::String(name)) => object.meta_object().property_id(name).ok_or_else(|| {
            ResolutionError::NotFound {
                name: name.clone(),
                signature: String::new(),
            }
            .into()
        }),
        Some(other) => Ok(u32::from_value(other.clone())?),
        None => Err(CallError::ArgumentCount {
            expected: 1,
            found: 0,
        }),
    }
}
