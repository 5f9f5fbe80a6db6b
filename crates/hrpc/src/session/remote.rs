// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Client-side proxy of an object served by the peer.

use crate::config::{
    ACTION_GET_PROPERTY, ACTION_META_OBJECT, ACTION_REGISTER_EVENT, ACTION_SET_PROPERTY,
    ACTION_UNREGISTER_EVENT, RESOLUTION_CACHE_CAPACITY,
};
use crate::dispatch::{CallRequest, CompletionHandle, MessageDispatcher};
use crate::error::{CallError, Result};
use crate::message::MessageAddress;
use crate::object::{
    args_signature, LinkId, MetaObject, ResolutionCache, ResolutionError, Subscriber,
};
use crate::signature::{Element, Signature};
use crate::types::NativeType;
use crate::value::Value;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;

type Outcome<T> = std::result::Result<T, CallError>;

/// Proxy for `(service, object)` on the other side of a dispatcher.
///
/// Holds a copy of the remote meta-object, fetched once, so overloads are
/// resolved locally and only the chosen method id travels.
pub struct RemoteObject {
    dispatcher: MessageDispatcher,
    service: u32,
    object: u32,
    meta: MetaObject,
    resolutions: ResolutionCache,
    /// Event links registered with the peer, with their signal id.
    links: Mutex<HashMap<LinkId, u32>>,
    timeout: Duration,
}

impl RemoteObject {
    /// Fetch the meta-object of `(service, object)` and build the proxy.
    ///
    /// `timeout` bounds this fetch and the other blocking helpers
    /// (properties, event registration).
    pub fn fetch(
        dispatcher: MessageDispatcher,
        service: u32,
        object: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let handle = dispatcher.send(CallRequest::new(
            MessageAddress::new(service, object, ACTION_META_OBJECT),
            Signature::from_element(Element::UInt32),
            vec![Value::U32(object)],
        ))?;
        let value = handle.wait_or_cancel(timeout)?;
        let meta = MetaObject::from_value(&value)?;
        log::debug!(
            "[remote] {}.{}: {} methods, {} signals, {} properties",
            service,
            object,
            meta.methods().count(),
            meta.signals().count(),
            meta.properties().count()
        );
        Ok(Self {
            dispatcher,
            service,
            object,
            meta,
            resolutions: ResolutionCache::new(RESOLUTION_CACHE_CAPACITY),
            links: Mutex::new(HashMap::new()),
            timeout,
        })
    }

    #[must_use]
    pub fn meta_object(&self) -> &MetaObject {
        &self.meta
    }

    #[inline]
    pub fn service(&self) -> u32 {
        self.service
    }

    #[inline]
    pub fn object(&self) -> u32 {
        self.object
    }

    fn address(&self, action: u32) -> MessageAddress {
        MessageAddress::new(self.service, self.object, action)
    }

    fn wait(&self, handle: &CompletionHandle) -> Outcome<Value> {
        handle.wait_or_cancel(self.timeout)
    }

    /// Method id `name` resolves to for `args`.
    pub fn resolve(&self, name: &str, args: &Signature) -> Outcome<u32> {
        self.resolutions
            .get_or_resolve(name, args, || self.meta.resolve(name, args))
            .map_err(CallError::from)
    }

    /// Call method `name` (bare or qualified); returns at once.
    ///
    /// Arguments are converted to the chosen overload's parameters before
    /// they are sent.
    pub fn call(&self, name: &str, args: Vec<Value>) -> Outcome<CompletionHandle> {
        let uid = self.resolve(name, &args_signature(&args))?;
        let params = self
            .meta
            .method(uid)
            .map(|m| m.parameters.clone())
            .ok_or(CallError::Unknown {
                what: "method",
                id: uid,
            })?;
        self.dispatcher
            .send(CallRequest::new(self.address(uid), params, args))
    }

    /// Call and block for a result converted to `R`.
    pub fn call_as<R: NativeType>(&self, name: &str, args: Vec<Value>) -> Outcome<R> {
        self.call(name, args)?.wait_as()
    }

    /// Fire-and-forget: emit signal `name` on the peer, or call method
    /// `name` without waiting for a reply.
    pub fn post(&self, name: &str, args: Vec<Value>) -> Outcome<()> {
        let (uid, params) = match self.meta.signal_id(name).and_then(|uid| self.meta.signal(uid)) {
            Some(signal) => (signal.uid, signal.signature.clone()),
            None => {
                let uid = self.resolve(name, &args_signature(&args))?;
                let params = self
                    .meta
                    .method(uid)
                    .map(|m| m.parameters.clone())
                    .unwrap_or_default();
                (uid, params)
            }
        };
        self.dispatcher
            .post(CallRequest::new(self.address(uid), params, args))
    }

    fn property_uid(&self, name: &str) -> Outcome<u32> {
        self.meta.property_id(name).ok_or_else(|| {
            ResolutionError::NotFound {
                name: name.to_owned(),
                signature: String::new(),
            }
            .into()
        })
    }

    /// Read property `name` on the peer.
    pub fn property(&self, name: &str) -> Outcome<Value> {
        let uid = self.property_uid(name)?;
        let handle = self.dispatcher.send(CallRequest::new(
            self.address(ACTION_GET_PROPERTY),
            Signature::from_element(Element::UInt32),
            vec![Value::U32(uid)],
        ))?;
        self.wait(&handle)
    }

    /// Write property `name` on the peer; the peer converts `value`.
    pub fn set_property(&self, name: &str, value: Value) -> Outcome<()> {
        let uid = self.property_uid(name)?;
        let handle = self.dispatcher.send(CallRequest::new(
            self.address(ACTION_SET_PROPERTY),
            Signature::new(vec![Element::UInt32, Element::Dynamic]),
            vec![Value::U32(uid), Value::dynamic(value)],
        ))?;
        self.wait(&handle).map(|_| ())
    }

    /// Subscribe to signal (or property) `name` on the peer.
    ///
    /// `subscriber` runs on the dispatcher's receiving thread.
    pub fn connect(&self, name: &str, subscriber: Subscriber) -> Outcome<LinkId> {
        let uid = self
            .meta
            .signal_id(name)
            .or_else(|| self.meta.property_id(name))
            .ok_or_else(|| ResolutionError::NotFound {
                name: name.to_owned(),
                signature: String::new(),
            })?;
        let link = self.dispatcher.subscribe_events(self.address(uid), subscriber);
        let registered = self
            .dispatcher
            .send(self.link_request(ACTION_REGISTER_EVENT, uid, link))
            .and_then(|handle| self.wait(&handle));
        if let Err(e) = registered {
            self.dispatcher.unsubscribe_events(link);
            return Err(e);
        }
        self.links.lock().insert(link, uid);
        log::debug!("[remote] link {} on {}", link, self.address(uid));
        Ok(link)
    }

    /// Drop a subscription made with [`connect`](Self::connect).
    ///
    /// Local delivery stops at once; the peer is told afterwards.
    pub fn disconnect(&self, link: LinkId) -> Outcome<()> {
        let uid = self.links.lock().remove(&link).ok_or_else(|| {
            CallError::Method(format!("link {} is not connected", link))
        })?;
        self.dispatcher.unsubscribe_events(link);
        let handle = self
            .dispatcher
            .send(self.link_request(ACTION_UNREGISTER_EVENT, uid, link))?;
        self.wait(&handle).map(|_| ())
    }

    fn link_request(&self, action: u32, signal: u32, link: LinkId) -> CallRequest {
        CallRequest::new(
            self.address(action),
            Signature::new(vec![Element::UInt32, Element::UInt32, Element::UInt64]),
            vec![Value::U32(self.object), Value::U32(signal), Value::U64(link)],
        )
    }
}

impl Drop for RemoteObject {
    fn drop(&mut self) {
        let links: Vec<LinkId> = self.links.lock().drain().map(|(link, _)| link).collect();
        for link in links {
            self.dispatcher.unsubscribe_events(link);
        }
    }
}

impl std::fmt::Debug for RemoteObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteObject")
            .field("service", &self.service)
            .field("object", &self.object)
            .field("methods", &self.meta.methods().count())
            .finish()
    }
}
