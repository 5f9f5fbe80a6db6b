// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Objects built at run time from a meta-object and callables.

use super::cache::ResolutionCache;
use super::error::ResolutionError;
use super::meta::MetaObject;
use super::method::MethodFn;
use super::signal::{LinkId, SignalHub, Subscriber};
use crate::config::RESOLUTION_CACHE_CAPACITY;
use crate::error::CallError;
use crate::signature::Signature;
use crate::types::NativeType;
use crate::value::{convert, Value};
use parking_lot::RwLock;
use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Where an object's methods run when called from a peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThreadingModel {
    /// Inline on the delivery thread, one call at a time.
    #[default]
    SingleThread,
    /// On the executor pool; calls may run concurrently.
    MultiThread,
}

pub(crate) struct PropertySlot {
    value: RwLock<Value>,
}

impl PropertySlot {
    pub(crate) fn new(value: Value) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }
}

/// An object whose members were advertised through an
/// [`ObjectBuilder`](super::ObjectBuilder).
///
/// Calls convert their arguments to the declared parameter types, run the
/// method, and convert the result to the declared return type. Any failure,
/// a panic included, comes back as a [`CallError`].
pub struct DynamicObject {
    meta: MetaObject,
    methods: HashMap<u32, MethodFn>,
    properties: HashMap<u32, PropertySlot>,
    hubs: HashMap<u32, SignalHub>,
    next_link: AtomicU64,
    threading: ThreadingModel,
    resolutions: ResolutionCache,
}

impl DynamicObject {
    pub(crate) fn from_parts(
        meta: MetaObject,
        methods: HashMap<u32, MethodFn>,
        properties: HashMap<u32, PropertySlot>,
        threading: ThreadingModel,
    ) -> Self {
        let hubs = meta
            .signals
            .keys()
            .chain(meta.properties.keys())
            .map(|&uid| (uid, SignalHub::default()))
            .collect();
        Self {
            meta,
            methods,
            properties,
            hubs,
            next_link: AtomicU64::new(1),
            threading,
            resolutions: ResolutionCache::new(RESOLUTION_CACHE_CAPACITY),
        }
    }

    #[inline]
    pub fn meta_object(&self) -> &MetaObject {
        &self.meta
    }

    #[inline]
    pub fn threading_model(&self) -> ThreadingModel {
        self.threading
    }

    /// Call method `uid` with `args`.
    pub fn invoke(&self, uid: u32, args: &[Value]) -> Result<Value, CallError> {
        let method = self.meta.method(uid).ok_or(CallError::Unknown {
            what: "method",
            id: uid,
        })?;
        let body = self.methods.get(&uid).ok_or(CallError::Unknown {
            what: "method",
            id: uid,
        })?;

        let args = convert_args(args, &method.parameters)?;
        let result = catch_unwind(AssertUnwindSafe(|| body(&args)))
            .map_err(|payload| CallError::Panicked(panic_message(payload.as_ref())))??;

        match method.return_signature.single() {
            Some(element) => Ok(convert(&result, element)?),
            None => Ok(Value::Void),
        }
    }

    /// Resolve `name` against the argument signatures, then invoke.
    ///
    /// `name` may be bare (`add`) or qualified (`add::(ii)`).
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, CallError> {
        let uid = self.resolve(name, &args_signature(args))?;
        self.invoke(uid, args)
    }

    /// [`call`](Self::call) converting the result to a native type.
    pub fn call_as<R: NativeType>(&self, name: &str, args: &[Value]) -> Result<R, CallError> {
        Ok(R::from_value(self.call(name, args)?)?)
    }

    /// Method id for `name` and arguments shaped `args`, cached.
    pub fn resolve(&self, name: &str, args: &Signature) -> Result<u32, CallError> {
        self.resolutions
            .get_or_resolve(name, args, || self.meta.resolve(name, args))
            .map_err(CallError::from)
    }

    /// Subscribe to signal (or property) `uid`.
    pub fn connect(&self, uid: u32, subscriber: Subscriber) -> Result<LinkId, CallError> {
        let hub = self.hubs.get(&uid).ok_or(CallError::Unknown {
            what: "signal",
            id: uid,
        })?;
        let link = self.next_link.fetch_add(1, Ordering::Relaxed);
        hub.connect(link, subscriber);
        Ok(link)
    }

    /// Subscribe by signal name.
    pub fn connect_by_name(&self, name: &str, subscriber: Subscriber) -> Result<LinkId, CallError> {
        let uid = self
            .meta
            .signal_id(name)
            .or_else(|| self.meta.property_id(name))
            .ok_or_else(|| ResolutionError::NotFound {
                name: name.to_owned(),
                signature: String::new(),
            })?;
        self.connect(uid, subscriber)
    }

    /// Drop a subscription. Returns false for an unknown or stale link.
    pub fn disconnect(&self, link: LinkId) -> bool {
        self.hubs.values().any(|hub| hub.disconnect(link))
    }

    /// Emit signal `uid`: arguments are converted to the signal signature
    /// and delivered to subscribers in subscription order.
    pub fn post(&self, uid: u32, args: &[Value]) -> Result<usize, CallError> {
        let signal = self.meta.signal(uid).ok_or(CallError::Unknown {
            what: "signal",
            id: uid,
        })?;
        let args = convert_args(args, &signal.signature)?;
        Ok(self.hubs.get(&uid).map_or(0, |hub| hub.emit(&args)))
    }

    /// Number of subscribers of signal (or property) `uid`.
    pub fn subscriber_count(&self, uid: u32) -> usize {
        self.hubs.get(&uid).map_or(0, SignalHub::len)
    }

    /// Current value of property `uid`.
    pub fn property(&self, uid: u32) -> Result<Value, CallError> {
        self.properties
            .get(&uid)
            .map(|slot| slot.value.read().clone())
            .ok_or(CallError::Unknown {
                what: "property",
                id: uid,
            })
    }

    /// Replace property `uid`, converting to its declared type, and notify
    /// its subscribers with the new value.
    pub fn set_property(&self, uid: u32, value: Value) -> Result<(), CallError> {
        let (meta, slot) = self
            .meta
            .property(uid)
            .zip(self.properties.get(&uid))
            .ok_or(CallError::Unknown {
                what: "property",
                id: uid,
            })?;
        let value = match meta.signature.single() {
            Some(element) => convert(&value, element)?,
            None => Value::Void,
        };
        *slot.value.write() = value.clone();
        if let Some(hub) = self.hubs.get(&uid) {
            hub.emit(std::slice::from_ref(&value));
        }
        Ok(())
    }

    /// Names of all properties.
    pub fn property_names(&self) -> Vec<String> {
        self.meta.properties().map(|p| p.name.clone()).collect()
    }
}

impl std::fmt::Debug for DynamicObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DynamicObject")
            .field("methods", &self.methods.len())
            .field("signals", &self.meta.signals.len())
            .field("properties", &self.properties.len())
            .field("threading", &self.threading)
            .finish()
    }
}

/// Signature of an argument list, one element per argument.
#[must_use]
pub fn args_signature(args: &[Value]) -> Signature {
    Signature::new(args.iter().map(Value::signature).collect())
}

/// Convert each argument to its parameter element.
pub(crate) fn convert_args(args: &[Value], params: &Signature) -> Result<Vec<Value>, CallError> {
    if args.len() != params.len() {
        return Err(CallError::ArgumentCount {
            expected: params.len(),
            found: args.len(),
        });
    }
    args.iter()
        .zip(params.elements())
        .enumerate()
        .map(|(i, (arg, element))| convert(arg, element).map_err(|e| CallError::Conversion(e.at(i))))
        .collect()
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

/// Shared handle to a dynamic object.
pub type ObjectPtr = Arc<DynamicObject>;
