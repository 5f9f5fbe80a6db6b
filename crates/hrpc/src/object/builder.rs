// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Incremental construction of a [`DynamicObject`].

use super::dynamic::{DynamicObject, PropertySlot, ThreadingModel};
use super::error::ObjectError;
use super::meta::{MetaMethod, MetaObject, MetaProperty, MetaSignal};
use super::method::{IntoMethod, IntoTryMethod, MethodFn};
use crate::config::FIRST_USER_ACTION_ID;
use crate::error::CallError;
use crate::signature::{Qualified, Signature};
use crate::value::{convert, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Builder for a [`DynamicObject`].
///
/// Member ids start at [`FIRST_USER_ACTION_ID`] and are shared by methods,
/// signals and properties. Advertising an existing `name::(params)` fails
/// with [`ObjectError::Duplicate`], or returns the existing id when
/// duplicates are tolerated.
///
/// # Example
///
/// ```
/// use hrpc::object::ObjectBuilder;
/// use hrpc::Value;
///
/// let mut builder = ObjectBuilder::new();
/// let add = builder.advertise_fn("add", |a: i32, b: i32| a + b).unwrap();
/// assert_eq!(add, 100);
/// let object = builder.build();
/// assert_eq!(object.call("add", &[Value::I32(2), Value::I32(3)]), Ok(Value::I32(5)));
/// ```
pub struct ObjectBuilder {
    meta: MetaObject,
    methods: HashMap<u32, MethodFn>,
    properties: HashMap<u32, Value>,
    keys: HashMap<String, u32>,
    next_id: u32,
    tolerate_duplicates: bool,
    threading: ThreadingModel,
}

impl ObjectBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            meta: MetaObject::default(),
            methods: HashMap::new(),
            properties: HashMap::new(),
            keys: HashMap::new(),
            next_id: FIRST_USER_ACTION_ID,
            tolerate_duplicates: false,
            threading: ThreadingModel::default(),
        }
    }

    /// Return the existing id instead of failing on duplicates.
    pub fn tolerate_duplicates(&mut self, tolerate: bool) -> &mut Self {
        self.tolerate_duplicates = tolerate;
        self
    }

    pub fn set_threading_model(&mut self, threading: ThreadingModel) -> &mut Self {
        self.threading = threading;
        self
    }

    pub fn set_description(&mut self, description: &str) -> &mut Self {
        self.meta.description = description.to_owned();
        self
    }

    /// Advertise a method over dynamic values.
    ///
    /// `params` and `ret` are signature texts. `callable` receives the
    /// arguments converted to `params`; its result is converted to `ret`.
    pub fn advertise_method<F>(
        &mut self,
        name: &str,
        params: &str,
        ret: &str,
        callable: F,
    ) -> Result<u32, ObjectError>
    where
        F: Fn(&[Value]) -> Result<Value, CallError> + Send + Sync + 'static,
    {
        let params = Signature::parse(params)?;
        let ret = Signature::parse(ret)?;
        self.add_method(name, params, ret, String::new(), Arc::new(callable))
    }

    /// Advertise a closure over native types; signatures come from its types.
    pub fn advertise_fn<Args, F: IntoMethod<Args>>(
        &mut self,
        name: &str,
        f: F,
    ) -> Result<u32, ObjectError> {
        self.add_method(
            name,
            F::parameters(),
            F::return_signature(),
            String::new(),
            f.into_method(),
        )
    }

    /// [`advertise_fn`](Self::advertise_fn) for closures returning `Result`.
    pub fn advertise_try_fn<Args, F: IntoTryMethod<Args>>(
        &mut self,
        name: &str,
        f: F,
    ) -> Result<u32, ObjectError> {
        self.add_method(
            name,
            F::parameters(),
            F::return_signature(),
            String::new(),
            f.into_method(),
        )
    }

    /// Advertise a signal carrying arguments shaped `params`.
    pub fn advertise_signal(&mut self, name: &str, params: &str) -> Result<u32, ObjectError> {
        let signature = Signature::parse(params)?;
        let key = format!("signal:{}", Qualified::key(name, &signature));
        let uid = match self.claim(key)? {
            Claim::Existing(uid) => return Ok(uid),
            Claim::New(uid) => uid,
        };
        self.meta.signals.insert(
            uid,
            MetaSignal {
                uid,
                name: name.to_owned(),
                signature,
            },
        );
        Ok(uid)
    }

    /// Advertise a property of type `signature` holding `initial`.
    ///
    /// Changes are notified to subscribers of the property id.
    pub fn advertise_property(
        &mut self,
        name: &str,
        signature: &str,
        initial: Value,
    ) -> Result<u32, ObjectError> {
        let signature = Signature::parse(signature)?;
        let initial = match signature.single() {
            Some(element) => {
                convert(&initial, element).map_err(|source| ObjectError::InvalidInitialValue {
                    name: name.to_owned(),
                    source,
                })?
            }
            None => Value::Void,
        };
        let key = format!("property:{}", name);
        let uid = match self.claim(key)? {
            Claim::Existing(uid) => return Ok(uid),
            Claim::New(uid) => uid,
        };
        self.meta.properties.insert(
            uid,
            MetaProperty {
                uid,
                name: name.to_owned(),
                signature,
            },
        );
        self.properties.insert(uid, initial);
        Ok(uid)
    }

    fn add_method(
        &mut self,
        name: &str,
        parameters: Signature,
        return_signature: Signature,
        description: String,
        body: MethodFn,
    ) -> Result<u32, ObjectError> {
        let key = format!("method:{}", Qualified::key(name, &parameters));
        let uid = match self.claim(key)? {
            Claim::Existing(uid) => return Ok(uid),
            Claim::New(uid) => uid,
        };
        log::debug!("[object] method {}::({}) -> id {}", name, parameters, uid);
        self.meta.methods.insert(
            uid,
            MetaMethod {
                uid,
                name: name.to_owned(),
                parameters,
                return_signature,
                description,
            },
        );
        self.methods.insert(uid, body);
        Ok(uid)
    }

    fn claim(&mut self, key: String) -> Result<Claim, ObjectError> {
        if let Some(&uid) = self.keys.get(&key) {
            if self.tolerate_duplicates {
                log::warn!("[object] {} advertised twice, keeping id {}", key, uid);
                return Ok(Claim::Existing(uid));
            }
            let name = key.split_once(':').map_or(key.as_str(), |(_, name)| name);
            return Err(ObjectError::Duplicate {
                name: name.to_owned(),
                id: uid,
            });
        }
        let uid = self.next_id;
        self.next_id += 1;
        self.keys.insert(key, uid);
        Ok(Claim::New(uid))
    }

    /// Finish the object.
    #[must_use]
    pub fn build(self) -> DynamicObject {
        let properties = self
            .properties
            .into_iter()
            .map(|(uid, value)| (uid, PropertySlot::new(value)))
            .collect();
        DynamicObject::from_parts(self.meta, self.methods, properties, self.threading)
    }
}

impl Default for ObjectBuilder {
    fn default() -> Self {
        Self::new()
    }
}

enum Claim {
    New(u32),
    Existing(u32),
}
