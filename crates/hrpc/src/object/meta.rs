// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Meta-object: the self-description of an object's members.

use super::error::{ObjectError, ResolutionError};
use crate::signature::{is_convertible, split_qualified, Element, Qualified, Signature, TupleElement};
use crate::value::{convert, Value};
use std::collections::BTreeMap;

/// Method description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaMethod {
    pub uid: u32,
    pub name: String,
    pub parameters: Signature,
    pub return_signature: Signature,
    pub description: String,
}

impl MetaMethod {
    /// `name::(params)`, unique within an object.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        Qualified::key(&self.name, &self.parameters)
    }
}

/// Signal description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaSignal {
    pub uid: u32,
    pub name: String,
    pub signature: Signature,
}

/// Property description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetaProperty {
    pub uid: u32,
    pub name: String,
    pub signature: Signature,
}

/// Methods, signals and properties of an object, keyed by id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MetaObject {
    pub(crate) methods: BTreeMap<u32, MetaMethod>,
    pub(crate) signals: BTreeMap<u32, MetaSignal>,
    pub(crate) properties: BTreeMap<u32, MetaProperty>,
    pub(crate) description: String,
}

impl MetaObject {
    pub fn methods(&self) -> impl Iterator<Item = &MetaMethod> {
        self.methods.values()
    }

    pub fn signals(&self) -> impl Iterator<Item = &MetaSignal> {
        self.signals.values()
    }

    pub fn properties(&self) -> impl Iterator<Item = &MetaProperty> {
        self.properties.values()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn method(&self, uid: u32) -> Option<&MetaMethod> {
        self.methods.get(&uid)
    }

    pub fn signal(&self, uid: u32) -> Option<&MetaSignal> {
        self.signals.get(&uid)
    }

    pub fn property(&self, uid: u32) -> Option<&MetaProperty> {
        self.properties.get(&uid)
    }

    /// Every overload of `name`, by ascending id.
    pub fn overloads<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MetaMethod> + 'a {
        self.methods.values().filter(move |m| m.name == name)
    }

    pub fn signal_id(&self, name: &str) -> Option<u32> {
        self.signals.values().find(|s| s.name == name).map(|s| s.uid)
    }

    pub fn property_id(&self, name: &str) -> Option<u32> {
        self.properties
            .values()
            .find(|p| p.name == name)
            .map(|p| p.uid)
    }

    /// Id of the method whose `name::(params)` matches exactly.
    pub fn find_method(&self, name: &str, params: &Signature) -> Option<u32> {
        self.overloads(name)
            .find(|m| same_shape(&m.parameters, params))
            .map(|m| m.uid)
    }

    /// Pick the method `name` should call with arguments shaped `args`.
    ///
    /// A qualified name (`f::(i)`) only matches that exact overload. A bare
    /// name scores every overload of the right arity: 2 per parameter that
    /// matches exactly, 1 per parameter that converts; a parameter that
    /// cannot convert disqualifies the overload. The unique best score wins.
    pub fn resolve(&self, name: &str, args: &Signature) -> Result<u32, ResolutionError> {
        let qualified = split_qualified(name)?;
        let bare = qualified.name.as_deref().unwrap_or_default();
        if let Some(params) = &qualified.params {
            return self
                .find_method(bare, params)
                .ok_or_else(|| ResolutionError::NotFound {
                    name: bare.to_owned(),
                    signature: params.to_string(),
                });
        }

        let mut best: Option<u32> = None;
        let mut winners: Vec<&MetaMethod> = Vec::new();
        for method in self.overloads(bare) {
            let Some(score) = score(args, &method.parameters) else {
                continue;
            };
            match best {
                Some(b) if score < b => {}
                Some(b) if score == b => winners.push(method),
                _ => {
                    best = Some(score);
                    winners.clear();
                    winners.push(method);
                }
            }
        }

        match winners.as_slice() {
            [only] => Ok(only.uid),
            [] => Err(ResolutionError::NotFound {
                name: bare.to_owned(),
                signature: args.to_string(),
            }),
            tied => Err(ResolutionError::Ambiguous {
                name: bare.to_owned(),
                candidates: tied.iter().map(|m| m.qualified_name()).collect(),
            }),
        }
    }

    /// Serialized form, shaped as [`MetaObject::element`].
    #[must_use]
    pub fn to_value(&self) -> Value {
        let methods = self
            .methods
            .values()
            .map(|m| {
                (
                    Value::U32(m.uid),
                    Value::Tuple(vec![
                        Value::U32(m.uid),
                        Value::String(m.name.clone()),
                        Value::String(m.parameters.to_string()),
                        Value::String(m.return_signature.to_string()),
                        Value::String(m.description.clone()),
                    ]),
                )
            })
            .collect();
        let member = |uid: u32, name: &str, signature: &Signature| {
            (
                Value::U32(uid),
                Value::Tuple(vec![
                    Value::U32(uid),
                    Value::String(name.to_owned()),
                    Value::String(signature.to_string()),
                ]),
            )
        };
        let signals = self
            .signals
            .values()
            .map(|s| member(s.uid, &s.name, &s.signature))
            .collect();
        let properties = self
            .properties
            .values()
            .map(|p| member(p.uid, &p.name, &p.signature))
            .collect();
        Value::Tuple(vec![
            Value::Map(methods),
            Value::Map(signals),
            Value::Map(properties),
            Value::String(self.description.clone()),
        ])
    }

    /// Rebuild from the serialized form (as received from a peer).
    pub fn from_value(value: &Value) -> Result<Self, ObjectError> {
        let malformed = |why: String| ObjectError::MalformedMetaObject(why);
        let value = convert(value, &Self::element()).map_err(|e| malformed(e.to_string()))?;
        let Value::Tuple(parts) = value else {
            return Err(malformed("not a tuple".into()));
        };
        let [methods, signals, properties, description] =
            <[Value; 4]>::try_from(parts).map_err(|_| malformed("wrong arity".into()))?;

        let mut meta = MetaObject {
            description: text(description)?,
            ..MetaObject::default()
        };
        for fields in entries(methods)? {
            let [uid, name, params, ret, description] = fields_of::<5>(fields)?;
            let uid = uid_of(uid)?;
            meta.methods.insert(
                uid,
                MetaMethod {
                    uid,
                    name: text(name)?,
                    parameters: Signature::parse(&text(params)?)?,
                    return_signature: Signature::parse(&text(ret)?)?,
                    description: text(description)?,
                },
            );
        }
        for fields in entries(signals)? {
            let [uid, name, signature] = fields_of::<3>(fields)?;
            let uid = uid_of(uid)?;
            meta.signals.insert(
                uid,
                MetaSignal {
                    uid,
                    name: text(name)?,
                    signature: Signature::parse(&text(signature)?)?,
                },
            );
        }
        for fields in entries(properties)? {
            let [uid, name, signature] = fields_of::<3>(fields)?;
            let uid = uid_of(uid)?;
            meta.properties.insert(
                uid,
                MetaProperty {
                    uid,
                    name: text(name)?,
                    signature: Signature::parse(&text(signature)?)?,
                },
            );
        }
        Ok(meta)
    }

    /// Signature of the serialized form:
    /// `({I(Issss)<MetaMethod,..>}{I(Iss)<MetaSignal,..>}{I(Iss)<MetaProperty,..>}s)<MetaObject,..>`
    #[must_use]
    pub fn element() -> Element {
        let names = |list: &[&str]| list.iter().map(|s| (*s).to_owned()).collect::<Vec<_>>();
        let method = Element::Tuple(TupleElement::named(
            "MetaMethod",
            vec![
                Element::UInt32,
                Element::String,
                Element::String,
                Element::String,
                Element::String,
            ],
            names(&["uid", "name", "parameters", "returns", "description"]),
        ));
        let member = |type_name: &str| {
            Element::Tuple(TupleElement::named(
                type_name,
                vec![Element::UInt32, Element::String, Element::String],
                names(&["uid", "name", "signature"]),
            ))
        };
        Element::Tuple(TupleElement::named(
            "MetaObject",
            vec![
                Element::map(Element::UInt32, method),
                Element::map(Element::UInt32, member("MetaSignal")),
                Element::map(Element::UInt32, member("MetaProperty")),
                Element::String,
            ],
            names(&["methods", "signals", "properties", "description"]),
        ))
    }
}

/// Resolution score of `args` against `params`; `None` when unusable.
fn score(args: &Signature, params: &Signature) -> Option<u32> {
    if args.len() != params.len() {
        return None;
    }
    args.elements()
        .iter()
        .zip(params.elements())
        .map(|(a, p)| is_convertible(a, p).score())
        .sum()
}

fn same_shape(a: &Signature, b: &Signature) -> bool {
    a.len() == b.len()
        && a.elements()
            .iter()
            .zip(b.elements())
            .all(|(x, y)| x.same_shape(y))
}

fn entries(map: Value) -> Result<Vec<Vec<Value>>, ObjectError> {
    match map {
        Value::Map(entries) => entries
            .into_iter()
            .map(|(_, member)| match member {
                Value::Tuple(fields) => Ok(fields),
                other => Err(ObjectError::MalformedMetaObject(format!(
                    "member is {}",
                    other.kind_name()
                ))),
            })
            .collect(),
        other => Err(ObjectError::MalformedMetaObject(format!(
            "member table is {}",
            other.kind_name()
        ))),
    }
}

fn fields_of<const N: usize>(fields: Vec<Value>) -> Result<[Value; N], ObjectError> {
    <[Value; N]>::try_from(fields)
        .map_err(|_| ObjectError::MalformedMetaObject("wrong member arity".into()))
}

fn text(value: Value) -> Result<String, ObjectError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(ObjectError::MalformedMetaObject(format!(
            "expected string, found {}",
            other.kind_name()
        ))),
    }
}

fn uid_of(value: Value) -> Result<u32, ObjectError> {
    match value {
        Value::U32(uid) => Ok(uid),
        other => Err(ObjectError::MalformedMetaObject(format!(
            "expected uid, found {}",
            other.kind_name()
        ))),
    }
}
