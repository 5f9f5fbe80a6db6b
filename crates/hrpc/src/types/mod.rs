// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors and the global type registry.
//!
//! A [`TypeDescriptor`] knows how to handle opaque storage of one type:
//! its signature, its kind-specific information, and how to clone, reify
//! (storage -> [`Value`]) and build (Value -> storage) it. Native Rust types
//! get a descriptor through [`NativeType`]; types that only exist as a
//! signature (received from a peer, declared by name) use
//! [`DynamicDescriptor`], whose storage is a conforming `Value`.
//!
//! Descriptors live in a process-wide [`TypeRegistry`]. Registration is
//! additive and lazy: the first [`type_of::<T>()`](type_of) registers `T`.
//!
//! # Example
//!
//! ```
//! use hrpc::types::{type_of, TypeKind};
//!
//! let desc = type_of::<Vec<u16>>();
//! assert_eq!(desc.signature().to_string(), "[W]");
//! assert!(matches!(desc.kind(), TypeKind::List { .. }));
//! ```

mod descriptor;
mod native;
mod registry;

pub use descriptor::{DynamicDescriptor, NativeDescriptor};
pub use native::{NativeType, Raw};
pub use registry::{global, type_for_signature, type_of, TypeRegistry};

use crate::signature::{Element, Signature};
use crate::value::{ConversionError, Value};
use std::any::{Any, TypeId};
use std::sync::Arc;

/// Opaque storage owned by an `AnyValue`.
pub type Storage = Box<dyn Any + Send + Sync>;

/// Registry key of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKey {
    /// Native Rust type.
    Native(TypeId),
    /// Type declared by name (e.g. a struct received from a peer).
    Named(Arc<str>),
    /// Anonymous type known only by its signature.
    Signature(Element),
}

/// Kind-specific information exposed by a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind<'a> {
    Void,
    Bool,
    Int { bytes: u8, signed: bool },
    Float { bytes: u8 },
    String,
    Raw,
    Object,
    Dynamic,
    List { element: &'a Element },
    Map { key: &'a Element, value: &'a Element },
    Tuple {
        fields: &'a [Element],
        name: Option<&'a str>,
        field_names: &'a [String],
    },
    Pointer { target: &'a Element },
}

impl<'a> TypeKind<'a> {
    /// Kind information of a signature element.
    #[must_use]
    pub fn of(element: &'a Element) -> Self {
        match element {
            Element::Void => TypeKind::Void,
            Element::Bool => TypeKind::Bool,
            Element::Float32 => TypeKind::Float { bytes: 4 },
            Element::Float64 => TypeKind::Float { bytes: 8 },
            Element::String => TypeKind::String,
            Element::Raw => TypeKind::Raw,
            Element::Object => TypeKind::Object,
            Element::Dynamic => TypeKind::Dynamic,
            Element::List(inner) => TypeKind::List { element: inner },
            Element::Map(key, value) => TypeKind::Map { key, value },
            Element::Tuple(tuple) => TypeKind::Tuple {
                fields: &tuple.fields,
                name: tuple.name.as_deref(),
                field_names: &tuple.field_names,
            },
            Element::Pointer(target) => TypeKind::Pointer { target },
            int => {
                let (bytes, signed) = int.int_info().unwrap_or((4, true));
                TypeKind::Int { bytes, signed }
            }
        }
    }
}

/// Operations on opaque storage of one type.
///
/// Implementations must accept any storage they produced themselves
/// through `from_value` or `clone_storage`.
pub trait TypeDescriptor: Send + Sync + 'static {
    /// Registry key.
    fn key(&self) -> &TypeKey;

    /// Human-readable type name.
    fn name(&self) -> &str;

    /// Single-element signature of the type.
    fn signature(&self) -> &Signature;

    /// The signature element (same as `signature().single()`).
    fn element(&self) -> &Element;

    /// Kind-specific information.
    fn kind(&self) -> TypeKind<'_> {
        TypeKind::of(self.element())
    }

    /// Deep copy of `storage`.
    fn clone_storage(&self, storage: &dyn Any) -> Result<Storage, ConversionError>;

    /// Reify `storage` into a value tree.
    fn to_value(&self, storage: &dyn Any) -> Result<Value, ConversionError>;

    /// Build storage from a value tree, converting as needed.
    fn from_value(&self, value: Value) -> Result<Storage, ConversionError>;

    /// Release storage. Called exactly once per owned storage.
    fn destroy(&self, storage: Storage) {
        drop(storage);
    }
}

impl std::fmt::Debug for dyn TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name())
            .field("signature", &self.signature().to_string())
            .finish()
    }
}

/// Two descriptors describe the same type.
#[inline]
#[must_use]
pub fn same_type(a: &dyn TypeDescriptor, b: &dyn TypeDescriptor) -> bool {
    a.key() == b.key()
}
