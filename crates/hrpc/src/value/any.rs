// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type-erased values: owned [`AnyValue`] and borrowed [`AnyReference`].

use super::convert::convert;
use super::error::ConversionError;
use super::Value;
use crate::signature::Signature;
use crate::types::{same_type, type_for_signature, type_of, NativeType, Storage, TypeDescriptor};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Owned type-erased value.
///
/// Owns its storage: dropping releases it through the descriptor, and
/// [`destroy`](AnyValue::destroy) does the same early. Both are idempotent.
/// `AnyValue::default()` is the invalid (empty) value.
#[derive(Default)]
pub struct AnyValue {
    descriptor: Option<Arc<dyn TypeDescriptor>>,
    storage: Option<Storage>,
}

impl AnyValue {
    /// Invalid value (no type, no storage).
    #[must_use]
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Take ownership of a native value.
    #[must_use]
    pub fn from_native<T: NativeType>(value: T) -> Self {
        Self {
            descriptor: Some(type_of::<T>()),
            storage: Some(Box::new(value)),
        }
    }

    /// Build storage for `descriptor` from a value tree.
    pub fn from_value(
        value: Value,
        descriptor: Arc<dyn TypeDescriptor>,
    ) -> Result<Self, ConversionError> {
        let storage = descriptor.from_value(value)?;
        Ok(Self {
            descriptor: Some(descriptor),
            storage: Some(storage),
        })
    }

    /// Wrap a value tree under the descriptor of its inferred signature.
    #[must_use]
    pub fn from_dynamic(value: Value) -> Self {
        let descriptor = type_for_signature(&value.signature());
        match descriptor.from_value(value) {
            Ok(storage) => Self {
                descriptor: Some(descriptor),
                storage: Some(storage),
            },
            Err(e) => {
                log::error!("[value] inferred signature rejected its own value: {}", e);
                Self::default()
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.storage.is_some()
    }

    #[must_use]
    pub fn descriptor(&self) -> Option<&Arc<dyn TypeDescriptor>> {
        self.descriptor.as_ref()
    }

    #[must_use]
    pub fn signature(&self) -> Option<&Signature> {
        self.descriptor.as_deref().map(|d| d.signature())
    }

    /// Borrow as a reference (invalid when this value is invalid).
    #[must_use]
    pub fn as_ref(&self) -> AnyReference<'_> {
        match (&self.descriptor, &self.storage) {
            (Some(descriptor), Some(storage)) => AnyReference {
                descriptor: Some(Arc::clone(descriptor)),
                storage: Some(storage_ref(storage)),
            },
            _ => AnyReference::invalid(),
        }
    }

    /// Reify into a value tree.
    pub fn to_value(&self) -> Result<Value, ConversionError> {
        self.as_ref().to_value()
    }

    /// Borrow the storage as `T` when it holds exactly a `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.storage.as_ref()?.downcast_ref::<T>()
    }

    /// Extract as native `T`, converting when the stored type differs.
    pub fn to_native<T: NativeType>(&self) -> Result<T, ConversionError> {
        self.as_ref().to_native()
    }

    /// Move out as native `T` without copying when the stored type matches.
    pub fn into_native<T: NativeType>(mut self) -> Result<T, ConversionError> {
        let storage = self.storage.take().ok_or(ConversionError::Invalid)?;
        match storage.downcast::<T>() {
            Ok(native) => {
                self.descriptor = None;
                Ok(*native)
            }
            Err(storage) => {
                self.storage = Some(storage);
                self.to_native()
            }
        }
    }

    /// Convert to the type of `target`.
    ///
    /// Returns `Converted::Borrowed` (no allocation) when the types already
    /// match, `Converted::Owned` otherwise.
    pub fn convert(
        &self,
        target: &Arc<dyn TypeDescriptor>,
    ) -> Result<Converted<'_>, ConversionError> {
        self.as_ref().convert(target)
    }

    /// Release the storage now. Idempotent; leaves the value invalid.
    pub fn destroy(&mut self) {
        if let Some(storage) = self.storage.take() {
            match &self.descriptor {
                Some(descriptor) => descriptor.destroy(storage),
                None => drop(storage),
            }
        }
        self.descriptor = None;
    }

    /// Move the content out, leaving this value invalid.
    #[must_use]
    pub fn take(&mut self) -> AnyValue {
        AnyValue {
            descriptor: self.descriptor.take(),
            storage: self.storage.take(),
        }
    }
}

/// Deep copy through the descriptor. An invalid value clones to invalid.
impl Clone for AnyValue {
    fn clone(&self) -> Self {
        self.as_ref().to_owned_value().unwrap_or_default()
    }
}

impl Drop for AnyValue {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.as_ref(), f)
    }
}

impl PartialEq for AnyValue {
    fn eq(&self, other: &Self) -> bool {
        self.as_ref() == other.as_ref()
    }
}

/// Borrowed type-erased value. Never releases what it points to.
#[derive(Clone, Default)]
pub struct AnyReference<'a> {
    descriptor: Option<Arc<dyn TypeDescriptor>>,
    storage: Option<&'a dyn Any>,
}

impl<'a> AnyReference<'a> {
    #[must_use]
    pub fn invalid() -> Self {
        Self::default()
    }

    /// Borrow a native value.
    #[must_use]
    pub fn from_native<T: NativeType>(value: &'a T) -> Self {
        Self {
            descriptor: Some(type_of::<T>()),
            storage: Some(value),
        }
    }

    /// Pair raw storage with its descriptor.
    ///
    /// `storage` must be storage produced by `descriptor`; a mismatch is
    /// reported as `StorageMismatch` when the reference is read.
    #[must_use]
    pub fn from_parts(descriptor: Arc<dyn TypeDescriptor>, storage: &'a dyn Any) -> Self {
        Self {
            descriptor: Some(descriptor),
            storage: Some(storage),
        }
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.storage.is_some()
    }

    #[must_use]
    pub fn descriptor(&self) -> Option<&Arc<dyn TypeDescriptor>> {
        self.descriptor.as_ref()
    }

    #[must_use]
    pub fn signature(&self) -> Option<&Signature> {
        self.descriptor.as_deref().map(|d| d.signature())
    }

    fn parts(&self) -> Result<(&Arc<dyn TypeDescriptor>, &'a dyn Any), ConversionError> {
        match (&self.descriptor, self.storage) {
            (Some(descriptor), Some(storage)) => Ok((descriptor, storage)),
            _ => Err(ConversionError::Invalid),
        }
    }

    /// Reify into a value tree.
    pub fn to_value(&self) -> Result<Value, ConversionError> {
        let (descriptor, storage) = self.parts()?;
        descriptor.to_value(storage)
    }

    /// Borrow the storage as `T` when it holds exactly a `T`.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&'a T> {
        self.storage?.downcast_ref::<T>()
    }

    /// Extract as native `T`, converting when the stored type differs.
    pub fn to_native<T: NativeType>(&self) -> Result<T, ConversionError> {
        if let Some(native) = self.downcast_ref::<T>() {
            return Ok(native.clone());
        }
        T::from_value(self.to_value()?)
    }

    /// Deep copy into an owned value.
    pub fn to_owned_value(&self) -> Result<AnyValue, ConversionError> {
        let (descriptor, storage) = self.parts()?;
        Ok(AnyValue {
            descriptor: Some(Arc::clone(descriptor)),
            storage: Some(descriptor.clone_storage(storage)?),
        })
    }

    /// Convert to the type of `target`.
    pub fn convert(
        &self,
        target: &Arc<dyn TypeDescriptor>,
    ) -> Result<Converted<'a>, ConversionError> {
        let (descriptor, _) = self.parts()?;
        if same_type(descriptor.as_ref(), target.as_ref()) {
            return Ok(Converted::Borrowed(self.clone()));
        }
        let value = convert(&self.to_value()?, target.element())?;
        AnyValue::from_value(value, Arc::clone(target)).map(Converted::Owned)
    }
}

impl fmt::Debug for AnyReference<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.descriptor, self.to_value()) {
            (Some(descriptor), Ok(value)) => {
                write!(f, "{}({})", descriptor.signature(), value)
            }
            _ => f.write_str("<invalid>"),
        }
    }
}

/// Same type and equal value trees.
impl PartialEq for AnyReference<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (&self.descriptor, &other.descriptor) {
            (Some(a), Some(b)) => {
                a.signature() == b.signature()
                    && matches!((self.to_value(), other.to_value()), (Ok(x), Ok(y)) if x == y)
            }
            (None, None) => true,
            _ => false,
        }
    }
}

/// Result of a conversion: borrowed when nothing was allocated.
#[derive(Debug)]
pub enum Converted<'a> {
    Borrowed(AnyReference<'a>),
    Owned(AnyValue),
}

impl<'a> Converted<'a> {
    /// True when the conversion allocated new storage.
    #[inline]
    #[must_use]
    pub fn did_allocate(&self) -> bool {
        matches!(self, Converted::Owned(_))
    }

    /// View the converted value.
    #[must_use]
    pub fn as_ref(&self) -> AnyReference<'_> {
        match self {
            Converted::Borrowed(r) => r.clone(),
            Converted::Owned(v) => v.as_ref(),
        }
    }

    /// Owned result, copying when borrowed.
    pub fn into_owned(self) -> Result<AnyValue, ConversionError> {
        match self {
            Converted::Borrowed(r) => r.to_owned_value(),
            Converted::Owned(v) => Ok(v),
        }
    }
}

#[inline]
fn storage_ref(storage: &Storage) -> &dyn Any {
    &**storage
}
