// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Process-wide type registry.

use super::descriptor::{DynamicDescriptor, NativeDescriptor};
use super::native::NativeType;
use super::{TypeDescriptor, TypeKey};
use crate::config::SIGNATURE_TYPE_CACHE_CAPACITY;
use crate::signature::Element;
use lru::LruCache;
use parking_lot::{Mutex, RwLock};
use std::any::TypeId;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Arc, OnceLock};

static GLOBAL_REGISTRY: OnceLock<TypeRegistry> = OnceLock::new();

/// The process-wide registry.
pub fn global() -> &'static TypeRegistry {
    GLOBAL_REGISTRY.get_or_init(TypeRegistry::new)
}

/// Descriptor of native type `T`, registering it on first use.
pub fn type_of<T: NativeType>() -> Arc<dyn TypeDescriptor> {
    global().native::<T>()
}

/// Descriptor for values of a signature element.
pub fn type_for_signature(element: &Element) -> Arc<dyn TypeDescriptor> {
    global().for_signature(element)
}

/// Thread-safe map from [`TypeKey`] to descriptor.
///
/// Native and named registrations are additive: the first descriptor
/// registered under a key wins and is never removed. Descriptors made for
/// bare signatures come from peer data, so they live in a bounded LRU
/// instead; an evicted signature gets a fresh descriptor with the same key.
pub struct TypeRegistry {
    types: RwLock<HashMap<TypeKey, Arc<dyn TypeDescriptor>>>,
    by_signature: Mutex<LruCache<Element, Arc<dyn TypeDescriptor>>>,
}

impl TypeRegistry {
    /// Create a new empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::with_signature_capacity(SIGNATURE_TYPE_CACHE_CAPACITY)
    }

    /// Registry keeping at most `capacity` signature-keyed descriptors.
    #[must_use]
    pub fn with_signature_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            types: RwLock::new(HashMap::new()),
            by_signature: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Descriptor of native type `T`, registering it on first use.
    pub fn native<T: NativeType>(&self) -> Arc<dyn TypeDescriptor> {
        let key = TypeKey::Native(TypeId::of::<T>());
        if let Some(desc) = self.types.read().get(&key) {
            return Arc::clone(desc);
        }
        self.register(Arc::new(NativeDescriptor::<T>::new()))
    }

    /// Descriptor for values of `element`, cached.
    pub fn for_signature(&self, element: &Element) -> Arc<dyn TypeDescriptor> {
        let mut cache = self.by_signature.lock();
        if let Some(desc) = cache.get(element) {
            return Arc::clone(desc);
        }
        let desc: Arc<dyn TypeDescriptor> =
            Arc::new(DynamicDescriptor::for_element(element.clone()));
        if let Some((evicted, _)) = cache.push(element.clone(), Arc::clone(&desc)) {
            log::trace!("[types] evicted signature descriptor {}", evicted);
        }
        desc
    }

    /// Declare a named type.
    ///
    /// Returns the already-registered descriptor when the name is taken.
    /// A conflicting signature for an existing name is logged and ignored.
    pub fn register_named(&self, name: &str, element: Element) -> Arc<dyn TypeDescriptor> {
        let desc = self.register(Arc::new(DynamicDescriptor::named(name, element.clone())));
        if desc.element() != &element {
            log::warn!(
                "[types] '{}' already registered as {}, ignoring {}",
                name,
                desc.element(),
                element
            );
        }
        desc
    }

    /// Insert `descriptor` unless its key is present; returns the winner.
    pub fn register(&self, descriptor: Arc<dyn TypeDescriptor>) -> Arc<dyn TypeDescriptor> {
        let mut types = self.types.write();
        let entry = types
            .entry(descriptor.key().clone())
            .or_insert_with(|| {
                log::debug!(
                    "[types] registered {} as {}",
                    descriptor.name(),
                    descriptor.signature()
                );
                Arc::clone(&descriptor)
            });
        Arc::clone(entry)
    }

    /// Look up a descriptor by key.
    #[must_use]
    pub fn lookup(&self, key: &TypeKey) -> Option<Arc<dyn TypeDescriptor>> {
        if let TypeKey::Signature(element) = key {
            if let Some(desc) = self.by_signature.lock().peek(element) {
                return Some(Arc::clone(desc));
            }
        }
        self.types.read().get(key).cloned()
    }

    /// Look up a named type.
    #[must_use]
    pub fn lookup_named(&self, name: &str) -> Option<Arc<dyn TypeDescriptor>> {
        self.lookup(&TypeKey::Named(Arc::from(name)))
    }

    /// Number of descriptors held, cached signature descriptors included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.read().len() + self.by_signature.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
