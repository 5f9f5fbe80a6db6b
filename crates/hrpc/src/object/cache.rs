// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! LRU cache of overload resolutions.

use crate::signature::Signature;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;

/// `(name, argument signature) -> method id`, bounded.
pub(crate) struct ResolutionCache {
    inner: Mutex<LruCache<(String, Signature), u32>>,
}

impl ResolutionCache {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Cached id, or the result of `resolve` (cached on success).
    pub(crate) fn get_or_resolve<E>(
        &self,
        name: &str,
        args: &Signature,
        resolve: impl FnOnce() -> Result<u32, E>,
    ) -> Result<u32, E> {
        let key = (name.to_owned(), args.clone());
        if let Some(&uid) = self.inner.lock().get(&key) {
            return Ok(uid);
        }
        let uid = resolve()?;
        self.inner.lock().put(key, uid);
        Ok(uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_skips_resolver() {
        let cache = ResolutionCache::new(2);
        let args = Signature::parse("i").expect("sig");
        assert_eq!(cache.get_or_resolve::<()>("f", &args, || Ok(101)), Ok(101));
        assert_eq!(
            cache.get_or_resolve::<()>("f", &args, || panic!("cached")),
            Ok(101)
        );
    }

    #[test]
    fn test_failures_not_cached_and_capacity_bounded() {
        let cache = ResolutionCache::new(2);
        let args = Signature::empty();
        assert_eq!(cache.get_or_resolve("f", &args, || Err("missing")), Err("missing"));
        assert_eq!(cache.get_or_resolve::<()>("f", &args, || Ok(7)), Ok(7));

        for (i, name) in ["a", "b", "c"].iter().enumerate() {
            assert_eq!(cache.get_or_resolve::<()>(name, &args, || Ok(i as u32)), Ok(i as u32));
        }
        // "f" and "a" were evicted; "c" is still cached.
        assert_eq!(cache.get_or_resolve::<()>("c", &args, || panic!("cached")), Ok(2));
        assert_eq!(cache.get_or_resolve::<()>("f", &args, || Ok(8)), Ok(8));
    }
}
