// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! HRPC Global Configuration - Single Source of Truth
//!
//! This module centralizes ALL wire constants and runtime configuration.
//! **NEVER hardcode elsewhere!**
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: Compile-time constants (frame layout, reserved action ids)
//! - **Level 2 (Dynamic)**: `RuntimeConfig` for runtime limits, timeouts and user keys
//!
//! # Performance
//!
//! - **Lock-free**: `ArcSwap` for codec limits (atomic load on every decode)
//! - **Lock-free**: `DashMap` for the user key store
//! - **Zero-copy**: `Arc<str>` for keys/values
//!
//! # Example
//!
//! ```
//! use hrpc::config::{Limits, RuntimeConfig, HEADER_SIZE};
//!
//! assert_eq!(HEADER_SIZE, 24);
//!
//! let config = RuntimeConfig::new();
//! config.set_limits(Limits { max_depth: 16, ..Limits::default() });
//! config.set_user("app.node_name", "gateway");
//! assert_eq!(config.limits().max_depth, 16);
//! ```

use arc_swap::ArcSwap;
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// =======================================================================
// Frame Layout
// =======================================================================

/// Size of the little-endian length prefix in front of every frame.
pub const FRAME_PREFIX_SIZE: usize = 4;

/// Size of the fixed frame header (bytes)
///
/// Six little-endian u32 words:
/// `id, kind | flags << 8, service, object, action, payload_len`
pub const HEADER_SIZE: usize = 24;

/// Payload is encoded as a dynamic value (`m`): signature text followed by the value.
pub const FLAG_DYNAMIC_PAYLOAD: u8 = 0x01;

/// Payload run starts with the signature of the payload (u32 length + text).
pub const FLAG_SIGNATURE: u8 = 0x02;

/// Every flag bit understood by this implementation.
pub const KNOWN_FLAGS: u8 = FLAG_DYNAMIC_PAYLOAD | FLAG_SIGNATURE;

// =======================================================================
// Addressing & Reserved Actions
// =======================================================================

/// Service id of the server itself (session-level built-ins).
pub const SERVICE_SERVER: u32 = 0;

/// Service id reserved for the service directory.
pub const SERVICE_DIRECTORY: u32 = 1;

/// Object id of the main object of a service.
pub const MAIN_OBJECT_ID: u32 = 1;

/// First service id handed out by a directory to user services.
pub const FIRST_USER_SERVICE_ID: u32 = 2;

/// Subscribe a remote peer to a signal. Payload `(IIL)`: object, signal, link.
pub const ACTION_REGISTER_EVENT: u32 = 0;

/// Drop a remote subscription. Payload `(IIL)`: object, signal, link.
pub const ACTION_UNREGISTER_EVENT: u32 = 1;

/// Fetch the serialized meta-object of the addressed object.
pub const ACTION_META_OBJECT: u32 = 2;

/// Release a remote object reference.
pub const ACTION_TERMINATE: u32 = 3;

/// Read a property. Payload `(I)`, reply `m`.
pub const ACTION_GET_PROPERTY: u32 = 5;

/// Write a property. Payload `(Im)`, reply `v`.
pub const ACTION_SET_PROPERTY: u32 = 6;

/// List property names. Reply `[s]`.
pub const ACTION_PROPERTIES: u32 = 7;

/// Ids below this value are reserved for the built-in actions above.
pub const FIRST_USER_ACTION_ID: u32 = 100;

// =======================================================================
// Default Limits
// =======================================================================

/// Default maximum frame size (bytes, header + payload)
///
/// Frames announcing a larger size are rejected and skipped.
pub const DEFAULT_MAX_FRAME_SIZE: usize = 64 * 1024 * 1024;

/// Default cap on list/map element counts read from the wire.
pub const DEFAULT_MAX_ELEMENT_COUNT: usize = 16 * 1024 * 1024;

/// Default cap on value nesting depth while decoding.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Maximum container nesting accepted by the signature parser.
pub const MAX_SIGNATURE_DEPTH: usize = 64;

/// Default number of executor worker threads for thread-safe objects.
pub const DEFAULT_EXECUTOR_THREADS: usize = 4;

/// Default timeout used by blocking helpers (meta-object fetch, connect).
pub const DEFAULT_CALL_TIMEOUT_MS: u64 = 10_000;

/// Entries kept in each overload-resolution cache.
pub const RESOLUTION_CACHE_CAPACITY: usize = 128;

/// Signature-keyed type descriptors kept by a type registry.
pub const SIGNATURE_TYPE_CACHE_CAPACITY: usize = 256;

/// Codec and framing limits (hot path, swapped atomically)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Largest accepted frame (header + payload), in bytes.
    pub max_frame_size: usize,
    /// Largest accepted list/map element count.
    pub max_element_count: usize,
    /// Deepest accepted value nesting.
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            max_element_count: DEFAULT_MAX_ELEMENT_COUNT,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

// =======================================================================
// Runtime Configuration (Dynamic, Lock-Free)
// =======================================================================

/// Shared runtime configuration (thread-safe, lock-free)
///
/// Clone is an `Arc` counter increment: pass it to every component of a
/// session and updates are observed everywhere.
///
/// ```
/// use hrpc::config::RuntimeConfig;
/// use std::time::Duration;
///
/// let config = RuntimeConfig::new();
/// config.set_call_timeout(Duration::from_secs(2));
/// let shared = config.clone();
/// assert_eq!(shared.call_timeout(), Duration::from_secs(2));
/// ```
#[derive(Clone)]
pub struct RuntimeConfig {
    limits: Arc<ArcSwap<Limits>>,
    executor_threads: Arc<AtomicUsize>,
    call_timeout_ms: Arc<AtomicU64>,
    user: Arc<DashMap<Arc<str>, Arc<str>>>,
}

impl RuntimeConfig {
    /// Create a new runtime config with default limits
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            limits: Arc::new(ArcSwap::from_pointee(Limits::default())),
            executor_threads: Arc::new(AtomicUsize::new(DEFAULT_EXECUTOR_THREADS)),
            call_timeout_ms: Arc::new(AtomicU64::new(DEFAULT_CALL_TIMEOUT_MS)),
            user: Arc::new(DashMap::new()),
        }
    }

    // ===================================================================
    // Limits (Atomic, Lock-Free)
    // ===================================================================

    /// Current codec and framing limits
    #[inline]
    #[must_use]
    pub fn limits(&self) -> Limits {
        **self.limits.load()
    }

    /// Replace the codec and framing limits
    ///
    /// Zero values are clamped to 1 so a misconfiguration cannot reject
    /// every frame silently.
    pub fn set_limits(&self, limits: Limits) {
        let clamped = Limits {
            max_frame_size: limits.max_frame_size.max(crate::config::HEADER_SIZE),
            max_element_count: limits.max_element_count.max(1),
            max_depth: limits.max_depth.max(1),
        };
        if clamped != limits {
            log::warn!("[config] limits {:?} clamped to {:?}", limits, clamped);
        }
        self.limits.store(Arc::new(clamped));
    }

    // ===================================================================
    // Executor & Timeouts
    // ===================================================================

    /// Worker threads used for `MultiThread` objects
    #[inline]
    #[must_use]
    pub fn executor_threads(&self) -> usize {
        self.executor_threads.load(Ordering::Relaxed)
    }

    /// Set the worker thread count (minimum 1)
    #[inline]
    pub fn set_executor_threads(&self, threads: usize) {
        self.executor_threads.store(threads.max(1), Ordering::Relaxed);
    }

    /// Timeout applied by blocking helpers
    #[inline]
    #[must_use]
    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms.load(Ordering::Relaxed))
    }

    /// Set the timeout applied by blocking helpers
    #[inline]
    pub fn set_call_timeout(&self, timeout: Duration) {
        let millis = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self.call_timeout_ms.store(millis, Ordering::Relaxed);
    }

    // ===================================================================
    // Public User-Land API
    // ===================================================================

    /// Set user-land config (PUBLIC API)
    ///
    /// # Allowed Namespaces
    ///
    /// - `user.*` -> User-land custom config
    /// - `app.*` -> Application-specific config
    ///
    /// Any other key is logged and skipped (fail-safe).
    #[inline]
    pub fn set_user(&self, key: &str, value: &str) {
        if !is_user_key(key) {
            log::error!(
                "[config] User-land keys must start with 'user.' or 'app.', got: '{}'. \
                 Skipping (fail-safe).",
                key
            );
            return;
        }
        self.user.insert(Arc::from(key), Arc::from(value));
    }

    /// Get user-land config (PUBLIC API)
    #[inline]
    #[must_use]
    pub fn get_user(&self, key: &str) -> Option<Arc<str>> {
        if !is_user_key(key) {
            log::warn!(
                "[config] get_user() called with non-user key '{}'. Returns None.",
                key
            );
            return None;
        }
        self.user.get(key).map(|v| Arc::clone(&v))
    }

    /// Remove user-land config (PUBLIC API)
    #[inline]
    pub fn remove_user(&self, key: &str) -> Option<Arc<str>> {
        if !is_user_key(key) {
            return None;
        }
        self.user.remove(key).map(|(_, v)| v)
    }

    /// All user keys starting with `prefix`
    #[must_use]
    pub fn search_user_prefix(&self, prefix: &str) -> Vec<(Arc<str>, Arc<str>)> {
        self.user
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| (Arc::clone(entry.key()), Arc::clone(entry.value())))
            .collect()
    }

    /// Number of user entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.user.len()
    }

    /// Check if no user entry is set
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.user.is_empty()
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RuntimeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeConfig")
            .field("limits", &self.limits())
            .field("executor_threads", &self.executor_threads())
            .field("call_timeout", &self.call_timeout())
            .field("user_keys", &self.user.len())
            .finish()
    }
}

#[inline]
fn is_user_key(key: &str) -> bool {
    key.starts_with("user.") || key.starts_with("app.")
}

// =======================================================================
// YAML Loader
// =======================================================================

/// YAML messaging configuration document.
///
/// ```yaml
/// # hrpc.yaml
/// limits:
///   max_frame_size: 1048576
///   max_depth: 32
/// executor_threads: 8
/// call_timeout_ms: 2500
/// user:
///   user.site: lab-3
/// ```
#[cfg(feature = "config-loaders")]
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct MessagingConfig {
    /// Codec and framing limits.
    pub limits: YamlLimits,
    /// Worker threads for `MultiThread` objects.
    pub executor_threads: Option<usize>,
    /// Timeout for blocking helpers, in milliseconds.
    pub call_timeout_ms: Option<u64>,
    /// User-land keys (`user.*` / `app.*`).
    pub user: std::collections::HashMap<String, String>,
}

/// Limit overrides; missing keys keep their defaults.
#[cfg(feature = "config-loaders")]
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
pub struct YamlLimits {
    pub max_frame_size: Option<usize>,
    pub max_element_count: Option<usize>,
    pub max_depth: Option<usize>,
}

#[cfg(feature = "config-loaders")]
impl MessagingConfig {
    /// Parse YAML content.
    pub fn parse_yaml(yaml_content: &str) -> crate::Result<Self> {
        serde_yaml::from_str(yaml_content)
            .map_err(|e| crate::Error::Config(format!("Failed to parse YAML: {}", e)))
    }

    /// Load a configuration document from a YAML file.
    pub fn load_from_file<P: AsRef<std::path::Path>>(path: P) -> crate::Result<Self> {
        let yaml_content = std::fs::read_to_string(path)?;
        Self::parse_yaml(&yaml_content)
    }

    /// Build a fresh `RuntimeConfig` from this document.
    #[must_use]
    pub fn to_runtime(&self) -> RuntimeConfig {
        let config = RuntimeConfig::new();
        self.apply_to(&config);
        config
    }

    /// Apply every key present in this document to `config`.
    pub fn apply_to(&self, config: &RuntimeConfig) {
        let current = config.limits();
        config.set_limits(Limits {
            max_frame_size: self.limits.max_frame_size.unwrap_or(current.max_frame_size),
            max_element_count: self
                .limits
                .max_element_count
                .unwrap_or(current.max_element_count),
            max_depth: self.limits.max_depth.unwrap_or(current.max_depth),
        });
        if let Some(threads) = self.executor_threads {
            config.set_executor_threads(threads);
        }
        if let Some(ms) = self.call_timeout_ms {
            config.set_call_timeout(Duration::from_millis(ms));
        }
        for (key, value) in &self.user {
            config.set_user(key, value);
        }
    }
}
