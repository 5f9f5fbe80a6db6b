// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Service directory: name <-> service id <-> endpoint.

use crate::config::FIRST_USER_SERVICE_ID;
use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Where a registered service lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    /// Service name (e.g. "calculator")
    pub name: String,
    /// Id allocated by the directory
    pub service_id: u32,
    /// Endpoint of the session hosting the service
    pub endpoint: String,
}

/// Registry of running services.
///
/// Implementations must be thread-safe. Replication between directories
/// is out of scope; a directory is one authoritative table.
pub trait ServiceDirectory: Send + Sync {
    /// Register `name` served at `endpoint`; returns the new service id.
    ///
    /// Fails when the name is already registered.
    fn register_service(&self, name: &str, endpoint: &str) -> Result<u32>;

    /// Forget service `id`. Fails when unknown.
    fn unregister_service(&self, id: u32) -> Result<()>;

    fn lookup_service(&self, name: &str) -> Option<ServiceInfo>;

    /// Every registered service, by ascending id.
    fn services(&self) -> Vec<ServiceInfo>;
}

/// In-memory [`ServiceDirectory`].
///
/// Ids start at [`FIRST_USER_SERVICE_ID`] and are never reused.
#[derive(Debug)]
pub struct LocalDirectory {
    state: RwLock<DirectoryState>,
}

#[derive(Debug)]
struct DirectoryState {
    by_id: BTreeMap<u32, ServiceInfo>,
    next_id: u32,
}

impl LocalDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(DirectoryState {
                by_id: BTreeMap::new(),
                next_id: FIRST_USER_SERVICE_ID,
            }),
        }
    }
}

impl Default for LocalDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceDirectory for LocalDirectory {
    fn register_service(&self, name: &str, endpoint: &str) -> Result<u32> {
        if name.is_empty() {
            return Err(Error::Directory("empty service name".into()));
        }
        let mut state = self.state.write();
        if state.by_id.values().any(|s| s.name == name) {
            return Err(Error::Directory(format!(
                "service '{}' already registered",
                name
            )));
        }
        let id = state.next_id;
        state.next_id = id
            .checked_add(1)
            .ok_or_else(|| Error::Directory("service ids exhausted".into()))?;
        state.by_id.insert(
            id,
            ServiceInfo {
                name: name.to_owned(),
                service_id: id,
                endpoint: endpoint.to_owned(),
            },
        );
        log::debug!("[directory] registered service '{}' as {}", name, id);
        Ok(id)
    }

    fn unregister_service(&self, id: u32) -> Result<()> {
        match self.state.write().by_id.remove(&id) {
            Some(info) => {
                log::debug!("[directory] unregistered service '{}' ({})", info.name, id);
                Ok(())
            }
            None => Err(Error::Directory(format!("no service with id {}", id))),
        }
    }

    fn lookup_service(&self, name: &str) -> Option<ServiceInfo> {
        self.state
            .read()
            .by_id
            .values()
            .find(|s| s.name == name)
            .cloned()
    }

    fn services(&self) -> Vec<ServiceInfo> {
        self.state.read().by_id.values().cloned().collect()
    }
}
