// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Session: one endpoint of a connection, serving local services and
//! reaching remote ones.
//!
//! A [`Session`] ties together a [`MessageDispatcher`] (outgoing calls and
//! their replies), an [`ObjectHost`] (incoming calls on local objects), a
//! worker pool and a [`ServiceDirectory`].
//!
//! # Example
//!
//! ```
//! use hrpc::object::ObjectBuilder;
//! use hrpc::session::{LocalDirectory, Session};
//! use hrpc::Value;
//! use std::sync::Arc;
//!
//! let directory = Arc::new(LocalDirectory::new());
//! let (server, client) = Session::pair(directory).unwrap();
//!
//! let mut builder = ObjectBuilder::new();
//! builder.advertise_fn("add", |a: i32, b: i32| a + b).unwrap();
//! server.register_service("calculator", Arc::new(builder.build())).unwrap();
//!
//! let calculator = client.service("calculator").unwrap();
//! let sum: i32 = calculator
//!     .call_as("add", vec![Value::I32(2), Value::I32(40)])
//!     .unwrap();
//! assert_eq!(sum, 42);
//! ```

mod directory;
mod host;
mod remote;

#[cfg(test)]
mod tests;

pub use directory::{LocalDirectory, ServiceDirectory, ServiceInfo};
pub use host::ObjectHost;
pub use remote::RemoteObject;

use crate::config::{RuntimeConfig, MAIN_OBJECT_ID};
use crate::dispatch::MessageDispatcher;
use crate::error::{Error, Result};
use crate::executor::Executor;
use crate::message::Frame;
use crate::object::ObjectPtr;
use crate::transport::{MemoryTransport, Transport};
use parking_lot::Mutex;
use std::sync::Arc;

/// One endpoint of a connection.
///
/// Closing (or dropping) the session unregisters its services, drops the
/// peer's event subscriptions, fails pending calls with
/// [`CallError::Disconnected`](crate::error::CallError::Disconnected) and
/// stops the worker pool.
pub struct Session {
    dispatcher: MessageDispatcher,
    host: Arc<ObjectHost>,
    executor: Arc<Executor>,
    directory: Arc<dyn ServiceDirectory>,
    registered: Mutex<Vec<u32>>,
    endpoint: String,
}

impl Session {
    /// Session over `transport`.
    ///
    /// The caller feeds received bytes to the dispatcher, for instance by
    /// handing `Arc::new(session.dispatcher().downgrade())` to the transport
    /// as its byte sink.
    pub fn new(
        transport: Arc<dyn Transport>,
        directory: Arc<dyn ServiceDirectory>,
        endpoint: &str,
        config: RuntimeConfig,
    ) -> Result<Self> {
        let dispatcher = MessageDispatcher::with_config(transport, config);
        let executor = Arc::new(Executor::new(dispatcher.config().executor_threads())?);
        let host = Arc::new(ObjectHost::new(
            dispatcher.downgrade(),
            Some(Arc::clone(&executor)),
        ));
        let inbound = Arc::clone(&host);
        dispatcher.set_inbound_handler(move |frame: Frame| inbound.handle_frame(frame));
        log::debug!(
            "[session] {} up, {} workers",
            endpoint,
            executor.threads()
        );
        Ok(Self {
            dispatcher,
            host,
            executor,
            directory,
            registered: Mutex::new(Vec::new()),
            endpoint: endpoint.to_owned(),
        })
    }

    /// Two sessions connected in memory, sharing `directory`.
    pub fn pair(directory: Arc<dyn ServiceDirectory>) -> Result<(Session, Session)> {
        Self::pair_with_config(directory, RuntimeConfig::new())
    }

    /// [`pair`](Self::pair) with both sides using `config`.
    pub fn pair_with_config(
        directory: Arc<dyn ServiceDirectory>,
        config: RuntimeConfig,
    ) -> Result<(Session, Session)> {
        let (a, b) = MemoryTransport::pair();
        let first = Self::over_memory(a, Arc::clone(&directory), config.clone())?;
        let second = Self::over_memory(b, directory, config)?;
        Ok((first, second))
    }

    fn over_memory(
        transport: Arc<MemoryTransport>,
        directory: Arc<dyn ServiceDirectory>,
        config: RuntimeConfig,
    ) -> Result<Self> {
        let endpoint = format!("memory://{}", transport.name());
        let session = Self::new(transport.clone(), directory, &endpoint, config)?;
        transport.start(Arc::new(session.dispatcher.downgrade()))?;
        Ok(session)
    }

    #[inline]
    pub fn dispatcher(&self) -> &MessageDispatcher {
        &self.dispatcher
    }

    #[inline]
    pub fn host(&self) -> &Arc<ObjectHost> {
        &self.host
    }

    #[inline]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Publish `object` as service `name`; returns the service id.
    pub fn register_service(&self, name: &str, object: ObjectPtr) -> Result<u32> {
        let id = self.directory.register_service(name, &self.endpoint)?;
        if let Err(e) = self.host.register(id, MAIN_OBJECT_ID, object) {
            if let Err(rollback) = self.directory.unregister_service(id) {
                log::warn!("[session] service {} left in directory: {}", id, rollback);
            }
            return Err(e);
        }
        self.registered.lock().push(id);
        log::info!("[session] service '{}' registered as {}", name, id);
        Ok(id)
    }

    /// Withdraw a service registered by this session.
    pub fn unregister_service(&self, id: u32) -> Result<()> {
        {
            let mut registered = self.registered.lock();
            let position = registered.iter().position(|&s| s == id).ok_or_else(|| {
                Error::Directory(format!("service {} not registered by this session", id))
            })?;
            registered.swap_remove(position);
        }
        self.host.unregister(id, MAIN_OBJECT_ID);
        self.directory.unregister_service(id)
    }

    pub fn lookup_service(&self, name: &str) -> Option<ServiceInfo> {
        self.directory.lookup_service(name)
    }

    pub fn services(&self) -> Vec<ServiceInfo> {
        self.directory.services()
    }

    /// Proxy for object `object` of `service` on the peer.
    pub fn remote_object(&self, service: u32, object: u32) -> Result<RemoteObject> {
        RemoteObject::fetch(
            self.dispatcher.clone(),
            service,
            object,
            self.dispatcher.config().call_timeout(),
        )
    }

    /// Proxy for the main object of service `name`.
    pub fn service(&self, name: &str) -> Result<RemoteObject> {
        let info = self
            .lookup_service(name)
            .ok_or_else(|| Error::Directory(format!("no service named '{}'", name)))?;
        self.remote_object(info.service_id, MAIN_OBJECT_ID)
    }

    /// Shut the session down. Idempotent.
    pub fn close(&self) {
        let registered = std::mem::take(&mut *self.registered.lock());
        for id in registered {
            self.host.unregister(id, MAIN_OBJECT_ID);
            if let Err(e) = self.directory.unregister_service(id) {
                log::debug!("[session] unregistering {}: {}", id, e);
            }
        }
        self.host.disconnect_remote_links();
        self.dispatcher.close();
        self.dispatcher.clear_inbound_handler();
        self.executor.shutdown();
        log::debug!("[session] {} closed", self.endpoint);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("endpoint", &self.endpoint)
            .field("services", &*self.registered.lock())
            .field("dispatcher", &self.dispatcher)
            .finish()
    }
}
