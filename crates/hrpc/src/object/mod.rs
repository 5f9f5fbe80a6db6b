// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Object model: meta-objects, dynamic objects and their builder.
//!
//! An object exposes methods, signals and properties, each identified by a
//! numeric id. Ids below [`FIRST_USER_ACTION_ID`](crate::config::FIRST_USER_ACTION_ID)
//! are reserved for built-in actions (meta-object query, event
//! registration, property access); user members are numbered from there in
//! advertisement order.
//!
//! Methods may be overloaded. Calls by bare name pick the overload whose
//! parameters best fit the argument signature; calls by qualified name
//! (`name::(params)`) bypass scoring.

mod builder;
mod cache;
mod dynamic;
mod error;
mod meta;
mod method;
mod signal;

#[cfg(test)]
mod tests;

pub use builder::ObjectBuilder;
pub use dynamic::{args_signature, DynamicObject, ObjectPtr, ThreadingModel};
pub use error::{ObjectError, ResolutionError};
pub use meta::{MetaMethod, MetaObject, MetaProperty, MetaSignal};
pub use method::{IntoMethod, IntoTryMethod, MethodFn};
pub use signal::{LinkId, Subscriber};

pub(crate) use cache::ResolutionCache;
pub(crate) use dynamic::{convert_args, panic_message};
