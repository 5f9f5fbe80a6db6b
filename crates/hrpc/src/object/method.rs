// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Callable method bodies and typed closure adapters.

use crate::error::CallError;
use crate::signature::Signature;
use crate::types::NativeType;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Type-erased method body. Arguments arrive already converted to the
/// declared parameter types.
pub type MethodFn = Arc<dyn Fn(&[Value]) -> Result<Value, CallError> + Send + Sync>;

/// A closure over native types usable as a method.
///
/// Implemented for `Fn(A1, .., An) -> R` with up to five arguments, where
/// every `Ai` and `R` is a [`NativeType`]. `Args` is the argument tuple and
/// only serves to keep the impls apart.
pub trait IntoMethod<Args>: Send + Sync + 'static {
    fn parameters() -> Signature;
    fn return_signature() -> Signature;
    fn into_method(self) -> MethodFn;
}

/// Like [`IntoMethod`] for closures returning `Result<R, E>`; an `Err`
/// becomes [`CallError::Method`] carrying `E`'s message.
pub trait IntoTryMethod<Args>: Send + Sync + 'static {
    fn parameters() -> Signature;
    fn return_signature() -> Signature;
    fn into_method(self) -> MethodFn;
}

fn check_count(expected: usize, args: &[Value]) -> Result<(), CallError> {
    if args.len() != expected {
        return Err(CallError::ArgumentCount {
            expected,
            found: args.len(),
        });
    }
    Ok(())
}

macro_rules! impl_into_method {
    ($count:expr; $($arg:ident : $ty:ident),*) => {
        impl<F, R, $($ty,)*> IntoMethod<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> R + Send + Sync + 'static,
            R: NativeType,
            $($ty: NativeType,)*
        {
            fn parameters() -> Signature {
                Signature::new(vec![$($ty::element()),*])
            }

            fn return_signature() -> Signature {
                Signature::from_element(R::element())
            }

            #[allow(unused_mut, unused_variables)]
            fn into_method(self) -> MethodFn {
                Arc::new(move |args: &[Value]| {
                    check_count($count, args)?;
                    let mut it = args.iter().cloned();
                    $(let $arg = $ty::from_value(it.next().unwrap_or_default())?;)*
                    Ok(self($($arg),*).to_value())
                })
            }
        }

        impl<F, R, E, $($ty,)*> IntoTryMethod<($($ty,)*)> for F
        where
            F: Fn($($ty),*) -> Result<R, E> + Send + Sync + 'static,
            R: NativeType,
            E: fmt::Display,
            $($ty: NativeType,)*
        {
            fn parameters() -> Signature {
                Signature::new(vec![$($ty::element()),*])
            }

            fn return_signature() -> Signature {
                Signature::from_element(R::element())
            }

            #[allow(unused_mut, unused_variables)]
            fn into_method(self) -> MethodFn {
                Arc::new(move |args: &[Value]| {
                    check_count($count, args)?;
                    let mut it = args.iter().cloned();
                    $(let $arg = $ty::from_value(it.next().unwrap_or_default())?;)*
                    self($($arg),*)
                        .map(|r| r.to_value())
                        .map_err(|e| CallError::Method(e.to_string()))
                })
            }
        }
    };
}

impl_into_method!(0;);
impl_into_method!(1; a: A);
impl_into_method!(2; a: A, b: B);
impl_into_method!(3; a: A, b: B, c: C);
impl_into_method!(4; a: A, b: B, c: C, d: D);
impl_into_method!(5; a: A, b: B, c: C, d: D, e: E2);
