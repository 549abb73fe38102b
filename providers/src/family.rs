//! Adapter families.
//!
//! Both families serve the same nine operations. They differ only in how an
//! adapter outcome reaches the caller: [`Suspend`] hands back a future that
//! settles with the adapter's outcome, [`Immediate`] hands back the result
//! directly. The dispatcher is written once against [`Family`].

use std::future::Future;
use std::pin::Pin;

use crate::registry::Registry;
use crate::scope::ScopedRegistry;
use crate::{AdapterError, DataError, FamilyKind};

/// What an async adapter slot returns.
pub type ProviderFuture<T> = Pin<Box<dyn Future<Output = Result<T, AdapterError>> + Send>>;

/// What an async accessor returns.
pub type DispatchFuture<T> = Pin<Box<dyn Future<Output = Result<T, DataError>> + Send>>;

/// Box an adapter future into a [`ProviderFuture`].
pub fn boxed<T>(
    future: impl Future<Output = Result<T, AdapterError>> + Send + 'static,
) -> ProviderFuture<T> {
    Box::pin(future)
}

/// Invocation strategy shared by the registry, the adapter record and the
/// dispatcher.
pub trait Family: Sized + Send + Sync + 'static {
    const KIND: FamilyKind;

    /// Return type of an adapter slot.
    type Outcome<R: Send + 'static>: Send;
    /// Return type of an accessor invocation.
    type Output<R: Send + 'static>;

    /// The registry of this family installed in `scope`, if any.
    fn installed(scope: &ScopedRegistry) -> Option<&Registry<Self>>;

    /// Wrap an already computed adapter result as a slot outcome.
    fn ready<R: Send + 'static>(result: Result<R, AdapterError>) -> Self::Outcome<R>;

    /// Forward an adapter outcome to the caller.
    fn settle<R: Send + 'static>(outcome: Self::Outcome<R>) -> Self::Output<R>;

    /// Surface a dispatcher failure to the caller.
    fn reject<R: Send + 'static>(error: DataError) -> Self::Output<R>;
}

/// Asynchronous family: invocations suspend until the adapter settles.
#[derive(Clone, Copy, Debug, Default)]
pub struct Suspend;

/// Synchronous family: invocations return straight away.
#[derive(Clone, Copy, Debug, Default)]
pub struct Immediate;

impl Family for Suspend {
    const KIND: FamilyKind = FamilyKind::Async;

    type Outcome<R: Send + 'static> = ProviderFuture<R>;
    type Output<R: Send + 'static> = DispatchFuture<R>;

    fn installed(scope: &ScopedRegistry) -> Option<&Registry<Self>> {
        scope.async_registry()
    }

    fn ready<R: Send + 'static>(result: Result<R, AdapterError>) -> Self::Outcome<R> {
        Box::pin(std::future::ready(result))
    }

    fn settle<R: Send + 'static>(outcome: Self::Outcome<R>) -> Self::Output<R> {
        Box::pin(async move { outcome.await.map_err(DataError::Provider) })
    }

    fn reject<R: Send + 'static>(error: DataError) -> Self::Output<R> {
        Box::pin(std::future::ready(Err(error)))
    }
}

impl Family for Immediate {
    const KIND: FamilyKind = FamilyKind::Sync;

    type Outcome<R: Send + 'static> = Result<R, AdapterError>;
    type Output<R: Send + 'static> = Result<R, DataError>;

    fn installed(scope: &ScopedRegistry) -> Option<&Registry<Self>> {
        scope.sync_registry()
    }

    fn ready<R: Send + 'static>(result: Result<R, AdapterError>) -> Self::Outcome<R> {
        result
    }

    fn settle<R: Send + 'static>(outcome: Self::Outcome<R>) -> Self::Output<R> {
        outcome.map_err(DataError::Provider)
    }

    fn reject<R: Send + 'static>(error: DataError) -> Self::Output<R> {
        Err(error)
    }
}
