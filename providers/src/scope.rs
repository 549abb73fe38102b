//! Installed registries and the ambient scope.
//!
//! A [`ScopedRegistry`] is the read-only view a call site has of the adapters
//! installed above it. It is normally passed down explicitly; code that cannot
//! thread it through can bind it to the current task with [`scoped`] /
//! [`scoped_sync`] and pick it up again with [`current`].

use std::future::Future;
use std::sync::Arc;

use tracing::debug;

use crate::dispatch::{Accessor, OperationKind};
use crate::family::{Family, Immediate, Suspend};
use crate::provider::Provider;
use crate::registry::{AsyncRegistry, Registry, SyncRegistry};
use crate::{DataError, Operation, ResourceName};

/// The registries visible from one scope, one slot per family.
#[derive(Clone, Debug, Default)]
pub struct ScopedRegistry {
    async_registry: Option<Arc<AsyncRegistry>>,
    sync_registry: Option<Arc<SyncRegistry>>,
}

impl ScopedRegistry {
    /// A scope with nothing installed. Every resolution fails with `NoRegistry`.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Install a root scope. Either family may be left out.
    pub fn install(async_registry: Option<AsyncRegistry>, sync_registry: Option<SyncRegistry>) -> Self {
        let scope = Self {
            async_registry: async_registry.map(Arc::new),
            sync_registry: sync_registry.map(Arc::new),
        };
        debug!(
            async_resources = scope.async_registry.as_ref().map_or(0, |r| r.len()),
            sync_resources = scope.sync_registry.as_ref().map_or(0, |r| r.len()),
            "data providers installed"
        );
        scope
    }

    /// Install a nested scope below this one.
    ///
    /// A family supplied here shadows this scope's registry of that family
    /// entirely; a family left out is inherited. `self` is not modified.
    pub fn nested(
        &self,
        async_registry: Option<AsyncRegistry>,
        sync_registry: Option<SyncRegistry>,
    ) -> Self {
        debug!(
            shadows_async = async_registry.is_some(),
            shadows_sync = sync_registry.is_some(),
            "nested data providers installed"
        );
        Self {
            async_registry: async_registry
                .map(Arc::new)
                .or_else(|| self.async_registry.clone()),
            sync_registry: sync_registry
                .map(Arc::new)
                .or_else(|| self.sync_registry.clone()),
        }
    }

    pub fn async_registry(&self) -> Option<&AsyncRegistry> {
        self.async_registry.as_deref()
    }

    pub fn sync_registry(&self) -> Option<&SyncRegistry> {
        self.sync_registry.as_deref()
    }

    /// The adapter registered under `resource` for family `F`.
    pub fn resolve<F: Family>(&self, resource: &str) -> Result<&Provider<F>, DataError> {
        let registry: &Registry<F> =
            F::installed(self).ok_or(DataError::NoRegistry { family: F::KIND })?;
        registry
            .get(resource)
            .ok_or_else(|| DataError::UnknownResource {
                resource: ResourceName::from(resource),
            })
    }

    /// Operations the adapter under `resource` serves for family `F`.
    pub fn capabilities<F: Family>(&self, resource: &str) -> Result<Vec<Operation>, DataError> {
        self.resolve::<F>(resource).map(Provider::capabilities)
    }

    /// Bind an accessor for operation `O` on `resource` in family `F`.
    pub fn bind<F: Family, O: OperationKind>(&self, resource: impl Into<ResourceName>) -> Accessor<F, O> {
        Accessor::new(self.clone(), resource.into())
    }

    /// Bind an asynchronous accessor.
    pub fn asynchronous<O: OperationKind>(&self, resource: impl Into<ResourceName>) -> Accessor<Suspend, O> {
        self.bind::<Suspend, O>(resource)
    }

    /// Bind a synchronous accessor.
    pub fn synchronous<O: OperationKind>(&self, resource: impl Into<ResourceName>) -> Accessor<Immediate, O> {
        self.bind::<Immediate, O>(resource)
    }
}

tokio::task_local! {
    static CURRENT: ScopedRegistry;
}

/// Run `future` with `scope` as the ambient scope of the current task.
pub async fn scoped<Fut: Future>(scope: ScopedRegistry, future: Fut) -> Fut::Output {
    CURRENT.scope(scope, future).await
}

/// Run `f` with `scope` as the ambient scope.
pub fn scoped_sync<R>(scope: ScopedRegistry, f: impl FnOnce() -> R) -> R {
    CURRENT.sync_scope(scope, f)
}

/// Run `future` in a scope nested below the current ambient scope.
pub async fn nest<Fut: Future>(
    async_registry: Option<AsyncRegistry>,
    sync_registry: Option<SyncRegistry>,
    future: Fut,
) -> Fut::Output {
    let inner = current().nested(async_registry, sync_registry);
    scoped(inner, future).await
}

/// The innermost ambient scope, or an empty scope when none is bound.
pub fn current() -> ScopedRegistry {
    CURRENT.try_with(ScopedRegistry::clone).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{AsyncProvider, SyncProvider};
    use crate::FamilyKind;
    use serde_json::json;

    fn tagged_sync(tag: &'static str) -> SyncProvider {
        SyncProvider::new().with_get_one(move |_, _| Ok(json!({ "from": tag })))
    }

    fn call_get_one(scope: &ScopedRegistry, resource: &str) -> serde_json::Value {
        let provider = scope.resolve::<Immediate>(resource).unwrap();
        let get_one = provider.get_one.as_ref().unwrap();
        get_one(Default::default(), Default::default()).unwrap()
    }

    #[test]
    fn resolve_without_registry_fails() {
        let scope = ScopedRegistry::empty();
        assert!(matches!(
            scope.resolve::<Suspend>("posts"),
            Err(DataError::NoRegistry {
                family: FamilyKind::Async
            })
        ));
        assert!(matches!(
            scope.resolve::<Immediate>("posts"),
            Err(DataError::NoRegistry {
                family: FamilyKind::Sync
            })
        ));
    }

    #[test]
    fn resolve_unknown_resource_fails() {
        let scope = ScopedRegistry::install(None, Some(SyncRegistry::new().with("posts", tagged_sync("x"))));
        for name in ["users", "", "Posts"] {
            match scope.resolve::<Immediate>(name) {
                Err(DataError::UnknownResource { resource }) => assert_eq!(resource.as_str(), name),
                other => panic!("expected UnknownResource, got {:?}", other),
            }
        }
    }

    #[test]
    fn families_are_installed_independently() {
        let scope = ScopedRegistry::install(Some(AsyncRegistry::new().with("posts", AsyncProvider::new())), None);
        assert!(scope.resolve::<Suspend>("posts").is_ok());
        assert!(matches!(
            scope.resolve::<Immediate>("posts"),
            Err(DataError::NoRegistry { .. })
        ));
    }

    #[test]
    fn nested_scope_shadows_without_touching_outer() {
        let outer = ScopedRegistry::install(
            None,
            Some(
                SyncRegistry::new()
                    .with("r", tagged_sync("outer"))
                    .with("only-outer", tagged_sync("outer")),
            ),
        );
        let inner = outer.nested(None, Some(SyncRegistry::new().with("r", tagged_sync("inner"))));

        assert_eq!(call_get_one(&inner, "r"), json!({"from": "inner"}));
        assert_eq!(call_get_one(&outer, "r"), json!({"from": "outer"}));
        // the nested store replaces the outer one wholesale
        assert!(matches!(
            inner.resolve::<Immediate>("only-outer"),
            Err(DataError::UnknownResource { .. })
        ));
    }

    #[test]
    fn nested_scope_inherits_families_it_does_not_supply() {
        let outer = ScopedRegistry::install(
            Some(AsyncRegistry::new().with("posts", AsyncProvider::new())),
            Some(SyncRegistry::new().with("r", tagged_sync("outer"))),
        );
        let inner = outer.nested(None, Some(SyncRegistry::new().with("r", tagged_sync("inner"))));
        assert!(inner.resolve::<Suspend>("posts").is_ok());
    }

    #[test]
    fn capabilities_come_from_resolved_adapter() {
        let scope = ScopedRegistry::install(None, Some(SyncRegistry::new().with("r", tagged_sync("x"))));
        assert_eq!(
            scope.capabilities::<Immediate>("r").unwrap(),
            vec![Operation::GetOne]
        );
    }

    #[test]
    fn ambient_scope_is_empty_outside_any_binding() {
        assert!(current().sync_registry().is_none());
        assert!(current().async_registry().is_none());
    }

    #[test]
    fn sync_scope_binds_and_nests() {
        let outer = ScopedRegistry::install(None, Some(SyncRegistry::new().with("r", tagged_sync("outer"))));
        scoped_sync(outer.clone(), || {
            assert_eq!(call_get_one(&current(), "r"), json!({"from": "outer"}));
            let inner = current().nested(None, Some(SyncRegistry::new().with("r", tagged_sync("inner"))));
            scoped_sync(inner, || {
                assert_eq!(call_get_one(&current(), "r"), json!({"from": "inner"}));
            });
            assert_eq!(call_get_one(&current(), "r"), json!({"from": "outer"}));
        });
    }

    #[tokio::test]
    async fn task_scope_binds_and_nests() {
        let outer = ScopedRegistry::install(None, Some(SyncRegistry::new().with("r", tagged_sync("outer"))));
        scoped(outer, async {
            nest(None, Some(SyncRegistry::new().with("r", tagged_sync("inner"))), async {
                assert_eq!(call_get_one(&current(), "r"), json!({"from": "inner"}));
            })
            .await;
            assert_eq!(call_get_one(&current(), "r"), json!({"from": "outer"}));
        })
        .await;
    }
}
