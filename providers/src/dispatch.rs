//! Operation dispatcher.
//!
//! An [`Accessor`] captures a scope, a resource name, an operation and
//! optional defaults once; every invocation then resolves the adapter, checks
//! the capability, merges parameters and calls the adapter exactly once. The
//! adapter's result comes back as-is.

use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

use tracing::debug;

use crate::family::{Family, Immediate, Suspend};
use crate::merge::{merge_meta, Params};
use crate::provider::{Handler, Provider};
use crate::scope::ScopedRegistry;
use crate::{DataError, Meta, Operation, ResourceName};

/// Type-level description of one of the nine operations.
pub trait OperationKind: Send + Sync + 'static {
    const KIND: Operation;

    /// What the adapter receives (after merging).
    type Params: Params;
    /// What the adapter returns.
    type Response: Send + 'static;

    /// The adapter slot serving this operation.
    fn slot<F: Family>(provider: &Provider<F>) -> Option<&Handler<F, Self::Params, Self::Response>>;
}

/// Operation markers used to bind accessors, e.g. `scope.asynchronous::<ops::GetOne>("posts")`.
pub mod ops {
    use super::OperationKind;
    use crate::family::Family;
    use crate::provider::{Handler, Provider};
    use crate::{GetListParams, GetOneParams, Identifier, Operation, Record};

    pub struct GetOne;
    pub struct GetList;
    pub struct GetMany;
    pub struct CreateOne;
    pub struct CreateMany;
    pub struct UpdateOne;
    pub struct UpdateMany;
    pub struct DeleteOne;
    pub struct DeleteMany;

    impl OperationKind for GetOne {
        const KIND: Operation = Operation::GetOne;
        type Params = GetOneParams;
        type Response = Record;

        fn slot<F: Family>(p: &Provider<F>) -> Option<&Handler<F, Self::Params, Self::Response>> {
            p.get_one.as_ref()
        }
    }

    impl OperationKind for GetList {
        const KIND: Operation = Operation::GetList;
        type Params = GetListParams;
        type Response = Vec<Record>;

        fn slot<F: Family>(p: &Provider<F>) -> Option<&Handler<F, Self::Params, Self::Response>> {
            p.get_list.as_ref()
        }
    }

    impl OperationKind for GetMany {
        const KIND: Operation = Operation::GetMany;
        type Params = Vec<Identifier>;
        type Response = Vec<Record>;

        fn slot<F: Family>(p: &Provider<F>) -> Option<&Handler<F, Self::Params, Self::Response>> {
            p.get_many.as_ref()
        }
    }

    impl OperationKind for CreateOne {
        const KIND: Operation = Operation::CreateOne;
        type Params = Record;
        type Response = Option<Record>;

        fn slot<F: Family>(p: &Provider<F>) -> Option<&Handler<F, Self::Params, Self::Response>> {
            p.create_one.as_ref()
        }
    }

    impl OperationKind for CreateMany {
        const KIND: Operation = Operation::CreateMany;
        type Params = Vec<Record>;
        type Response = Option<Vec<Record>>;

        fn slot<F: Family>(p: &Provider<F>) -> Option<&Handler<F, Self::Params, Self::Response>> {
            p.create_many.as_ref()
        }
    }

    impl OperationKind for UpdateOne {
        const KIND: Operation = Operation::UpdateOne;
        type Params = Record;
        type Response = Option<Record>;

        fn slot<F: Family>(p: &Provider<F>) -> Option<&Handler<F, Self::Params, Self::Response>> {
            p.update_one.as_ref()
        }
    }

    impl OperationKind for UpdateMany {
        const KIND: Operation = Operation::UpdateMany;
        type Params = Vec<Record>;
        type Response = Option<Vec<Record>>;

        fn slot<F: Family>(p: &Provider<F>) -> Option<&Handler<F, Self::Params, Self::Response>> {
            p.update_many.as_ref()
        }
    }

    impl OperationKind for DeleteOne {
        const KIND: Operation = Operation::DeleteOne;
        type Params = Identifier;
        type Response = Option<Record>;

        fn slot<F: Family>(p: &Provider<F>) -> Option<&Handler<F, Self::Params, Self::Response>> {
            p.delete_one.as_ref()
        }
    }

    impl OperationKind for DeleteMany {
        const KIND: Operation = Operation::DeleteMany;
        type Params = Vec<Identifier>;
        type Response = Option<Vec<Record>>;

        fn slot<F: Family>(p: &Provider<F>) -> Option<&Handler<F, Self::Params, Self::Response>> {
            p.delete_many.as_ref()
        }
    }
}

pub type AsyncAccessor<O> = Accessor<Suspend, O>;
pub type SyncAccessor<O> = Accessor<Immediate, O>;

/// A resource + operation + defaults, bound once and invoked many times.
pub struct Accessor<F: Family, O: OperationKind> {
    scope: ScopedRegistry,
    resource: ResourceName,
    defaults: Option<O::Params>,
    meta: Option<Meta>,
    _marker: PhantomData<fn() -> (F, O)>,
}

impl<F: Family, O: OperationKind> Accessor<F, O> {
    pub fn new(scope: ScopedRegistry, resource: ResourceName) -> Self {
        Self {
            scope,
            resource,
            defaults: None,
            meta: None,
            _marker: PhantomData,
        }
    }

    /// Default parameters merged into every invocation.
    pub fn with_defaults(mut self, defaults: impl Into<O::Params>) -> Self {
        self.defaults = Some(defaults.into());
        self
    }

    /// Default metadata merged into every invocation.
    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn resource(&self) -> &ResourceName {
        &self.resource
    }

    pub fn operation(&self) -> Operation {
        O::KIND
    }

    pub fn defaults(&self) -> Option<&O::Params> {
        self.defaults.as_ref()
    }

    /// Invoke with optional call-time parameters and metadata.
    pub fn invoke(&self, params: Option<O::Params>, meta: Option<Meta>) -> F::Output<O::Response> {
        let (operation, family) = (O::KIND, F::KIND);
        debug!(
            resource = %self.resource,
            %operation,
            %family,
            "dispatching data provider call"
        );
        match self.prepare(params, meta) {
            Ok((handler, params, meta)) => F::settle(handler(params, meta)),
            Err(err) => F::reject(err),
        }
    }

    /// Invoke with call-time parameters and no call-time metadata.
    pub fn call(&self, params: impl Into<O::Params>) -> F::Output<O::Response> {
        self.invoke(Some(params.into()), None)
    }

    /// Invoke with the bound defaults only.
    pub fn run(&self) -> F::Output<O::Response> {
        self.invoke(None, None)
    }

    fn prepare(
        &self,
        params: Option<O::Params>,
        meta: Option<Meta>,
    ) -> Result<(&Handler<F, O::Params, O::Response>, O::Params, Meta), DataError> {
        let provider = self.scope.resolve::<F>(self.resource.as_str())?;
        let handler = O::slot(provider).ok_or_else(|| DataError::NotImplemented {
            operation: O::KIND,
            resource: self.resource.clone(),
        })?;
        let params = <O::Params as Params>::merge(self.defaults.as_ref(), params)
            .or_else(<O::Params as Params>::vacant)
            .ok_or_else(|| DataError::MissingIdentifier {
                resource: self.resource.clone(),
            })?;
        Ok((handler, params, merge_meta(self.meta.as_ref(), meta)))
    }
}

impl<F: Family, O: OperationKind> Clone for Accessor<F, O> {
    fn clone(&self) -> Self {
        Self {
            scope: self.scope.clone(),
            resource: self.resource.clone(),
            defaults: self.defaults.clone(),
            meta: self.meta.clone(),
            _marker: PhantomData,
        }
    }
}

impl<F: Family, O: OperationKind> Debug for Accessor<F, O> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accessor")
            .field("family", &F::KIND)
            .field("operation", &O::KIND)
            .field("resource", &self.resource)
            .field("has_defaults", &self.defaults.is_some())
            .field("meta", &self.meta)
            .finish()
    }
}
