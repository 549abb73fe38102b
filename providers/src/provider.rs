//! Adapter contract.
//!
//! An adapter is a record of nine optional method slots. A filled slot means
//! the adapter serves that operation; an empty slot means the dispatcher fails
//! with `NotImplemented` before anything is invoked.

use std::fmt::{Debug, Formatter};
use std::sync::Arc;

use crate::family::{Family, Immediate, Suspend};
use crate::{GetListParams, GetOneParams, Identifier, Meta, Operation, Record};

/// A single adapter method: parameters and metadata in, family outcome out.
pub type Handler<F, P, R> = Arc<dyn Fn(P, Meta) -> <F as Family>::Outcome<R> + Send + Sync>;

/// Adapter serving the asynchronous family.
pub type AsyncProvider = Provider<Suspend>;

/// Adapter serving the synchronous family.
pub type SyncProvider = Provider<Immediate>;

/// Capability record for one resource.
pub struct Provider<F: Family> {
    pub(crate) get_one: Option<Handler<F, GetOneParams, Record>>,
    pub(crate) get_list: Option<Handler<F, GetListParams, Vec<Record>>>,
    pub(crate) get_many: Option<Handler<F, Vec<Identifier>, Vec<Record>>>,
    pub(crate) create_one: Option<Handler<F, Record, Option<Record>>>,
    pub(crate) create_many: Option<Handler<F, Vec<Record>, Option<Vec<Record>>>>,
    pub(crate) update_one: Option<Handler<F, Record, Option<Record>>>,
    pub(crate) update_many: Option<Handler<F, Vec<Record>, Option<Vec<Record>>>>,
    pub(crate) delete_one: Option<Handler<F, Identifier, Option<Record>>>,
    pub(crate) delete_many: Option<Handler<F, Vec<Identifier>, Option<Vec<Record>>>>,
}

impl<F: Family> Provider<F> {
    /// An adapter with no capabilities.
    pub fn new() -> Self {
        Self {
            get_one: None,
            get_list: None,
            get_many: None,
            create_one: None,
            create_many: None,
            update_one: None,
            update_many: None,
            delete_one: None,
            delete_many: None,
        }
    }

    pub fn with_get_one<H>(mut self, handler: H) -> Self
    where
        H: Fn(GetOneParams, Meta) -> F::Outcome<Record> + Send + Sync + 'static,
    {
        self.get_one = Some(Arc::new(handler));
        self
    }

    pub fn with_get_list<H>(mut self, handler: H) -> Self
    where
        H: Fn(GetListParams, Meta) -> F::Outcome<Vec<Record>> + Send + Sync + 'static,
    {
        self.get_list = Some(Arc::new(handler));
        self
    }

    pub fn with_get_many<H>(mut self, handler: H) -> Self
    where
        H: Fn(Vec<Identifier>, Meta) -> F::Outcome<Vec<Record>> + Send + Sync + 'static,
    {
        self.get_many = Some(Arc::new(handler));
        self
    }

    pub fn with_create_one<H>(mut self, handler: H) -> Self
    where
        H: Fn(Record, Meta) -> F::Outcome<Option<Record>> + Send + Sync + 'static,
    {
        self.create_one = Some(Arc::new(handler));
        self
    }

    pub fn with_create_many<H>(mut self, handler: H) -> Self
    where
        H: Fn(Vec<Record>, Meta) -> F::Outcome<Option<Vec<Record>>> + Send + Sync + 'static,
    {
        self.create_many = Some(Arc::new(handler));
        self
    }

    pub fn with_update_one<H>(mut self, handler: H) -> Self
    where
        H: Fn(Record, Meta) -> F::Outcome<Option<Record>> + Send + Sync + 'static,
    {
        self.update_one = Some(Arc::new(handler));
        self
    }

    pub fn with_update_many<H>(mut self, handler: H) -> Self
    where
        H: Fn(Vec<Record>, Meta) -> F::Outcome<Option<Vec<Record>>> + Send + Sync + 'static,
    {
        self.update_many = Some(Arc::new(handler));
        self
    }

    pub fn with_delete_one<H>(mut self, handler: H) -> Self
    where
        H: Fn(Identifier, Meta) -> F::Outcome<Option<Record>> + Send + Sync + 'static,
    {
        self.delete_one = Some(Arc::new(handler));
        self
    }

    pub fn with_delete_many<H>(mut self, handler: H) -> Self
    where
        H: Fn(Vec<Identifier>, Meta) -> F::Outcome<Option<Vec<Record>>> + Send + Sync + 'static,
    {
        self.delete_many = Some(Arc::new(handler));
        self
    }

    /// Whether the slot for `op` is filled.
    pub fn supports(&self, op: Operation) -> bool {
        match op {
            Operation::GetOne => self.get_one.is_some(),
            Operation::GetList => self.get_list.is_some(),
            Operation::GetMany => self.get_many.is_some(),
            Operation::CreateOne => self.create_one.is_some(),
            Operation::CreateMany => self.create_many.is_some(),
            Operation::UpdateOne => self.update_one.is_some(),
            Operation::UpdateMany => self.update_many.is_some(),
            Operation::DeleteOne => self.delete_one.is_some(),
            Operation::DeleteMany => self.delete_many.is_some(),
        }
    }

    /// Filled slots, in canonical operation order.
    pub fn capabilities(&self) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| self.supports(*op))
            .collect()
    }
}

impl<F: Family> Default for Provider<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Family> Clone for Provider<F> {
    fn clone(&self) -> Self {
        Self {
            get_one: self.get_one.clone(),
            get_list: self.get_list.clone(),
            get_many: self.get_many.clone(),
            create_one: self.create_one.clone(),
            create_many: self.create_many.clone(),
            update_one: self.update_one.clone(),
            update_many: self.update_many.clone(),
            delete_one: self.delete_one.clone(),
            delete_many: self.delete_many.clone(),
        }
    }
}

impl<F: Family> Debug for Provider<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("family", &F::KIND)
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::family::boxed;
    use serde_json::json;

    #[test]
    fn empty_provider_supports_nothing() {
        let provider = SyncProvider::new();
        assert!(provider.capabilities().is_empty());
        for op in Operation::ALL {
            assert!(!provider.supports(op));
        }
    }

    #[test]
    fn capabilities_follow_filled_slots() {
        let provider = SyncProvider::new()
            .with_delete_many(|ids, _| Ok(Some(ids.iter().map(Identifier::to_value).collect())))
            .with_get_one(|_, _| Ok(json!({})));
        assert_eq!(
            provider.capabilities(),
            vec![Operation::GetOne, Operation::DeleteMany]
        );
    }

    #[test]
    fn async_slots_accept_boxed_futures() {
        let provider = AsyncProvider::new()
            .with_get_list(|_, _| boxed(async { Ok(vec![json!({"n": 1})]) }));
        assert!(provider.supports(Operation::GetList));
        assert!(!provider.supports(Operation::GetOne));
        assert!(format!("{:?}", provider).contains("GetList"));
    }
}
