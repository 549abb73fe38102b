//! In-memory adapter backing every operation with a locked map.

use std::cmp::Ordering as CmpOrdering;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::family::Family;
use crate::merge::Params;
use crate::provider::Provider;
use crate::{
    AdapterError, GetListParams, GetOneParams, Identifier, Meta, Record, SortOrder,
};

/// Errors raised by [`MemoryStore`].
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MemoryError {
    #[error("record {0} not found")]
    NotFound(Identifier),
    #[error("no record matches the filter")]
    NoMatch,
    #[error("record {0} already exists")]
    AlreadyExists(Identifier),
    #[error("invalid record: {0}")]
    InvalidRecord(&'static str),
    #[error("mutex poisoned")]
    Poisoned,
}

type Records = BTreeMap<Identifier, Record>;

/// Simple in-memory record store for tests and demos. Records are JSON
/// objects keyed by their `id` field; creating a record without one assigns
/// the next integer id.
pub struct MemoryStore {
    records: Mutex<Records>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(BTreeMap::new()),
            next_id: AtomicI64::new(1),
        }
    }

    /// Build a store pre-populated with `records`.
    pub fn seeded(records: impl IntoIterator<Item = Record>) -> Result<Self, MemoryError> {
        let store = Self::new();
        store.create_many(records.into_iter().collect())?;
        Ok(store)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Records>, MemoryError> {
        self.records.lock().map_err(|_| MemoryError::Poisoned)
    }

    pub fn len(&self) -> Result<usize, MemoryError> {
        Ok(self.lock()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, MemoryError> {
        Ok(self.len()? == 0)
    }

    pub fn get_one(&self, params: &GetOneParams) -> Result<Record, MemoryError> {
        check_filter(params.filter.as_ref())?;
        let map = self.lock()?;
        if let Some(ref id) = params.id {
            return map
                .get(id)
                .filter(|record| matches_filter(record, params.filter.as_ref()))
                .cloned()
                .ok_or_else(|| MemoryError::NotFound(id.clone()));
        }
        map.values()
            .find(|record| matches_filter(record, params.filter.as_ref()))
            .cloned()
            .ok_or(MemoryError::NoMatch)
    }

    pub fn get_list(&self, params: &GetListParams) -> Result<Vec<Record>, MemoryError> {
        check_filter(params.filter.as_ref())?;
        let map = self.lock()?;
        let mut items: Vec<Record> = map
            .values()
            .filter(|record| matches_filter(record, params.filter.as_ref()))
            .cloned()
            .collect();
        drop(map);

        if let Some(ref sort) = params.sort {
            items.sort_by(|a, b| {
                let ord = compare_values(a.get(&sort.field), b.get(&sort.field));
                match sort.order {
                    SortOrder::Asc => ord,
                    SortOrder::Desc => ord.reverse(),
                }
            });
        }

        let Some(ref pagination) = params.pagination else {
            return Ok(items);
        };
        let limit = pagination.limit.map(to_usize).unwrap_or(usize::MAX);
        let page = pagination.page.unwrap_or(1).max(1);
        let offset = to_usize(page - 1).saturating_mul(limit);
        Ok(items.into_iter().skip(offset).take(limit).collect())
    }

    /// Records for `ids` in the requested order; unknown ids are skipped.
    pub fn get_many(&self, ids: &[Identifier]) -> Result<Vec<Record>, MemoryError> {
        let map = self.lock()?;
        Ok(ids.iter().filter_map(|id| map.get(id).cloned()).collect())
    }

    pub fn create_one(&self, payload: Record) -> Result<Record, MemoryError> {
        let mut map = self.lock()?;
        self.insert(&mut map, payload)
    }

    /// Create all records or none.
    pub fn create_many(&self, payloads: Vec<Record>) -> Result<Vec<Record>, MemoryError> {
        let mut map = self.lock()?;
        let mut staged = map.clone();
        let created = payloads
            .into_iter()
            .map(|payload| self.insert(&mut staged, payload))
            .collect::<Result<Vec<_>, _>>()?;
        *map = staged;
        Ok(created)
    }

    /// Shallow-merge `patch` into the stored record named by its `id`.
    pub fn update_one(&self, patch: Record) -> Result<Record, MemoryError> {
        let mut map = self.lock()?;
        apply_patch(&mut map, patch)
    }

    /// Apply all patches or none.
    pub fn update_many(&self, patches: Vec<Record>) -> Result<Vec<Record>, MemoryError> {
        let mut map = self.lock()?;
        let mut staged = map.clone();
        let updated = patches
            .into_iter()
            .map(|patch| apply_patch(&mut staged, patch))
            .collect::<Result<Vec<_>, _>>()?;
        *map = staged;
        Ok(updated)
    }

    pub fn delete_one(&self, id: &Identifier) -> Result<Record, MemoryError> {
        let mut map = self.lock()?;
        map.remove(id)
            .ok_or_else(|| MemoryError::NotFound(id.clone()))
    }

    /// Remove every known id; unknown ids are skipped.
    pub fn delete_many(&self, ids: &[Identifier]) -> Result<Vec<Record>, MemoryError> {
        let mut map = self.lock()?;
        Ok(ids.iter().filter_map(|id| map.remove(id)).collect())
    }

    /// Expose this store as an adapter serving all nine operations.
    pub fn provider<F: Family>(self: &Arc<Self>) -> Provider<F> {
        Provider::new()
            .with_get_one({
                let store = Arc::clone(self);
                move |params: GetOneParams, _meta: Meta| {
                    F::ready(store.get_one(&params).map_err(AdapterError::from))
                }
            })
            .with_get_list({
                let store = Arc::clone(self);
                move |params: GetListParams, _meta: Meta| {
                    F::ready(store.get_list(&params).map_err(AdapterError::from))
                }
            })
            .with_get_many({
                let store = Arc::clone(self);
                move |ids: Vec<Identifier>, _meta: Meta| {
                    F::ready(store.get_many(&ids).map_err(AdapterError::from))
                }
            })
            .with_create_one({
                let store = Arc::clone(self);
                move |payload: Record, _meta: Meta| {
                    F::ready(store.create_one(payload).map(Some).map_err(AdapterError::from))
                }
            })
            .with_create_many({
                let store = Arc::clone(self);
                move |payloads: Vec<Record>, _meta: Meta| {
                    F::ready(store.create_many(payloads).map(Some).map_err(AdapterError::from))
                }
            })
            .with_update_one({
                let store = Arc::clone(self);
                move |patch: Record, _meta: Meta| {
                    F::ready(store.update_one(patch).map(Some).map_err(AdapterError::from))
                }
            })
            .with_update_many({
                let store = Arc::clone(self);
                move |patches: Vec<Record>, _meta: Meta| {
                    F::ready(store.update_many(patches).map(Some).map_err(AdapterError::from))
                }
            })
            .with_delete_one({
                let store = Arc::clone(self);
                move |id: Identifier, _meta: Meta| {
                    F::ready(store.delete_one(&id).map(Some).map_err(AdapterError::from))
                }
            })
            .with_delete_many({
                let store = Arc::clone(self);
                move |ids: Vec<Identifier>, _meta: Meta| {
                    F::ready(store.delete_many(&ids).map(Some).map_err(AdapterError::from))
                }
            })
    }

    fn insert(&self, map: &mut Records, payload: Record) -> Result<Record, MemoryError> {
        let Record::Object(mut fields) = payload else {
            return Err(MemoryError::InvalidRecord("payload must be an object"));
        };
        let id = match fields.get("id") {
            Some(value) => {
                Identifier::from_value(value).ok_or(MemoryError::InvalidRecord("bad id"))?
            }
            None => self.allocate_id(map),
        };
        if map.contains_key(&id) {
            return Err(MemoryError::AlreadyExists(id));
        }
        if let Identifier::Int(n) = id {
            // keep generated ids clear of explicit ones
            self.next_id.fetch_max(n.saturating_add(1), Ordering::Relaxed);
        }
        fields.insert("id".into(), id.to_value());
        let record = Record::Object(fields);
        map.insert(id, record.clone());
        Ok(record)
    }

    fn allocate_id(&self, map: &Records) -> Identifier {
        loop {
            let id = Identifier::Int(self.next_id.fetch_add(1, Ordering::Relaxed));
            if !map.contains_key(&id) {
                return id;
            }
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn apply_patch(map: &mut Records, patch: Record) -> Result<Record, MemoryError> {
    let id = patch
        .get("id")
        .and_then(Identifier::from_value)
        .ok_or(MemoryError::InvalidRecord("update needs an id"))?;
    let current = map
        .get(&id)
        .ok_or_else(|| MemoryError::NotFound(id.clone()))?;
    let merged = Record::merge(Some(current), Some(patch))
        .filter(Record::is_object)
        .ok_or(MemoryError::InvalidRecord("payload must be an object"))?;
    map.insert(id, merged.clone());
    Ok(merged)
}

fn check_filter(filter: Option<&Record>) -> Result<(), MemoryError> {
    match filter {
        Some(filter) if !filter.is_object() => {
            Err(MemoryError::InvalidRecord("filter must be an object"))
        }
        _ => Ok(()),
    }
}

fn matches_filter(record: &Record, filter: Option<&Record>) -> bool {
    let Some(Record::Object(filter)) = filter else {
        return true;
    };
    filter
        .iter()
        .all(|(key, expected)| record.get(key) == Some(expected))
}

fn compare_values(a: Option<&Record>, b: Option<&Record>) -> CmpOrdering {
    match (a, b) {
        (None, None) => CmpOrdering::Equal,
        (None, Some(_)) => CmpOrdering::Less,
        (Some(_), None) => CmpOrdering::Greater,
        (Some(Record::Number(x)), Some(Record::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(CmpOrdering::Equal),
        (Some(Record::String(x)), Some(Record::String(y))) => x.cmp(y),
        (Some(Record::Bool(x)), Some(Record::Bool(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Pagination, Sort};
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::seeded(vec![
            json!({"id": 1, "title": "b", "status": "draft"}),
            json!({"id": 2, "title": "c", "status": "published"}),
            json!({"id": 3, "title": "a", "status": "published"}),
        ])
        .unwrap()
    }

    #[test]
    fn create_assigns_ids_after_explicit_ones() {
        let store = store();
        let created = store.create_one(json!({"title": "d"})).unwrap();
        assert_eq!(created, json!({"id": 4, "title": "d"}));
        assert_eq!(store.len(), Ok(4));
    }

    #[test]
    fn create_rejects_duplicate_and_non_objects() {
        let store = store();
        assert_eq!(
            store.create_one(json!({"id": 1})).unwrap_err(),
            MemoryError::AlreadyExists(Identifier::Int(1))
        );
        assert!(matches!(
            store.create_one(json!([1, 2])),
            Err(MemoryError::InvalidRecord(_))
        ));
    }

    #[test]
    fn create_many_is_all_or_nothing() {
        let store = store();
        let err = store
            .create_many(vec![json!({"id": "x"}), json!({"id": "x"})])
            .unwrap_err();
        assert_eq!(err, MemoryError::AlreadyExists(Identifier::from("x")));
        assert_eq!(store.len(), Ok(3));
    }

    #[test]
    fn get_one_by_id_or_filter() {
        let store = store();
        assert_eq!(store.get_one(&GetOneParams::by_id(2)).unwrap()["title"], json!("c"));
        let draft = store
            .get_one(&GetOneParams::by_filter(json!({"status": "draft"})))
            .unwrap();
        assert_eq!(draft["id"], json!(1));
        assert_eq!(
            store.get_one(&GetOneParams::by_id(0)).unwrap_err(),
            MemoryError::NotFound(Identifier::Int(0))
        );
        assert_eq!(
            store
                .get_one(&GetOneParams::by_filter(json!({"status": "gone"})))
                .unwrap_err(),
            MemoryError::NoMatch
        );
    }

    #[test]
    fn non_object_filter_is_rejected_by_get_one_and_get_list() {
        let store = store();
        assert_eq!(
            store.get_one(&GetOneParams::by_filter(json!("draft"))).unwrap_err(),
            MemoryError::InvalidRecord("filter must be an object")
        );
        let params = GetListParams {
            filter: Some(json!([1])),
            ..Default::default()
        };
        assert_eq!(
            store.get_list(&params).unwrap_err(),
            MemoryError::InvalidRecord("filter must be an object")
        );
    }

    #[test]
    fn poisoned_lock_surfaces_as_error() {
        let store = Arc::new(store());
        let holder = Arc::clone(&store);
        let _ = std::thread::spawn(move || {
            let _guard = holder.records.lock().unwrap();
            panic!("poison the store");
        })
        .join();

        assert_eq!(store.len(), Err(MemoryError::Poisoned));
        assert_eq!(store.is_empty(), Err(MemoryError::Poisoned));
        assert_eq!(
            store.get_one(&GetOneParams::by_id(1)).unwrap_err(),
            MemoryError::Poisoned
        );
    }

    #[test]
    fn list_filters_sorts_and_pages() {
        let store = store();
        let params = GetListParams {
            pagination: Some(Pagination {
                page: Some(2),
                limit: Some(1),
            }),
            sort: Some(Sort {
                field: "title".into(),
                order: SortOrder::Asc,
            }),
            filter: Some(json!({"status": "published"})),
        };
        let page = store.get_list(&params).unwrap();
        assert_eq!(page, vec![json!({"id": 2, "title": "c", "status": "published"})]);

        let all = store.get_list(&GetListParams::default()).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn list_sorts_descending() {
        let store = store();
        let params = GetListParams {
            sort: Some(Sort {
                field: "title".into(),
                order: SortOrder::Desc,
            }),
            ..Default::default()
        };
        let titles: Vec<Record> = store
            .get_list(&params)
            .unwrap()
            .into_iter()
            .map(|r| r["title"].clone())
            .collect();
        assert_eq!(titles, vec![json!("c"), json!("b"), json!("a")]);
    }

    #[test]
    fn get_many_keeps_request_order_and_skips_unknown() {
        let store = store();
        let rows = store
            .get_many(&[Identifier::Int(3), Identifier::Int(9), Identifier::Int(1)])
            .unwrap();
        let ids: Vec<Record> = rows.iter().map(|r| r["id"].clone()).collect();
        assert_eq!(ids, vec![json!(3), json!(1)]);
    }

    #[test]
    fn update_merges_shallowly_and_requires_existing_id() {
        let store = store();
        let updated = store.update_one(json!({"id": 1, "status": "published"})).unwrap();
        assert_eq!(updated, json!({"id": 1, "title": "b", "status": "published"}));
        assert_eq!(
            store.update_one(json!({"id": 42})).unwrap_err(),
            MemoryError::NotFound(Identifier::Int(42))
        );
        assert!(matches!(
            store.update_one(json!({"title": "no id"})),
            Err(MemoryError::InvalidRecord(_))
        ));
    }

    #[test]
    fn update_many_is_all_or_nothing() {
        let store = store();
        let err = store
            .update_many(vec![json!({"id": 1, "title": "z"}), json!({"id": 77})])
            .unwrap_err();
        assert_eq!(err, MemoryError::NotFound(Identifier::Int(77)));
        assert_eq!(store.get_one(&GetOneParams::by_id(1)).unwrap()["title"], json!("b"));
    }

    #[test]
    fn delete_one_and_many() {
        let store = store();
        assert_eq!(store.delete_one(&Identifier::Int(2)).unwrap()["id"], json!(2));
        assert_eq!(
            store.delete_one(&Identifier::Int(2)).unwrap_err(),
            MemoryError::NotFound(Identifier::Int(2))
        );
        let removed = store
            .delete_many(&[Identifier::Int(1), Identifier::Int(5)])
            .unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(store.len(), Ok(1));
    }

    #[test]
    fn provider_serves_every_operation() {
        let store = Arc::new(MemoryStore::new());
        let provider = store.provider::<crate::Immediate>();
        assert_eq!(provider.capabilities().len(), 9);
    }
}
