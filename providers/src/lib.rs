//! Provider registry and operation dispatch for pluggable data adapters.
//!
//! Callers perform CRUD-style operations against named resources without
//! knowing which adapter serves them. The crate holds the value types, the
//! adapter contract, the registry store, and the dispatcher that binds a
//! resource + operation + defaults into a reusable accessor. Concrete
//! backends live outside this crate; `adapters` only carries test doubles.

use std::borrow::Borrow;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Payload and response type exchanged with adapters.
pub type Record = serde_json::Value;

/// Free-form metadata forwarded to adapters next to the parameters.
pub type Meta = serde_json::Map<String, serde_json::Value>;

/// Failure raised by an adapter. Travels through the dispatcher untouched.
pub type AdapterError = Box<dyn std::error::Error + Send + Sync>;

/// Name under which an adapter is registered.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceName(String);

impl ResourceName {
    pub fn new<S: Into<String>>(s: S) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ResourceName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for ResourceName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Display for ResourceName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Record identifier: either an integer or a string.
///
/// `0` is an ordinary identifier, never treated as "missing".
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Int(i64),
    Str(String),
}

impl Identifier {
    /// Read an identifier out of a JSON value (integer or string).
    pub fn from_value(value: &Record) -> Option<Self> {
        match value {
            Record::Number(n) => n.as_i64().map(Identifier::Int),
            Record::String(s) => Some(Identifier::Str(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Record {
        match self {
            Identifier::Int(n) => Record::from(*n),
            Identifier::Str(s) => Record::from(s.as_str()),
        }
    }
}

impl From<i64> for Identifier {
    fn from(n: i64) -> Self {
        Identifier::Int(n)
    }
}

impl From<i32> for Identifier {
    fn from(n: i32) -> Self {
        Identifier::Int(n.into())
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Identifier::Str(s.to_string())
    }
}

impl From<String> for Identifier {
    fn from(s: String) -> Self {
        Identifier::Str(s)
    }
}

impl Display for Identifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Identifier::Int(n) => write!(f, "{}", n),
            Identifier::Str(s) => f.write_str(s),
        }
    }
}

/// Parameters for `getOne`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GetOneParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Record>,
}

impl GetOneParams {
    pub fn by_id(id: impl Into<Identifier>) -> Self {
        Self {
            id: Some(id.into()),
            filter: None,
        }
    }

    pub fn by_filter(filter: Record) -> Self {
        Self {
            id: None,
            filter: Some(filter),
        }
    }
}

/// Page window for `getList`. Pages are 1-based.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    #[serde(default)]
    pub order: SortOrder,
}

/// Parameters for `getList`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GetListParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<Sort>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Record>,
}

/// The nine operations an adapter may serve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    GetOne,
    GetList,
    GetMany,
    CreateOne,
    CreateMany,
    UpdateOne,
    UpdateMany,
    DeleteOne,
    DeleteMany,
}

impl Operation {
    pub const ALL: [Operation; 9] = [
        Operation::GetOne,
        Operation::GetList,
        Operation::GetMany,
        Operation::CreateOne,
        Operation::CreateMany,
        Operation::UpdateOne,
        Operation::UpdateMany,
        Operation::DeleteOne,
        Operation::DeleteMany,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::GetOne => "getOne",
            Operation::GetList => "getList",
            Operation::GetMany => "getMany",
            Operation::CreateOne => "createOne",
            Operation::CreateMany => "createMany",
            Operation::UpdateOne => "updateOne",
            Operation::UpdateMany => "updateMany",
            Operation::DeleteOne => "deleteOne",
            Operation::DeleteMany => "deleteMany",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Operation::ALL
            .into_iter()
            .find(|op| op.as_str().eq_ignore_ascii_case(s))
    }
}

impl Display for Operation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adapter family: suspending (async) or immediate (sync).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FamilyKind {
    Async,
    Sync,
}

impl FamilyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FamilyKind::Async => "async",
            FamilyKind::Sync => "sync",
        }
    }
}

impl Display for FamilyKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by resolution and dispatch.
#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("no {family} data providers installed")]
    NoRegistry { family: FamilyKind },
    #[error("provider with {resource} name does not exist")]
    UnknownResource { resource: ResourceName },
    #[error("{operation} method not implemented in resource {resource}")]
    NotImplemented {
        operation: Operation,
        resource: ResourceName,
    },
    #[error("deleteOne on resource {resource} needs an identifier")]
    MissingIdentifier { resource: ResourceName },
    #[error(transparent)]
    Provider(AdapterError),
}

pub mod adapters;
pub mod dispatch;
pub mod family;
pub mod merge;
pub mod provider;
pub mod registry;
pub mod scope;

pub use dispatch::{ops, Accessor, AsyncAccessor, OperationKind, SyncAccessor};
pub use family::{boxed, DispatchFuture, Family, Immediate, ProviderFuture, Suspend};
pub use merge::Params;
pub use provider::{AsyncProvider, Handler, Provider, SyncProvider};
pub use registry::{AsyncRegistry, Registry, SyncRegistry};
pub use scope::ScopedRegistry;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn identifier_accepts_numbers_and_strings() {
        assert_eq!(Identifier::from_value(&json!(0)), Some(Identifier::Int(0)));
        assert_eq!(
            Identifier::from_value(&json!("abc")),
            Some(Identifier::Str("abc".into()))
        );
        assert_eq!(Identifier::from_value(&json!(1.5)), None);
        assert_eq!(Identifier::from_value(&json!(null)), None);
    }

    #[test]
    fn identifier_serde_is_untagged() {
        let ids: Vec<Identifier> = serde_json::from_value(json!([7, "seven"])).unwrap();
        assert_eq!(ids, vec![Identifier::Int(7), Identifier::from("seven")]);
        assert_eq!(serde_json::to_value(Identifier::Int(0)).unwrap(), json!(0));
    }

    #[test]
    fn operation_names_round_trip() {
        for op in Operation::ALL {
            assert_eq!(Operation::parse(op.as_str()), Some(op));
        }
        assert_eq!(Operation::parse("GETLIST"), Some(Operation::GetList));
        assert_eq!(Operation::parse("upsert"), None);
    }

    #[test]
    fn not_implemented_message_names_operation_and_resource() {
        let err = DataError::NotImplemented {
            operation: Operation::GetList,
            resource: ResourceName::from("dummy"),
        };
        assert_eq!(
            err.to_string(),
            "getList method not implemented in resource dummy"
        );
    }

    #[test]
    fn list_params_skip_absent_fields() {
        let params = GetListParams {
            pagination: Some(Pagination {
                page: Some(2),
                limit: None,
            }),
            sort: None,
            filter: None,
        };
        assert_eq!(
            serde_json::to_value(params).unwrap(),
            json!({"pagination": {"page": 2}})
        );
    }
}
