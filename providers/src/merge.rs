//! Merging bind-time defaults with call-time parameters.
//!
//! Object-shaped parameters merge shallowly, call-time keys winning key by
//! key. List parameters concatenate, defaults first. Metadata always merges
//! shallowly.

use crate::{GetListParams, GetOneParams, Identifier, Meta, Record};

/// Parameter shapes an accessor can carry as defaults.
pub trait Params: Clone + Send + 'static {
    /// Combine bind-time `defaults` with call-time `call`. `None` when neither
    /// side supplies anything.
    fn merge(defaults: Option<&Self>, call: Option<Self>) -> Option<Self>;

    /// What the adapter receives when neither side supplies anything. `None`
    /// means the operation cannot proceed without a value.
    fn vacant() -> Option<Self>;
}

impl Params for Record {
    fn merge(defaults: Option<&Self>, call: Option<Self>) -> Option<Self> {
        match (defaults, call) {
            (Some(Record::Object(base)), Some(Record::Object(overlay))) => {
                let mut merged = base.clone();
                merged.extend(overlay);
                Some(Record::Object(merged))
            }
            // a non-object call payload contributes no keys to object defaults
            (Some(base @ Record::Object(_)), Some(_)) => Some(base.clone()),
            (_, Some(call)) => Some(call),
            (defaults, None) => defaults.cloned(),
        }
    }

    fn vacant() -> Option<Self> {
        Some(Record::Object(Meta::new()))
    }
}

impl<T: Clone + Send + 'static> Params for Vec<T> {
    fn merge(defaults: Option<&Self>, call: Option<Self>) -> Option<Self> {
        if defaults.is_none() && call.is_none() {
            return None;
        }
        let mut merged = defaults.cloned().unwrap_or_default();
        merged.extend(call.into_iter().flatten());
        Some(merged)
    }

    fn vacant() -> Option<Self> {
        Some(Vec::new())
    }
}

impl Params for Identifier {
    // Call-time identifier when present, otherwise the bound one.
    fn merge(defaults: Option<&Self>, call: Option<Self>) -> Option<Self> {
        call.or_else(|| defaults.cloned())
    }

    fn vacant() -> Option<Self> {
        None
    }
}

impl Params for GetOneParams {
    fn merge(defaults: Option<&Self>, call: Option<Self>) -> Option<Self> {
        let Some(base) = defaults else {
            return call;
        };
        let Some(call) = call else {
            return Some(base.clone());
        };
        Some(GetOneParams {
            id: call.id.or_else(|| base.id.clone()),
            filter: call.filter.or_else(|| base.filter.clone()),
        })
    }

    fn vacant() -> Option<Self> {
        Some(GetOneParams::default())
    }
}

impl Params for GetListParams {
    fn merge(defaults: Option<&Self>, call: Option<Self>) -> Option<Self> {
        let Some(base) = defaults else {
            return call;
        };
        let Some(call) = call else {
            return Some(base.clone());
        };
        Some(GetListParams {
            pagination: call.pagination.or_else(|| base.pagination.clone()),
            sort: call.sort.or_else(|| base.sort.clone()),
            filter: call.filter.or_else(|| base.filter.clone()),
        })
    }

    fn vacant() -> Option<Self> {
        Some(GetListParams::default())
    }
}

/// Shallow metadata merge, call-time keys win.
pub fn merge_meta(defaults: Option<&Meta>, call: Option<Meta>) -> Meta {
    let mut merged = defaults.cloned().unwrap_or_default();
    if let Some(call) = call {
        merged.extend(call);
    }
    merged
}
