//! Registry store: resource name → adapter, per family.

use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};

use crate::family::{Family, Immediate, Suspend};
use crate::provider::Provider;
use crate::ResourceName;

pub type AsyncRegistry = Registry<Suspend>;
pub type SyncRegistry = Registry<Immediate>;

/// Adapters of one family keyed by resource name.
///
/// At most one adapter per name; registering a name again replaces the
/// previous adapter. Adapter shapes are not inspected here, capabilities are
/// checked lazily on every dispatch.
pub struct Registry<F: Family> {
    providers: BTreeMap<ResourceName, Provider<F>>,
}

impl<F: Family> Registry<F> {
    pub fn new() -> Self {
        Self {
            providers: BTreeMap::new(),
        }
    }

    /// Builder-style [`Registry::register`].
    pub fn with(mut self, resource: impl Into<ResourceName>, provider: Provider<F>) -> Self {
        self.register(resource, provider);
        self
    }

    /// Register `provider` under `resource`, returning the adapter it replaced.
    pub fn register(
        &mut self,
        resource: impl Into<ResourceName>,
        provider: Provider<F>,
    ) -> Option<Provider<F>> {
        self.providers.insert(resource.into(), provider)
    }

    pub fn get(&self, resource: &str) -> Option<&Provider<F>> {
        self.providers.get(resource)
    }

    pub fn contains(&self, resource: &str) -> bool {
        self.providers.contains_key(resource)
    }

    /// Registered resource names in sorted order.
    pub fn resources(&self) -> impl Iterator<Item = &ResourceName> {
        self.providers.keys()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl<F: Family> Default for Registry<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: Family> Clone for Registry<F> {
    fn clone(&self) -> Self {
        Self {
            providers: self.providers.clone(),
        }
    }
}

impl<F: Family> Debug for Registry<F> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.providers.iter()).finish()
    }
}

impl<F: Family, N: Into<ResourceName>> FromIterator<(N, Provider<F>)> for Registry<F> {
    fn from_iter<I: IntoIterator<Item = (N, Provider<F>)>>(iter: I) -> Self {
        let mut registry = Self::new();
        for (resource, provider) in iter {
            registry.register(resource, provider);
        }
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::SyncProvider;
    use crate::Operation;
    use serde_json::json;

    #[test]
    fn register_replaces_previous_adapter() {
        let mut registry = SyncRegistry::new();
        assert!(registry
            .register("posts", SyncProvider::new().with_get_one(|_, _| Ok(json!(1))))
            .is_none());
        let replaced = registry.register(
            "posts",
            SyncProvider::new().with_get_list(|_, _| Ok(vec![])),
        );
        assert!(replaced.is_some_and(|p| p.supports(Operation::GetOne)));
        assert_eq!(registry.len(), 1);
        let current = registry.get("posts").unwrap();
        assert!(current.supports(Operation::GetList));
        assert!(!current.supports(Operation::GetOne));
    }

    #[test]
    fn collects_from_pairs_and_lists_sorted_names() {
        let registry: SyncRegistry = [
            ("users", SyncProvider::new()),
            ("posts", SyncProvider::new()),
        ]
        .into_iter()
        .collect();
        let names: Vec<&str> = registry.resources().map(ResourceName::as_str).collect();
        assert_eq!(names, vec!["posts", "users"]);
        assert!(registry.contains("users"));
        assert!(!registry.contains("comments"));
    }

    #[test]
    fn empty_registry_is_empty() {
        let registry = AsyncRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.get("anything").is_none());
    }
}
