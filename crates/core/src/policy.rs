//! Resource classes and the strategy table that maps each class to a caching
//! strategy, a time-to-live and a target store.
//!
//! The table is built once from configuration and never changes while the
//! worker runs.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::StoreKind;
use crate::config::TtlConfig;

/// The unit of strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ResourceClass {
    Static,
    Api,
    Page,
    Image,
    Mutation,
}

impl ResourceClass {
    pub const ALL: [ResourceClass; 5] = [
        ResourceClass::Static,
        ResourceClass::Api,
        ResourceClass::Page,
        ResourceClass::Image,
        ResourceClass::Mutation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceClass::Static => "static",
            ResourceClass::Api => "api",
            ResourceClass::Page => "page",
            ResourceClass::Image => "image",
            ResourceClass::Mutation => "mutation",
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a class balances the local store against the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    /// Serve a fresh stored entry; otherwise fetch and store.
    CacheFirst,
    /// Always fetch; fall back to the store only when the fetch fails.
    NetworkFirst,
    /// Never touch the store.
    NetworkOnly,
}

/// Strategy, TTL and store for a single class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    pub strategy: Strategy,
    /// `None` for classes that never read stored entries.
    pub ttl: Option<Duration>,
    /// `None` for classes that never write stored entries.
    pub store: Option<StoreKind>,
}

/// Fixed mapping from resource class to [`Policy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyTable {
    static_assets: Policy,
    api: Policy,
    page: Policy,
    image: Policy,
    mutation: Policy,
}

impl StrategyTable {
    pub fn new(ttl: &TtlConfig) -> Self {
        Self {
            static_assets: Policy {
                strategy: Strategy::CacheFirst,
                ttl: Some(Duration::from_secs(ttl.static_secs)),
                store: Some(StoreKind::Static),
            },
            api: Policy {
                strategy: Strategy::NetworkFirst,
                ttl: Some(Duration::from_secs(ttl.api_secs)),
                store: Some(StoreKind::Api),
            },
            page: Policy {
                strategy: Strategy::NetworkFirst,
                ttl: Some(Duration::from_secs(ttl.page_secs)),
                store: Some(StoreKind::Dynamic),
            },
            // images share the static store but expire sooner
            image: Policy {
                strategy: Strategy::CacheFirst,
                ttl: Some(Duration::from_secs(ttl.image_secs)),
                store: Some(StoreKind::Static),
            },
            mutation: Policy { strategy: Strategy::NetworkOnly, ttl: None, store: None },
        }
    }

    pub fn policy(&self, class: ResourceClass) -> &Policy {
        match class {
            ResourceClass::Static => &self.static_assets,
            ResourceClass::Api => &self.api,
            ResourceClass::Page => &self.page,
            ResourceClass::Image => &self.image,
            ResourceClass::Mutation => &self.mutation,
        }
    }
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self::new(&TtlConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table() {
        let table = StrategyTable::default();
        assert_eq!(table.policy(ResourceClass::Static).strategy, Strategy::CacheFirst);
        assert_eq!(table.policy(ResourceClass::Image).strategy, Strategy::CacheFirst);
        assert_eq!(table.policy(ResourceClass::Api).strategy, Strategy::NetworkFirst);
        assert_eq!(table.policy(ResourceClass::Page).strategy, Strategy::NetworkFirst);
        assert_eq!(table.policy(ResourceClass::Mutation).strategy, Strategy::NetworkOnly);
    }

    #[test]
    fn test_mutation_has_no_store() {
        let table = StrategyTable::default();
        let policy = table.policy(ResourceClass::Mutation);
        assert!(policy.store.is_none());
        assert!(policy.ttl.is_none());
    }

    #[test]
    fn test_table_follows_ttl_config() {
        let table = StrategyTable::new(&TtlConfig { api_secs: 42, ..Default::default() });
        assert_eq!(table.policy(ResourceClass::Api).ttl, Some(Duration::from_secs(42)));
        assert_eq!(table.policy(ResourceClass::Image).store, Some(StoreKind::Static));
        assert_eq!(table.policy(ResourceClass::Page).store, Some(StoreKind::Dynamic));
    }

    #[test]
    fn test_class_names() {
        let names: Vec<_> = ResourceClass::ALL.iter().map(ResourceClass::to_string).collect();
        assert_eq!(names, vec!["static", "api", "page", "image", "mutation"]);
    }
}
