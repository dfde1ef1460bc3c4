//! Typed store identities and their versioned names.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::AppConfig;

/// One of the stores the current version owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Precached shell assets, static files and images.
    Static,
    /// Pages fetched while browsing.
    Dynamic,
    /// API responses.
    Api,
}

impl StoreKind {
    pub const ALL: [StoreKind; 3] = [StoreKind::Static, StoreKind::Dynamic, StoreKind::Api];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKind::Static => "static",
            StoreKind::Dynamic => "dynamic",
            StoreKind::Api => "api",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves [`StoreKind`]s to names for one deployment version, e.g.
/// `fakturownia-static-v1.2.0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSet {
    prefix: String,
    version: String,
}

impl StoreSet {
    pub fn new(prefix: impl Into<String>, version: impl Into<String>) -> Self {
        Self { prefix: prefix.into(), version: version.into() }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.cache_prefix, &config.cache_version)
    }

    pub fn name(&self, kind: StoreKind) -> String {
        format!("{}-{}-v{}", self.prefix, kind, self.version)
    }

    /// Names of every store this version keeps on activation.
    pub fn valid_names(&self) -> Vec<String> {
        StoreKind::ALL.iter().map(|kind| self.name(*kind)).collect()
    }

    pub fn is_valid(&self, name: &str) -> bool {
        StoreKind::ALL.iter().any(|kind| self.name(*kind) == name)
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_versioned_names() {
        let set = StoreSet::new("fakturownia", "1.2.0");
        assert_eq!(set.name(StoreKind::Static), "fakturownia-static-v1.2.0");
        assert_eq!(set.name(StoreKind::Dynamic), "fakturownia-dynamic-v1.2.0");
        assert_eq!(set.name(StoreKind::Api), "fakturownia-api-v1.2.0");
    }

    #[test]
    fn test_validity_tracks_version() {
        let set = StoreSet::new("fakturownia", "1.2.0");
        assert!(set.is_valid("fakturownia-api-v1.2.0"));
        assert!(!set.is_valid("fakturownia-api-v1.1.0"));
        assert!(!set.is_valid("fakturownia-v1.2.0"));
        assert_eq!(set.valid_names().len(), 3);
    }

    #[test]
    fn test_from_config() {
        let set = StoreSet::from_config(&AppConfig::default());
        assert_eq!(set.prefix(), "fakturownia");
        assert_eq!(set.version(), "1.2.0");
    }
}
