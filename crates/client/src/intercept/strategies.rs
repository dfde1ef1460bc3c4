//! Per-class strategies: cache-first, network-first and network-only.
//!
//! Store writes are best-effort. A failed write or lookup is logged and
//! treated as if the store were empty.

use std::time::Duration;

use chrono::Utc;
use swcache_core::{Error, RequestKey, ResourceClass, ResponseSnapshot, StoreKind};

use super::{Interceptor, ResponseSource, offline};
use crate::fetch::FetchRequest;

type Outcome = (ResponseSource, ResponseSnapshot);

impl Interceptor {
    async fn lookup(&self, key: &RequestKey) -> Option<ResponseSnapshot> {
        match self.storage.match_any(key).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(error = %e, url = %key.url, "cache lookup failed");
                None
            }
        }
    }

    /// Like `lookup`, skipping an entry older than `ttl`.
    async fn lookup_fresh(&self, key: &RequestKey, ttl: Option<Duration>) -> Option<ResponseSnapshot> {
        let entry = self.lookup(key).await?;
        if ttl.is_some_and(|ttl| entry.is_expired(ttl, Utc::now())) {
            tracing::debug!(url = %key.url, "cached entry expired");
            return None;
        }
        Some(entry)
    }

    async fn remember(&self, kind: Option<StoreKind>, key: &RequestKey, response: &ResponseSnapshot) {
        let Some(kind) = kind else {
            return;
        };
        let store = self.stores.name(kind);
        let entry = response.stamped(Utc::now());
        if let Err(e) = self.storage.put(&store, key, &entry).await {
            tracing::warn!(error = %e, store = %store, url = %key.url, "cache write failed");
        }
    }

    /// Static assets and images.
    pub(super) async fn cache_first(&self, class: ResourceClass, request: &FetchRequest) -> Result<Outcome, Error> {
        let policy = *self.table.policy(class);
        let key = request.key();

        if let Some(entry) = self.lookup_fresh(&key, policy.ttl).await {
            return Ok((ResponseSource::Cache, entry));
        }

        let err = match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    self.remember(policy.store, &key, &response).await;
                }
                return Ok((ResponseSource::Network, response));
            }
            Err(err) => err,
        };

        tracing::debug!(error = %err, url = %request.url, "{} fetch failed, trying cache", class);

        if let Some(entry) = self.lookup(&key).await {
            return Ok((ResponseSource::StaleCache, entry));
        }

        let wants_icon = class == ResourceClass::Image || request.url.as_str().contains("icon");
        if wants_icon && let Some(icon) = self.lookup(&self.fallbacks.icon).await {
            return Ok((ResponseSource::Fallback, icon));
        }

        Err(Error::NoFallback { url: request.url.to_string(), source: Box::new(err) })
    }

    pub(super) async fn api_network_first(&self, request: &FetchRequest) -> Outcome {
        let policy = *self.table.policy(ResourceClass::Api);
        let key = request.key();

        match self.network.fetch(&request.bypassing_cache()).await {
            Ok(response) => {
                if response.is_ok() {
                    self.remember(policy.store, &key, &response).await;
                }
                (ResponseSource::Network, response)
            }
            Err(err) => {
                tracing::debug!(error = %err, url = %request.url, "api offline, trying cache");

                if let Some(entry) = self.lookup_fresh(&key, policy.ttl).await {
                    let entry = entry
                        .with_header("X-Cache-Status", "cached")
                        .with_header("X-Cache-Warning", "Data may be out of date");
                    return (ResponseSource::StaleCache, entry);
                }

                (ResponseSource::Synthesized, offline::api_unavailable())
            }
        }
    }

    pub(super) async fn page_network_first(&self, request: &FetchRequest) -> Outcome {
        let policy = *self.table.policy(ResourceClass::Page);
        let key = request.key();

        match self.network.fetch(request).await {
            Ok(response) => {
                if response.is_ok() {
                    self.remember(policy.store, &key, &response).await;
                }
                (ResponseSource::Network, response)
            }
            Err(err) => {
                tracing::debug!(error = %err, url = %request.url, "page offline, trying cache");
                self.page_fallback(&key, request.url.path(), policy.ttl).await
            }
        }
    }

    /// Exact entry, then landing pages by path prefix, then the offline
    /// document, then a generated page. First unexpired hit wins.
    async fn page_fallback(&self, key: &RequestKey, path: &str, ttl: Option<Duration>) -> Outcome {
        if let Some(entry) = self.lookup_fresh(key, ttl).await {
            return (ResponseSource::StaleCache, entry);
        }

        for (prefix, fallback) in &self.fallbacks.pages {
            if path.starts_with(prefix.as_str())
                && let Some(entry) = self.lookup_fresh(fallback, ttl).await
            {
                tracing::debug!(fallback = %fallback.url, "serving fallback page");
                return (ResponseSource::Fallback, entry);
            }
        }

        if let Some(entry) = self.lookup_fresh(&self.fallbacks.offline_page, ttl).await {
            return (ResponseSource::Fallback, entry);
        }

        (ResponseSource::Synthesized, offline::offline_document(&self.fallbacks.app_name))
    }

    /// Mutations never read or write a store.
    pub(super) async fn network_only(&self, request: &FetchRequest) -> Outcome {
        match self.network.fetch(request).await {
            Ok(response) => (ResponseSource::Network, response),
            Err(err) => {
                tracing::warn!(error = %err, method = %request.method, url = %request.url, "mutation failed");
                (ResponseSource::Synthesized, offline::mutation_unavailable())
            }
        }
    }
}
