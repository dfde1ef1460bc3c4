//! The cache interceptor: classify a request, look up its class policy and
//! run the matching strategy.
//!
//! The interceptor owns no mutable state. Stores are shared through the
//! injected [`CacheStorage`], and two concurrent requests for the same URL may
//! both hit the network and both overwrite the same entry.

pub mod classify;
pub mod offline;
mod strategies;

use std::sync::Arc;

use serde::Serialize;
use swcache_core::{
    AppConfig, CacheStorage, Error, Policy, RequestKey, ResourceClass, ResponseSnapshot, StoreSet, StrategyTable,
};
use url::Url;

pub use classify::Classifier;

use crate::fetch::{FetchRequest, Network, resolve_http};

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    Network,
    /// A fresh stored entry, served without touching the network.
    Cache,
    /// A stored entry served because the network failed.
    StaleCache,
    /// A different stored entry standing in for the requested one.
    Fallback,
    /// Generated locally.
    Synthesized,
}

/// A response produced by a strategy.
#[derive(Debug, Clone)]
pub struct Served {
    pub class: ResourceClass,
    pub source: ResponseSource,
    pub response: ResponseSnapshot,
}

/// What the interceptor decided to do with a request.
#[derive(Debug, Clone)]
pub enum Disposition {
    /// Not ours; the request goes to the network untouched.
    Passthrough,
    Respond(Served),
}

/// Landing pages and documents served when a page or icon cannot be loaded.
#[derive(Debug, Clone)]
struct Fallbacks {
    /// (path prefix without trailing slash, store key), in priority order.
    pages: Vec<(String, RequestKey)>,
    offline_page: RequestKey,
    icon: RequestKey,
    app_name: String,
}

impl Fallbacks {
    fn from_config(config: &AppConfig, origin: &Url) -> Result<Self, Error> {
        let key = |path: &str| -> Result<RequestKey, Error> {
            let url = resolve_http(origin, path).map_err(|e| Error::InvalidUrl(e.to_string()))?;
            Ok(RequestKey::get(&url))
        };

        let pages = config
            .fallback_pages
            .iter()
            .map(|path| Ok((path.trim_end_matches('/').to_string(), key(path)?)))
            .collect::<Result<Vec<_>, Error>>()?;

        Ok(Self {
            pages,
            offline_page: key(&config.offline_page)?,
            icon: key(&config.fallback_icon)?,
            app_name: config.app_name.clone(),
        })
    }
}

/// Request router and strategy runner.
pub struct Interceptor {
    classifier: Classifier,
    table: StrategyTable,
    stores: StoreSet,
    fallbacks: Fallbacks,
    storage: Arc<dyn CacheStorage>,
    network: Arc<dyn Network>,
}

impl Interceptor {
    pub fn new(
        config: &AppConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>,
    ) -> Result<Self, Error> {
        let classifier = Classifier::from_config(config)?;
        let fallbacks = Fallbacks::from_config(config, classifier.origin())?;
        Ok(Self {
            classifier,
            table: StrategyTable::new(&config.ttl),
            stores: StoreSet::from_config(config),
            fallbacks,
            storage,
            network,
        })
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn stores(&self) -> &StoreSet {
        &self.stores
    }

    pub fn policy(&self, class: ResourceClass) -> &Policy {
        self.table.policy(class)
    }

    pub fn network(&self) -> &Arc<dyn Network> {
        &self.network
    }

    /// Route a request to its strategy.
    ///
    /// # Errors
    ///
    /// Only static assets and images can fail: when the network is down and
    /// neither the entry nor the icon fallback is stored, the fetch failure is
    /// returned as [`Error::NoFallback`].
    pub async fn handle(&self, request: &FetchRequest) -> Result<Disposition, Error> {
        let Some(class) = self
            .classifier
            .classify(&request.method, &request.url, request.accept())
        else {
            tracing::trace!(url = %request.url, "not intercepted");
            return Ok(Disposition::Passthrough);
        };

        let (source, response) = match class {
            ResourceClass::Static | ResourceClass::Image => self.cache_first(class, request).await?,
            ResourceClass::Api => self.api_network_first(request).await,
            ResourceClass::Page => self.page_network_first(request).await,
            ResourceClass::Mutation => self.network_only(request).await,
        };

        tracing::debug!(
            class = %class,
            source = ?source,
            status = response.status,
            "{} {}",
            request.method,
            request.url
        );

        Ok(Disposition::Respond(Served { class, source, response }))
    }
}
