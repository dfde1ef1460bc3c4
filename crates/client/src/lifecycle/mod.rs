//! Worker lifecycle: install, activate, control messages and update checks.
//!
//! ```text
//! Parsed -> Installing -> Installed (waiting) -> Activating -> Activated
//! ```
//!
//! Install always ends in `Installed`, even when some precache fetches
//! failed, and then skips the waiting phase. Requests are only intercepted
//! once activation has claimed the open clients.

pub mod messages;

use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use serde_json::{Map, Value, json};
use swcache_core::cache::hash::digest_bytes;
use swcache_core::{AppConfig, CacheStorage, Error, StoreKind};
use tokio::sync::Mutex;
use url::Url;

pub use messages::ControlMessage;

use crate::fetch::{FetchRequest, Network, resolve_http};
use crate::intercept::{Disposition, Interceptor};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
}

/// A precache entry that could not be stored.
#[derive(Debug, Clone, Serialize)]
pub struct PrecacheFailure {
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InstallReport {
    pub cached: Vec<String>,
    pub failed: Vec<PrecacheFailure>,
    /// Set when skip-waiting activated the worker right after install.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub activated: Option<ActivateReport>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ActivateReport {
    /// Stores deleted because their names are not current.
    pub purged: Vec<String>,
}

#[derive(Debug)]
struct Status {
    state: WorkerState,
    controlling: bool,
    script_digest: Option<String>,
    update_available: bool,
}

/// One worker instance bound to a deployment version.
pub struct ServiceWorker {
    interceptor: Interceptor,
    storage: Arc<dyn CacheStorage>,
    precache: Vec<Url>,
    script_url: Url,
    status: Mutex<Status>,
}

impl ServiceWorker {
    /// Build a worker in the `Parsed` state.
    pub fn new(
        config: &AppConfig, storage: Arc<dyn CacheStorage>, network: Arc<dyn Network>,
    ) -> Result<Self, Error> {
        let interceptor = Interceptor::new(config, storage.clone(), network)?;
        let origin = interceptor.classifier().origin().clone();
        let resolve = |path: &str| resolve_http(&origin, path).map_err(|e| Error::InvalidUrl(e.to_string()));

        let precache = config
            .precache
            .iter()
            .map(|path| resolve(path))
            .collect::<Result<Vec<_>, Error>>()?;
        let script_url = resolve(&config.script_url)?;

        Ok(Self {
            interceptor,
            storage,
            precache,
            script_url,
            status: Mutex::new(Status {
                state: WorkerState::Parsed,
                controlling: false,
                script_digest: None,
                update_available: false,
            }),
        })
    }

    pub fn interceptor(&self) -> &Interceptor {
        &self.interceptor
    }

    pub fn network(&self) -> &Arc<dyn Network> {
        self.interceptor.network()
    }

    pub fn storage(&self) -> &Arc<dyn CacheStorage> {
        &self.storage
    }

    pub fn precache(&self) -> &[Url] {
        &self.precache
    }

    pub async fn state(&self) -> WorkerState {
        self.status.lock().await.state
    }

    /// Whether open pages are routed through the interceptor.
    pub async fn is_controlling(&self) -> bool {
        self.status.lock().await.controlling
    }

    pub async fn update_available(&self) -> bool {
        self.status.lock().await.update_available
    }

    /// Digest of the worker script as of the last update check.
    pub async fn script_digest(&self) -> Option<String> {
        self.status.lock().await.script_digest.clone()
    }

    /// Seed the digest the next update check compares against.
    pub async fn set_script_digest(&self, digest: impl Into<String>) {
        self.status.lock().await.script_digest = Some(digest.into());
    }

    async fn set_state(&self, state: WorkerState) {
        let mut status = self.status.lock().await;
        tracing::debug!(from = ?status.state, to = ?state, "worker state");
        status.state = state;
    }

    /// Precache the manifest into the static store, then skip waiting.
    ///
    /// Every URL is fetched concurrently with `Cache-Control: no-cache`. A
    /// failed URL is reported and logged but never aborts the others.
    pub async fn install(&self) -> Result<InstallReport, Error> {
        self.set_state(WorkerState::Installing).await;
        let store = self.interceptor.stores().name(StoreKind::Static);

        let results = join_all(self.precache.iter().map(|url| self.precache_one(&store, url))).await;

        let mut report = InstallReport::default();
        for (url, result) in self.precache.iter().zip(results) {
            match result {
                Ok(()) => report.cached.push(url.to_string()),
                Err(reason) => {
                    tracing::warn!(url = %url, reason = %reason, "precache failed");
                    report.failed.push(PrecacheFailure { url: url.to_string(), reason });
                }
            }
        }

        tracing::info!(
            store = %store,
            cached = report.cached.len(),
            failed = report.failed.len(),
            "install complete"
        );
        self.set_state(WorkerState::Installed).await;

        report.activated = self.skip_waiting().await?;
        Ok(report)
    }

    async fn precache_one(&self, store: &str, url: &Url) -> Result<(), String> {
        let request = FetchRequest::get(url.clone()).bypassing_cache();
        let response = self.network().fetch(&request).await.map_err(|e| e.to_string())?;
        if !response.is_ok() {
            return Err(format!("HTTP {} {}", response.status, response.status_text));
        }
        self.storage
            .put(store, &request.key(), &response)
            .await
            .map_err(|e| e.to_string())
    }

    /// Activate a waiting worker. Does nothing in any other state.
    pub async fn skip_waiting(&self) -> Result<Option<ActivateReport>, Error> {
        let state = self.state().await;
        if state != WorkerState::Installed {
            tracing::debug!(state = ?state, "skip waiting ignored");
            return Ok(None);
        }
        self.activate().await.map(Some)
    }

    /// Purge stores from other versions and claim open clients.
    pub async fn activate(&self) -> Result<ActivateReport, Error> {
        self.set_state(WorkerState::Activating).await;

        let stores = self.interceptor.stores();
        let mut purged = Vec::new();
        for name in self.storage.store_names().await? {
            if stores.is_valid(&name) {
                continue;
            }
            if self.storage.delete_store(&name).await? {
                tracing::info!(store = %name, "purged stale store");
                purged.push(name);
            }
        }

        {
            let mut status = self.status.lock().await;
            status.state = WorkerState::Activated;
            status.controlling = true;
        }
        tracing::info!(version = %stores.version(), purged = purged.len(), "worker activated");

        Ok(ActivateReport { purged })
    }

    /// Route a request from a page. Nothing is intercepted before activation.
    pub async fn fetch(&self, request: &FetchRequest) -> Result<Disposition, Error> {
        if !self.is_controlling().await {
            return Ok(Disposition::Passthrough);
        }
        self.interceptor.handle(request).await
    }

    /// Re-fetch the worker script and compare its digest with the last one
    /// seen. The first check only records a baseline.
    pub async fn check_for_update(&self) -> Result<bool, Error> {
        let request = FetchRequest::get(self.script_url.clone()).bypassing_cache();
        let response = self.network().fetch(&request).await?;
        if !response.is_ok() {
            return Err(Error::HttpError(format!(
                "{} returned {} {}",
                self.script_url, response.status, response.status_text
            )));
        }

        let digest = digest_bytes(&response.body);
        let mut status = self.status.lock().await;
        let changed = match status.script_digest.as_deref() {
            None => {
                tracing::debug!(digest = %digest, "recorded worker script baseline");
                false
            }
            Some(previous) if previous != digest => {
                tracing::info!(previous = %previous, current = %digest, "worker script changed");
                status.update_available = true;
                true
            }
            Some(_) => false,
        };
        status.script_digest = Some(digest);
        Ok(changed)
    }

    /// Entry count per store, keyed by store name.
    pub async fn cache_status(&self) -> Result<Map<String, Value>, Error> {
        Ok(self
            .storage
            .entry_counts()
            .await?
            .into_iter()
            .map(|(name, count)| (name, Value::from(count)))
            .collect())
    }

    /// Handle a posted control message and return its reply, if it has one.
    ///
    /// Unknown or malformed messages are ignored.
    pub async fn handle_message(&self, message: &Value) -> Result<Option<Value>, Error> {
        let Some(kind) = ControlMessage::parse(message) else {
            tracing::debug!(message = %message, "ignoring unknown control message");
            return Ok(None);
        };
        tracing::debug!(message = %kind, "control message");

        match kind {
            ControlMessage::SkipWaiting => {
                self.skip_waiting().await?;
                Ok(None)
            }
            ControlMessage::CacheClear => {
                let deleted = self.storage.clear_all().await?;
                tracing::info!(deleted, "cleared all stores");
                Ok(Some(json!({ "success": true })))
            }
            ControlMessage::CacheStatus => Ok(Some(Value::Object(self.cache_status().await?))),
            ControlMessage::ForceUpdate => {
                match self.check_for_update().await {
                    Err(e) if e.is_network() => tracing::debug!(error = %e, "update check skipped, offline"),
                    Err(e) => tracing::warn!(error = %e, "update check failed"),
                    Ok(_) => {}
                }
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedNetwork;
    use swcache_core::{MemoryStorage, RequestKey, ResponseSnapshot};

    const STATIC_STORE: &str = "fakturownia-static-v1.2.0";
    const DYNAMIC_STORE: &str = "fakturownia-dynamic-v1.2.0";
    const API_STORE: &str = "fakturownia-api-v1.2.0";

    struct Harness {
        worker: ServiceWorker,
        storage: Arc<MemoryStorage>,
        network: Arc<ScriptedNetwork>,
    }

    fn harness() -> Harness {
        let config = AppConfig {
            precache: vec!["/".into(), "/offline.html".into(), "/static/app.css".into()],
            ..Default::default()
        };
        let storage = Arc::new(MemoryStorage::new());
        let network = Arc::new(ScriptedNetwork::offline());
        let worker = ServiceWorker::new(&config, storage.clone(), network.clone()).unwrap();
        Harness { worker, storage, network }
    }

    fn url(path: &str) -> String {
        format!("http://localhost:8000{path}")
    }

    fn ok(body: &str) -> ResponseSnapshot {
        ResponseSnapshot::new(200, "OK", body.to_string())
    }

    async fn seed(storage: &MemoryStorage, store: &str, path: &str) {
        let key = RequestKey::get(&Url::parse(&url(path)).unwrap());
        storage.put(store, &key, &ok(path)).await.unwrap();
    }

    #[tokio::test]
    async fn test_new_worker_is_parsed_and_not_controlling() {
        let h = harness();
        assert_eq!(h.worker.state().await, WorkerState::Parsed);
        assert!(!h.worker.is_controlling().await);
        assert_eq!(h.worker.precache().len(), 3);

        let request = FetchRequest::get(Url::parse(&url("/static/app.css")).unwrap());
        assert!(matches!(h.worker.fetch(&request).await.unwrap(), Disposition::Passthrough));
        assert_eq!(h.network.call_count(), 0);
    }

    #[tokio::test]
    async fn test_install_with_partial_failure() {
        let h = harness();
        h.network.respond_ok(&url("/"), "home");
        h.network.respond_ok(&url("/offline.html"), "offline");
        h.network.respond(&url("/static/app.css"), ResponseSnapshot::new(500, "Internal Server Error", ""));

        let report = h.worker.install().await.unwrap();

        assert_eq!(report.cached, vec![url("/"), url("/offline.html")]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].url, url("/static/app.css"));
        assert!(report.failed[0].reason.contains("500"));
        assert!(report.activated.is_some());

        assert_eq!(h.worker.state().await, WorkerState::Activated);
        assert!(h.worker.is_controlling().await);
        assert_eq!(h.storage.entry_count(STATIC_STORE).await.unwrap(), 2);

        for call in h.network.calls() {
            assert_eq!(call.header("Cache-Control"), Some("no-cache"));
        }
    }

    #[tokio::test]
    async fn test_install_entries_are_unstamped() {
        let h = harness();
        h.network.respond_ok(&url("/offline.html"), "offline");

        h.worker.install().await.unwrap();

        let key = RequestKey::get(&Url::parse(&url("/offline.html")).unwrap());
        let stored = h.storage.match_in(STATIC_STORE, &key).await.unwrap().unwrap();
        assert!(stored.stored_at().is_none());
    }

    #[tokio::test]
    async fn test_install_offline_still_activates() {
        let h = harness();

        let report = h.worker.install().await.unwrap();

        assert!(report.cached.is_empty());
        assert_eq!(report.failed.len(), 3);
        assert_eq!(h.worker.state().await, WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_activation_purges_stale_stores() {
        let h = harness();
        seed(&h.storage, "fakturownia-static-v1.1.0", "/").await;
        seed(&h.storage, STATIC_STORE, "/").await;
        seed(&h.storage, "leftover-old", "/").await;
        seed(&h.storage, DYNAMIC_STORE, "/admin/").await;
        seed(&h.storage, API_STORE, "/api/x").await;

        let report = h.worker.activate().await.unwrap();

        assert_eq!(report.purged, vec!["fakturownia-static-v1.1.0", "leftover-old"]);
        assert_eq!(
            h.storage.store_names().await.unwrap(),
            vec![STATIC_STORE, DYNAMIC_STORE, API_STORE]
        );
        assert_eq!(h.worker.state().await, WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_activated_worker_intercepts() {
        let h = harness();
        seed(&h.storage, STATIC_STORE, "/static/app.css").await;
        h.worker.activate().await.unwrap();

        let request = FetchRequest::get(Url::parse(&url("/static/app.css")).unwrap());
        let Disposition::Respond(served) = h.worker.fetch(&request).await.unwrap() else {
            panic!("activated worker did not intercept");
        };
        assert_eq!(served.response.text(), "/static/app.css");
        assert_eq!(h.network.call_count(), 0);
    }

    #[tokio::test]
    async fn test_skip_waiting_only_from_installed() {
        let h = harness();
        assert!(h.worker.skip_waiting().await.unwrap().is_none());
        assert_eq!(h.worker.state().await, WorkerState::Parsed);

        h.worker.status.lock().await.state = WorkerState::Installed;
        let reply = h.worker.handle_message(&json!({ "type": "SKIP_WAITING" })).await.unwrap();
        assert!(reply.is_none());
        assert_eq!(h.worker.state().await, WorkerState::Activated);
        assert!(h.worker.is_controlling().await);
    }

    #[tokio::test]
    async fn test_cache_status_counts_entries() {
        let h = harness();
        seed(&h.storage, STATIC_STORE, "/").await;
        seed(&h.storage, STATIC_STORE, "/offline.html").await;
        seed(&h.storage, API_STORE, "/api/x").await;

        let reply = h.worker.handle_message(&json!({ "type": "CACHE_STATUS" })).await.unwrap();

        assert_eq!(reply, Some(json!({ "fakturownia-static-v1.2.0": 2, "fakturownia-api-v1.2.0": 1 })));
    }

    #[tokio::test]
    async fn test_clear_then_status_is_empty() {
        let h = harness();
        seed(&h.storage, STATIC_STORE, "/").await;
        seed(&h.storage, "leftover-old", "/").await;

        let reply = h.worker.handle_message(&json!({ "type": "CACHE_CLEAR" })).await.unwrap();
        assert_eq!(reply, Some(json!({ "success": true })));

        let reply = h.worker.handle_message(&json!({ "type": "CACHE_STATUS" })).await.unwrap();
        assert_eq!(reply, Some(json!({})));
    }

    #[tokio::test]
    async fn test_unknown_message_is_ignored() {
        let h = harness();
        seed(&h.storage, STATIC_STORE, "/").await;

        for message in [json!({ "type": "PURGE_EVERYTHING" }), json!({ "data": 1 }), json!(42)] {
            assert!(h.worker.handle_message(&message).await.unwrap().is_none());
        }

        assert_eq!(h.storage.entry_count(STATIC_STORE).await.unwrap(), 1);
        assert_eq!(h.worker.state().await, WorkerState::Parsed);
        assert_eq!(h.network.call_count(), 0);
    }

    #[tokio::test]
    async fn test_force_update_detects_changed_script() {
        let h = harness();
        h.network.respond_ok(&url("/sw.js"), "const VERSION = '1.2.0';");

        assert!(!h.worker.check_for_update().await.unwrap());
        assert!(!h.worker.check_for_update().await.unwrap());
        assert!(!h.worker.update_available().await);

        h.network.respond_ok(&url("/sw.js"), "const VERSION = '1.3.0';");
        let reply = h.worker.handle_message(&json!({ "type": "FORCE_UPDATE" })).await.unwrap();

        assert!(reply.is_none());
        assert!(h.worker.update_available().await);
        assert_eq!(h.network.calls()[0].header("Cache-Control"), Some("no-cache"));
    }

    #[tokio::test]
    async fn test_update_against_seeded_digest() {
        let h = harness();
        h.network.respond_ok(&url("/sw.js"), "v2");

        h.worker.set_script_digest(digest_bytes(b"v1")).await;
        assert!(h.worker.check_for_update().await.unwrap());
        assert_eq!(h.worker.script_digest().await, Some(digest_bytes(b"v2")));
    }

    #[tokio::test]
    async fn test_force_update_offline_is_not_an_error() {
        let h = harness();
        let reply = h.worker.handle_message(&json!({ "type": "FORCE_UPDATE" })).await.unwrap();
        assert!(reply.is_none());
        assert!(!h.worker.update_available().await);
        assert!(h.worker.check_for_update().await.unwrap_err().is_network());
    }
}
