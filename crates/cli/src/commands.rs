use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value, json};
use swcache_client::fetch::resolve;
use swcache_client::{Disposition, FetchClient, FetchConfig, FetchRequest, Method, ResponseSource, ServiceWorker};
use swcache_core::{AppConfig, CacheStorage, ResourceClass, Strategy, cache::open_storage};
use url::Url;

use crate::cli::OutputFormat;

/// How a request would be routed.
#[derive(Debug, Serialize)]
pub struct ClassifyReport {
    pub url: String,
    pub method: String,
    pub class: Option<ResourceClass>,
    pub strategy: Option<Strategy>,
    pub ttl_secs: Option<u64>,
    pub store: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FetchReport {
    pub url: String,
    pub method: String,
    pub class: Option<ResourceClass>,
    pub source: ResponseSource,
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub body_bytes: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// Entry counts per store, plus the current stores that do not exist yet.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub version: String,
    pub stores: Map<String, Value>,
    pub missing: Vec<String>,
}

pub struct CommandExecutor {
    worker: ServiceWorker,
    format: OutputFormat,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn build_request(origin: &Url, url: &str, method: &str, accept: Option<String>) -> Result<FetchRequest> {
    let method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
        .with_context(|| format!("unsupported method: {method}"))?;
    let url = resolve(origin, url).with_context(|| format!("invalid URL: {url}"))?;

    let mut request = FetchRequest::new(method, url);
    if let Some(accept) = accept {
        request = request.with_header("Accept", accept);
    }
    Ok(request)
}

impl CommandExecutor {
    pub async fn new(config: &AppConfig, format: OutputFormat) -> Result<Self> {
        let storage = open_storage(config).await.context("failed to open cache storage")?;
        let network = Arc::new(FetchClient::new(FetchConfig::from_app(config))?);
        let worker = ServiceWorker::new(config, storage, network)?;
        Ok(Self { worker, format })
    }

    pub async fn status_report(&self) -> Result<StatusReport> {
        let storage = self.worker.storage();
        let counts = storage.entry_counts().await?;
        let stores = self.worker.interceptor().stores();

        let mut missing = Vec::new();
        for name in stores.valid_names() {
            if !storage.has_store(&name).await? {
                missing.push(name);
            }
        }

        Ok(StatusReport {
            version: stores.version().to_string(),
            stores: counts.into_iter().map(|(name, count)| (name, Value::from(count))).collect(),
            missing,
        })
    }

    pub async fn status(&self) -> Result<()> {
        let report = self.status_report().await?;
        if self.format == OutputFormat::Json {
            return print_json(&report);
        }

        let stores = self.worker.interceptor().stores();
        println!("version {}", report.version);
        for (name, count) in &report.stores {
            let count = count.as_u64().unwrap_or_default();
            let marker = if stores.is_valid(name) { "" } else { "  (stale)" };
            println!("{name:<40} {count:>6}{marker}");
        }
        for name in &report.missing {
            println!("{name:<40} {:>6}  (not created)", "-");
        }
        Ok(())
    }

    pub async fn clear(&self) -> Result<()> {
        let reply = self.worker.handle_message(&json!({ "type": "CACHE_CLEAR" })).await?;
        match self.format {
            OutputFormat::Json => print_json(&reply),
            OutputFormat::Pretty => {
                println!("all stores cleared");
                Ok(())
            }
        }
    }

    pub async fn install(&self) -> Result<()> {
        let report = self.worker.install().await?;
        if self.format == OutputFormat::Json {
            return print_json(&report);
        }

        println!("cached {} of {}", report.cached.len(), self.worker.precache().len());
        for failure in &report.failed {
            println!("failed {}: {}", failure.url, failure.reason);
        }
        if let Some(activated) = &report.activated {
            for name in &activated.purged {
                println!("purged {name}");
            }
        }
        Ok(())
    }

    pub async fn activate(&self) -> Result<()> {
        let report = self.worker.activate().await?;
        if self.format == OutputFormat::Json {
            return print_json(&report);
        }

        if report.purged.is_empty() {
            println!("no stale stores");
        }
        for name in &report.purged {
            println!("purged {name}");
        }
        Ok(())
    }

    pub async fn update(&self, since: Option<String>) -> Result<()> {
        let compared = since.is_some();
        if let Some(digest) = since {
            self.worker.set_script_digest(digest).await;
        }

        let changed = self.worker.check_for_update().await.context("update check failed")?;
        let digest = self.worker.script_digest().await.unwrap_or_default();

        match self.format {
            OutputFormat::Json => print_json(&json!({ "digest": digest, "update_available": changed })),
            OutputFormat::Pretty => {
                println!("script digest {digest}");
                if compared {
                    println!("{}", if changed { "update available" } else { "up to date" });
                }
                Ok(())
            }
        }
    }

    pub fn classify_report(&self, request: &FetchRequest) -> ClassifyReport {
        let interceptor = self.worker.interceptor();
        let class = interceptor
            .classifier()
            .classify(&request.method, &request.url, request.accept());
        let policy = class.map(|c| *interceptor.policy(c));

        ClassifyReport {
            url: request.url.to_string(),
            method: request.method.to_string(),
            class,
            strategy: policy.map(|p| p.strategy),
            ttl_secs: policy.and_then(|p| p.ttl).map(|ttl| ttl.as_secs()),
            store: policy.and_then(|p| p.store).map(|kind| interceptor.stores().name(kind)),
        }
    }

    pub fn classify(&self, url: &str, method: &str, accept: Option<String>) -> Result<()> {
        let request = build_request(self.worker.interceptor().classifier().origin(), url, method, accept)?;
        let report = self.classify_report(&request);

        if self.format == OutputFormat::Json {
            return print_json(&report);
        }

        match report.class {
            None => println!("{} {} is not intercepted", report.method, report.url),
            Some(class) => {
                println!("{} {}", report.method, report.url);
                println!("class     {class}");
                if let Some(strategy) = report.strategy {
                    println!("strategy  {strategy:?}");
                }
                if let Some(ttl) = report.ttl_secs {
                    println!("ttl       {ttl}s");
                }
                println!("store     {}", report.store.as_deref().unwrap_or("-"));
            }
        }
        Ok(())
    }

    /// Runs the request through the strategies even if the worker has not
    /// been activated in this process.
    pub async fn fetch(
        &self, url: &str, method: &str, accept: Option<String>, data: Option<String>, show_body: bool,
    ) -> Result<()> {
        let mut request = build_request(self.worker.interceptor().classifier().origin(), url, method, accept)?;
        if let Some(data) = data {
            request = request.with_body(data);
        }

        let (class, source, response) = match self.worker.interceptor().handle(&request).await? {
            Disposition::Respond(served) => (Some(served.class), served.source, served.response),
            Disposition::Passthrough => (None, ResponseSource::Network, self.worker.network().fetch(&request).await?),
        };

        let report = FetchReport {
            url: request.url.to_string(),
            method: request.method.to_string(),
            class,
            source,
            status: response.status,
            status_text: response.status_text.clone(),
            content_type: response.content_type().map(str::to_string),
            body_bytes: response.body.len(),
            body: show_body.then(|| response.text()),
        };

        if self.format == OutputFormat::Json {
            return print_json(&report);
        }

        let class = report.class.map_or("passthrough", |c| c.as_str());
        println!("{} {} {} [{class}, {:?}]", report.status, report.status_text, report.url, report.source);
        if let Some(body) = &report.body {
            println!();
            println!("{body}");
        }
        Ok(())
    }
}
