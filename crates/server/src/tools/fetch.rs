//! sw_fetch tool implementation.
//!
//! Runs a request through the worker as if a controlled page had issued it.
//! Requests the worker does not intercept go straight to the network.

use std::collections::BTreeMap;

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::fetch::resolve;
use swcache_client::{Disposition, FetchRequest, Method, ResponseSource, ServiceWorker};
use swcache_core::{Error, ResourceClass};
use url::Url;

use super::json_result;

/// Input parameters for the sw_fetch tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the app origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default = "default_method")]
    pub method: String,

    /// Accept header. `text/html` marks a page navigation.
    #[serde(default)]
    pub accept: Option<String>,

    /// Additional request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Request body, forwarded for mutations.
    #[serde(default)]
    pub body: Option<String>,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for the sw_fetch tool.
#[derive(Debug, Clone, Serialize)]
pub struct SwFetchOutput {
    pub url: String,
    pub method: String,
    /// False when the worker let the request pass through.
    pub intercepted: bool,
    pub class: Option<ResourceClass>,
    pub source: ResponseSource,
    pub status: u16,
    pub status_text: String,
    pub headers: BTreeMap<String, String>,
    pub body: String,
    pub body_bytes: usize,
}

fn build_request(origin: &Url, params: SwFetchParams) -> Result<FetchRequest, Error> {
    if params.url.trim().is_empty() {
        return Err(Error::InvalidInput("url cannot be empty".into()));
    }

    let method = Method::from_bytes(params.method.trim().to_ascii_uppercase().as_bytes())
        .map_err(|_| Error::InvalidInput(format!("unsupported method: {}", params.method)))?;
    let url = resolve(origin, &params.url).map_err(|e| Error::InvalidUrl(e.to_string()))?;

    let mut request = FetchRequest::new(method, url);
    for (name, value) in params.headers {
        request = request.with_header(&name, value);
    }
    if let Some(accept) = params.accept {
        request = request.with_header("Accept", accept);
    }
    if let Some(body) = params.body {
        request = request.with_body(body);
    }
    Ok(request)
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(worker: &ServiceWorker, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(worker.interceptor().classifier().origin(), params)?;

    let (intercepted, class, source, response) = match worker.fetch(&request).await? {
        Disposition::Respond(served) => (true, Some(served.class), served.source, served.response),
        Disposition::Passthrough => {
            tracing::debug!(url = %request.url, "passthrough fetch");
            let response = worker.network().fetch(&request).await?;
            (false, None, ResponseSource::Network, response)
        }
    };

    let output = SwFetchOutput {
        url: request.url.to_string(),
        method: request.method.to_string(),
        intercepted,
        class,
        source,
        status: response.status,
        status_text: response.status_text.clone(),
        headers: response.headers.iter().cloned().collect(),
        body: response.text(),
        body_bytes: response.body.len(),
    };

    json_result(&output)
}
