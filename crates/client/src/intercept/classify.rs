//! Request classification.
//!
//! Routing order:
//! 1. Non-network schemes are never intercepted.
//! 2. Cross-origin requests are intercepted only for trusted hosts.
//! 3. Any method other than GET is a mutation.
//! 4. GET requests take the first matching class: static markers, API
//!    markers, an HTML `Accept` header, then an image extension.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Method;
use swcache_core::{AppConfig, Error, ResourceClass};
use url::Url;

use crate::fetch::is_network_scheme;

static IMAGE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\.(jpg|jpeg|png|gif|webp|svg|ico)(\?.*)?$").expect("invalid image pattern")
});

/// Pure classifier over (URL, method, Accept).
#[derive(Debug, Clone)]
pub struct Classifier {
    origin: Url,
    trusted_hosts: Vec<String>,
    static_markers: Vec<String>,
    api_markers: Vec<String>,
}

impl Classifier {
    pub fn new(
        origin: Url, trusted_hosts: Vec<String>, static_markers: Vec<String>, api_markers: Vec<String>,
    ) -> Self {
        Self { origin, trusted_hosts, static_markers, api_markers }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        let origin = config.origin_url().map_err(|e| Error::InvalidUrl(e.to_string()))?;
        Ok(Self::new(
            origin,
            config.trusted_hosts.clone(),
            config.static_markers.clone(),
            config.api_markers.clone(),
        ))
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    /// Whether the request leaves the page through this layer at all.
    pub fn intercepts(&self, url: &Url) -> bool {
        if !is_network_scheme(url) {
            return false;
        }
        url.origin() == self.origin.origin()
            || url
                .host_str()
                .is_some_and(|host| self.trusted_hosts.iter().any(|t| t.eq_ignore_ascii_case(host)))
    }

    /// Class of the request, or `None` if it passes through untouched.
    pub fn classify(&self, method: &Method, url: &Url, accept: Option<&str>) -> Option<ResourceClass> {
        if !self.intercepts(url) {
            return None;
        }

        if *method != Method::GET {
            return Some(ResourceClass::Mutation);
        }

        let mut href = url.clone();
        href.set_fragment(None);
        let href = href.as_str();

        if self.static_markers.iter().any(|m| href.contains(m.as_str())) {
            Some(ResourceClass::Static)
        } else if self.api_markers.iter().any(|m| href.contains(m.as_str())) {
            Some(ResourceClass::Api)
        } else if accept.is_some_and(|a| a.contains("text/html")) {
            Some(ResourceClass::Page)
        } else if IMAGE_PATTERN.is_match(href) {
            Some(ResourceClass::Image)
        } else {
            None
        }
    }
}
