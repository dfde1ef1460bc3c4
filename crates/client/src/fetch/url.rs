//! URL resolution for intercepted requests, manifest entries and fallbacks.

use url::{ParseError, Url};

/// Error type for URL resolution failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("unsupported scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Resolve a request URL the way a page would.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Absolute URLs keep their scheme, whatever it is
/// 3. Anything else is resolved against `origin`
/// 4. Lowercase the host
/// 5. Remove fragment (#...)
/// 6. Keep query string intact (do not reorder)
pub fn resolve(origin: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = match Url::parse(trimmed) {
        Ok(url) => url,
        Err(ParseError::RelativeUrlWithoutBase) => {
            origin.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?
        }
        Err(e) => return Err(UrlError::InvalidUrl(e.to_string())),
    };

    if let Some(host) = parsed.host_str()
        && host.chars().any(|c| c.is_ascii_uppercase())
    {
        let lowered = host.to_lowercase();
        parsed
            .set_host(Some(&lowered))
            .map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    }

    parsed.set_fragment(None);

    Ok(parsed)
}

/// Like [`resolve`], but only http(s) results are accepted.
pub fn resolve_http(origin: &Url, input: &str) -> Result<Url, UrlError> {
    let url = resolve(origin, input)?;
    if !is_network_scheme(&url) {
        return Err(UrlError::UnsupportedScheme(url.scheme().to_string()));
    }
    Ok(url)
}

/// Whether the URL travels over the network at all.
pub fn is_network_scheme(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
}
