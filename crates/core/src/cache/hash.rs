//! Request keys for cache stores.

use sha2::{Digest, Sha256};
use url::Url;

/// Identity of a cached request: method plus URL without its fragment.
///
/// Headers are deliberately not part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestKey {
    pub method: String,
    pub url: String,
    pub hash: String,
}

impl RequestKey {
    pub fn new(method: &str, url: &Url) -> Self {
        let mut url = url.clone();
        url.set_fragment(None);
        let method = method.to_ascii_uppercase();
        let hash = compute_cache_key(&method, url.as_str());
        Self { method, url: url.into(), hash }
    }

    /// Key for a plain GET, the form used by precache and fallback lookups.
    pub fn get(url: &Url) -> Self {
        Self::new("GET", url)
    }
}

/// SHA-256 hex digest over the method and URL.
pub fn compute_cache_key(method: &str, url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    hex::encode(hasher.finalize())
}

/// SHA-256 hex digest of an arbitrary body, used to detect script changes.
pub fn digest_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_hash_stability() {
        let a = RequestKey::get(&url("https://example.com/admin/"));
        let b = RequestKey::get(&url("https://example.com/admin/"));
        assert_eq!(a, b);
    }

    #[test]
    fn test_method_is_part_of_key() {
        let get = RequestKey::new("GET", &url("https://example.com/api/x"));
        let post = RequestKey::new("post", &url("https://example.com/api/x"));
        assert_ne!(get.hash, post.hash);
        assert_eq!(post.method, "POST");
    }

    #[test]
    fn test_fragment_ignored() {
        let a = RequestKey::get(&url("https://example.com/page#top"));
        let b = RequestKey::get(&url("https://example.com/page"));
        assert_eq!(a.hash, b.hash);
        assert_eq!(a.url, "https://example.com/page");
    }

    #[test]
    fn test_query_is_part_of_key() {
        let a = RequestKey::get(&url("https://example.com/api/?page=1"));
        let b = RequestKey::get(&url("https://example.com/api/?page=2"));
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn test_hash_format() {
        let key = RequestKey::get(&url("https://example.com"));
        assert_eq!(key.hash.len(), 64);
        assert!(key.hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest_bytes(b"sw").len(), 64);
    }
}
