//! Cache key generation for request descriptors.

use sha2::{Digest, Sha256};
use url::Url;

/// Compute the key a request is stored under.
///
/// The method is upper-cased and the URL fragment dropped, so `get` and `GET`
/// or `/about#team` and `/about` address the same entry.
pub fn compute_cache_key(method: &str, url: &Url) -> String {
    let mut url = url.clone();
    url.set_fragment(None);

    let mut hasher = Sha256::new();
    hasher.update(method.to_ascii_uppercase().as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_str().as_bytes());
    hex::encode(hasher.finalize())
}

/// Check that `key` looks like a key produced by [`compute_cache_key`].
pub fn is_valid_key(key: &str) -> bool {
    key.len() == 64 && key.chars().all(|c| c.is_ascii_hexdigit())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_hash_stability() {
        let hash1 = compute_cache_key("GET", &url("https://example.com/"));
        let hash2 = compute_cache_key("GET", &url("https://example.com/"));
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn test_hash_method_case_insensitive() {
        assert_eq!(
            compute_cache_key("get", &url("https://example.com/a")),
            compute_cache_key("GET", &url("https://example.com/a"))
        );
    }

    #[test]
    fn test_hash_different_method() {
        assert_ne!(
            compute_cache_key("GET", &url("https://example.com/a")),
            compute_cache_key("HEAD", &url("https://example.com/a"))
        );
    }

    #[test]
    fn test_hash_ignores_fragment_keeps_query() {
        let base = compute_cache_key("GET", &url("https://example.com/about"));
        assert_eq!(base, compute_cache_key("GET", &url("https://example.com/about#team")));
        assert_ne!(base, compute_cache_key("GET", &url("https://example.com/about?tab=team")));
    }

    #[test]
    fn test_hash_format() {
        let hash = compute_cache_key("GET", &url("https://example.com"));
        assert!(is_valid_key(&hash));
        assert!(!is_valid_key("xyz"));
    }
}
