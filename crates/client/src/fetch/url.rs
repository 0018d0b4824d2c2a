//! URL handling for request interception and manifest resolution.

use url::Url;

/// Error type for URL parsing failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum UrlError {
    #[error("empty URL")]
    Empty,

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

/// Parse a request or manifest URL, resolving relative input against `base`.
///
/// Normalization steps:
/// 1. Trim leading/trailing whitespace
/// 2. Resolve relative paths (`/css/site.css`) against `base`
/// 3. Remove fragment (#...)
/// 4. Keep query string intact (do not reorder)
///
/// Absolute URLs of any scheme are accepted; deciding whether a scheme is
/// intercepted is the caller's job.
pub fn resolve(base: &Url, input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim();

    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let mut parsed = base.join(trimmed).map_err(|e| UrlError::InvalidUrl(e.to_string()))?;
    parsed.set_fragment(None);

    Ok(parsed)
}

/// Whether the URL uses one of the `ignored` schemes (compared case-insensitively).
pub fn is_ignored_scheme(url: &Url, ignored: &[String]) -> bool {
    ignored.iter().any(|scheme| scheme.eq_ignore_ascii_case(url.scheme()))
}

/// Whether two URLs address the same document, ignoring fragments.
pub fn same_document(a: &Url, b: &Url) -> bool {
    let mut a = a.clone();
    let mut b = b.clone();
    a.set_fragment(None);
    b.set_fragment(None);
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://portfolio.example/").unwrap()
    }

    #[test]
    fn test_resolve_relative_path() {
        let url = resolve(&base(), "/css/style.css").unwrap();
        assert_eq!(url.as_str(), "https://portfolio.example/css/style.css");
    }

    #[test]
    fn test_resolve_absolute_cdn() {
        let url = resolve(&base(), "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/6.4.0/css/all.min.css").unwrap();
        assert_eq!(url.host_str(), Some("cdnjs.cloudflare.com"));
    }

    #[test]
    fn test_resolve_remove_fragment_keep_query() {
        let url = resolve(&base(), "/projects?tag=rust#top").unwrap();
        assert_eq!(url.fragment(), None);
        assert_eq!(url.query(), Some("tag=rust"));
    }

    #[test]
    fn test_resolve_trim_whitespace() {
        let url = resolve(&base(), "  /index.html  ").unwrap();
        assert_eq!(url.path(), "/index.html");
    }

    #[test]
    fn test_resolve_empty() {
        assert!(matches!(resolve(&base(), ""), Err(UrlError::Empty)));
        assert!(matches!(resolve(&base(), "   "), Err(UrlError::Empty)));
    }

    #[test]
    fn test_resolve_keeps_extension_scheme() {
        let url = resolve(&base(), "chrome-extension://abcdef/content.js").unwrap();
        assert_eq!(url.scheme(), "chrome-extension");
    }

    #[test]
    fn test_is_ignored_scheme() {
        let ignored = vec!["chrome-extension".to_string(), "moz-extension".to_string()];
        let ext = Url::parse("chrome-extension://abcdef/content.js").unwrap();
        let moz = Url::parse("MOZ-EXTENSION://abcdef/content.js").unwrap();
        assert!(is_ignored_scheme(&ext, &ignored));
        assert!(is_ignored_scheme(&moz, &ignored));
        assert!(!is_ignored_scheme(&base(), &ignored));
    }

    #[test]
    fn test_same_document() {
        let a = Url::parse("https://portfolio.example/about#team").unwrap();
        let b = Url::parse("https://portfolio.example/about").unwrap();
        let c = Url::parse("https://portfolio.example/about?x=1").unwrap();
        assert!(same_document(&a, &b));
        assert!(!same_document(&b, &c));
    }
}
