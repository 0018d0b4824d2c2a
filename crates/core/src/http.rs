//! Request and response model shared by the cache and the fetch pipeline.
//!
//! These types mirror the parts of the Fetch API the cache policy cares about:
//! request method, URL and mode on the way in, and status, headers, body and
//! response type on the way out.

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

/// Request mode as reported by the page that issued the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum RequestMode {
    /// Full-page navigation.
    Navigate,
    SameOrigin,
    #[default]
    Cors,
    NoCors,
}

impl RequestMode {
    pub fn is_navigation(self) -> bool {
        matches!(self, RequestMode::Navigate)
    }
}

/// Outgoing request as seen by the interceptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub url: Url,
    pub mode: RequestMode,
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// A plain `GET` sub-resource request.
    pub fn get(url: Url) -> Self {
        Self { method: "GET".into(), url, mode: RequestMode::Cors, headers: Vec::new() }
    }

    /// A `GET` navigation request.
    pub fn navigate(url: Url) -> Self {
        Self { mode: RequestMode::Navigate, ..Self::get(url) }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }

    /// Whether scheme, host and port match `origin`.
    pub fn is_same_origin(&self, origin: &Url) -> bool {
        self.url.origin() == origin.origin()
    }
}

/// Classification of a network response, following the Fetch API names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseType {
    /// Direct same-origin response.
    #[default]
    Basic,
    Cors,
    Opaque,
    OpaqueRedirect,
    Error,
}

impl ResponseType {
    pub fn as_str(self) -> &'static str {
        match self {
            ResponseType::Basic => "basic",
            ResponseType::Cors => "cors",
            ResponseType::Opaque => "opaque",
            ResponseType::OpaqueRedirect => "opaque-redirect",
            ResponseType::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "basic" => Some(ResponseType::Basic),
            "cors" => Some(ResponseType::Cors),
            "opaque" => Some(ResponseType::Opaque),
            "opaque-redirect" => Some(ResponseType::OpaqueRedirect),
            "error" => Some(ResponseType::Error),
            _ => None,
        }
    }
}

impl fmt::Display for ResponseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A response as handed back to the page, and the value stored in a cache.
///
/// Cloning produces the independent copy that goes into the store while the
/// original is returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct Response {
    /// URL the response was produced for. `None` for synthetic responses.
    pub url: Option<String>,
    pub status: u16,
    pub status_text: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub response_type: ResponseType,
    pub redirected: bool,
}

impl Response {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            url: None,
            status,
            status_text: default_status_text(status).to_string(),
            headers: Vec::new(),
            body: body.into(),
            response_type: ResponseType::Basic,
            redirected: false,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = text.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_type(mut self, response_type: ResponseType) -> Self {
        self.response_type = response_type;
        self
    }

    pub fn with_redirected(mut self, redirected: bool) -> Self {
        self.redirected = redirected;
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Exactly 200, basic, and not the product of a redirect.
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.response_type == ResponseType::Basic && !self.redirected
    }
}

fn default_status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        201 => "Created",
        204 => "No Content",
        301 => "Moved Permanently",
        302 => "Found",
        304 => "Not Modified",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        _ => "",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_same_origin_ignores_path_and_query() {
        let origin = url("https://portfolio.example");
        assert!(Request::get(url("https://portfolio.example/css/site.css?v=2")).is_same_origin(&origin));
    }

    #[test]
    fn test_same_origin_checks_scheme_and_port() {
        let origin = url("https://portfolio.example");
        assert!(!Request::get(url("http://portfolio.example/")).is_same_origin(&origin));
        assert!(!Request::get(url("https://portfolio.example:8443/")).is_same_origin(&origin));
        assert!(!Request::get(url("https://fonts.googleapis.com/css")).is_same_origin(&origin));
    }

    #[test]
    fn test_is_get_case_insensitive() {
        let req = Request::get(url("https://portfolio.example/")).with_method("get");
        assert!(req.is_get());
        assert!(!req.with_method("POST").is_get());
    }

    #[test]
    fn test_cacheable_requires_200_basic_direct() {
        assert!(Response::new(200, "ok").is_cacheable());
        assert!(!Response::new(204, "").is_cacheable());
        assert!(!Response::new(404, "missing").is_cacheable());
        assert!(!Response::new(200, "ok").with_type(ResponseType::Opaque).is_cacheable());
        assert!(!Response::new(200, "ok").with_type(ResponseType::Cors).is_cacheable());
        assert!(!Response::new(200, "ok").with_redirected(true).is_cacheable());
    }

    #[test]
    fn test_header_lookup_case_insensitive() {
        let resp = Response::new(200, "x").with_header("Content-Type", "text/css");
        assert_eq!(resp.header("content-type"), Some("text/css"));
        assert_eq!(resp.header("etag"), None);
    }

    #[test]
    fn test_response_type_parse() {
        assert_eq!(ResponseType::parse("opaque-redirect"), Some(ResponseType::OpaqueRedirect));
        assert_eq!(ResponseType::parse("Basic"), None);
    }
}
