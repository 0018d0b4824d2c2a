//! Test doubles for the worker modules.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use swcache_core::{Error, Request, Response};
use url::Url;

use crate::fetch::Fetcher;

/// Canned network: each URL either answers with a response or fails.
/// Unknown URLs fail like an unreachable host.
#[derive(Debug, Clone, Default)]
pub(crate) struct StubFetcher {
    routes: Arc<HashMap<String, Option<Response>>>,
    calls: Arc<AtomicUsize>,
}

impl StubFetcher {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn respond(mut self, url: &str, response: Response) -> Self {
        let response = response.with_url(url);
        Arc::make_mut(&mut self.routes).insert(url.to_string(), Some(response));
        self
    }

    pub(crate) fn fail(mut self, url: &str) -> Self {
        Arc::make_mut(&mut self.routes).insert(url.to_string(), None);
        self
    }

    /// Requests that reached the network so far.
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.routes.get(request.url.as_str()) {
            Some(Some(response)) => Ok(response.clone()),
            _ => Err(Error::Network(format!("network error: {} unreachable", request.url))),
        }
    }
}

pub(crate) fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

pub(crate) fn origin() -> Url {
    url("https://portfolio.example")
}

pub(crate) fn html(body: &str) -> Response {
    Response::new(200, body).with_header("Content-Type", "text/html; charset=utf-8")
}
