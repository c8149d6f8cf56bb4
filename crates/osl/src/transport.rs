//! 🔌 Transport: where the real I/O happens.
//!
//! 🚰 Every request to the search engine funnels through one trait: [`Transport`].
//! The bulk loader, the settings controller, the query client, the lifecycle helpers:
//! none of them know about sockets. They build an [`EngineRequest`], hand it over,
//! and get back a body string or an [`Error`]. Ignorance is a feature. It's called "abstraction."
//!
//! 🧠 Knowledge graph:
//! - `http::HttpTransport`: reqwest-backed, the one that actually leaves the process.
//! - `in_mem::InMemoryTransport`: records requests, replays scripted answers. For tests and dry runs.
//! - [`ensure_ok`]: the one place the 200-or-error rule lives. 200 is success. Everything else,
//!   201 included, is a [`Error::Server`] carrying status + body verbatim.
//!
//! 🦆 The duck is here because every file must have one. This is law.

pub mod http;
pub mod in_mem;

pub use http::{ClusterConfig, HttpTransport};
pub use in_mem::InMemoryTransport;

use async_trait::async_trait;
use reqwest::Method;

use crate::error::{Error, Result};

/// 📡 The NDJSON content type the `_bulk` endpoint insists on. The x- prefix means
/// "we made this up but we're committing to it."
pub const NDJSON_CONTENT_TYPE: &str = "application/x-ndjson";

/// 📦 Plain old JSON, for settings updates and index creation.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// ✉️ One request to the search engine, before any transport gets its hands on it.
///
/// `path` is relative to the cluster root (`/_bulk`, `/go-test-1/_settings`).
/// `query` keeps insertion order so tests can assert on it verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub content_type: Option<&'static str>,
    pub body: Option<String>,
}

impl EngineRequest {
    /// 🏗️ Bare request, no body, no query.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            content_type: None,
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// 🔎 Append one query parameter. Order is preserved.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// 📦 Attach a JSON body.
    pub fn with_json(mut self, body: impl Into<String>) -> Self {
        self.content_type = Some(JSON_CONTENT_TYPE);
        self.body = Some(body.into());
        self
    }

    /// 📡 Attach an NDJSON body. `_bulk` or bust.
    pub fn with_ndjson(mut self, body: impl Into<String>) -> Self {
        self.content_type = Some(NDJSON_CONTENT_TYPE);
        self.body = Some(body.into());
        self
    }

    /// 🔎 First value for `key`, if any. Mostly here so tests read nicely.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// 🚰 Something that can carry an [`EngineRequest`] to the search engine and bring back the body.
///
/// # Contract
/// - Returns `Ok(body)` only for HTTP 200.
/// - Non-200 becomes [`Error::Server`] with status and the raw body.
/// - Network trouble becomes [`Error::Transport`]. No retries. Retries are the caller's problem.
#[async_trait]
pub trait Transport: std::fmt::Debug + Send + Sync {
    async fn execute(&self, request: EngineRequest) -> Result<String>;
}

/// ✅ The 200-or-error rule, in one place.
pub fn ensure_ok(status: u16, body: String) -> Result<String> {
    if status == 200 {
        Ok(body)
    } else {
        Err(Error::Server { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_only_a_200_counts_as_success() {
        assert_eq!(ensure_ok(200, "ok".to_string()).ok(), Some("ok".to_string()));

        // 🎯 201 is polite, but it's not 200. The rule is the rule.
        match ensure_ok(201, "created".to_string()) {
            Err(Error::Server { status, body }) => {
                assert_eq!(status, 201);
                assert_eq!(body, "created");
            }
            honestly_who_knows => panic!("💀 expected a server error, got {honestly_who_knows:?}"),
        }
    }

    #[test]
    fn the_one_where_the_builder_remembers_everything() {
        let the_request = EngineRequest::get("/go-test-1/_search")
            .with_query("q", "Age:[10 TO 20]")
            .with_query("size", "3");

        assert_eq!(the_request.method, Method::GET);
        assert_eq!(the_request.query_value("q"), Some("Age:[10 TO 20]"));
        assert_eq!(the_request.query_value("size"), Some("3"));
        assert_eq!(the_request.query_value("sort"), None);
        assert!(the_request.body.is_none());

        let the_bulk = EngineRequest::post("/_bulk").with_ndjson("a\nb\n");
        assert_eq!(the_bulk.content_type, Some(NDJSON_CONTENT_TYPE));
        assert_eq!(the_bulk.body.as_deref(), Some("a\nb\n"));
    }
}
