//! 🔎 QueryClient: one filtered, sorted, size-capped search. One request. No retries, no paging.
//!
//! 🧠 Knowledge graph:
//! - `filter` is Lucene query-string syntax (`Age:[10 TO 20]`, `Email:*.com`), sent as `q`.
//! - `sort` is `<field>:<asc|desc>`, comma-joined when there's more than one key.
//! - `bypass_request_cache` sends `request_cache=false`, so results reflect writes that just
//!   landed instead of a cached answer from before the bulk load.
//! - The response body comes back exactly as the engine sent it (pretty-printed, we ask nicely).

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::transport::{EngineRequest, Transport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("asc"),
            SortOrder::Desc => f.write_str("desc"),
        }
    }
}

/// 🔀 One sort key: a field and a direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub order: SortOrder,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Asc,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Desc,
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.order)
    }
}

impl FromStr for SortKey {
    type Err = Error;

    /// 🔧 `"Age:asc"` → `SortKey::asc("Age")`. The direction is not optional.
    fn from_str(raw: &str) -> Result<Self> {
        let (field, order) = raw.rsplit_once(':').ok_or_else(|| {
            Error::configuration(format!("sort key '{}' must look like <field>:<asc|desc>", raw))
        })?;
        if field.trim().is_empty() {
            return Err(Error::configuration(format!("sort key '{}' has no field", raw)));
        }
        let order = match order.trim().to_ascii_lowercase().as_str() {
            "asc" => SortOrder::Asc,
            "desc" => SortOrder::Desc,
            other => {
                return Err(Error::configuration(format!(
                    "sort key '{}' has order '{}', expected asc or desc",
                    raw, other
                )));
            }
        };
        Ok(Self {
            field: field.trim().to_string(),
            order,
        })
    }
}

/// 📜 Everything one search needs. Built once, read many, never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    filter: String,
    sort: Vec<SortKey>,
    size: usize,
    bypass_request_cache: bool,
}

impl QuerySpec {
    pub fn new(
        filter: impl Into<String>,
        sort: Vec<SortKey>,
        size: usize,
        bypass_request_cache: bool,
    ) -> Self {
        Self {
            filter: filter.into(),
            sort,
            size,
            bypass_request_cache,
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn sort(&self) -> &[SortKey] {
        &self.sort
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn bypass_request_cache(&self) -> bool {
        self.bypass_request_cache
    }

    /// 📡 The one request this search turns into.
    pub fn to_request(&self, index: &str) -> EngineRequest {
        let mut request = EngineRequest::get(format!("/{}/_search", index));
        if !self.filter.is_empty() {
            request = request.with_query("q", self.filter.as_str());
        }
        if !self.sort.is_empty() {
            let sort = self
                .sort
                .iter()
                .map(SortKey::to_string)
                .collect::<Vec<_>>()
                .join(",");
            request = request.with_query("sort", sort);
        }
        request = request.with_query("size", self.size.to_string());
        if self.bypass_request_cache {
            request = request.with_query("request_cache", "false");
        }
        request.with_query("pretty", "true")
    }
}

#[derive(Debug, Clone)]
pub struct QueryClient {
    transport: Arc<dyn Transport>,
}

impl QueryClient {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// 🔎 Run the search, hand back the raw body. Non-200 → [`Error::Server`] with status + body.
    pub async fn search(&self, index: &str, spec: &QuerySpec) -> Result<String> {
        let request = spec.to_request(index);
        debug!("🔎 searching '{}' with {:?}", index, request.query);
        self.transport.execute(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{ClusterConfig, HttpTransport, InMemoryTransport};
    use reqwest::Method;
    use wiremock::matchers::{method, path, query_param, query_param_is_missing};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn the_age_spec() -> QuerySpec {
        QuerySpec::new("Age:[10 TO 20]", vec![SortKey::asc("Age")], 3, true)
    }

    #[tokio::test]
    async fn the_one_where_one_spec_makes_exactly_one_request() -> Result<()> {
        let transport = InMemoryTransport::new();
        transport.script("_search", 200, "{\n  \"hits\" : { }\n}").await;
        let client = QueryClient::new(Arc::new(transport.clone()));

        let body = client.search("go-test-1", &the_age_spec()).await?;

        // 🎯 body comes back byte for byte, pretty-printing and all
        assert_eq!(body, "{\n  \"hits\" : { }\n}");
        let the_requests = transport.requests().await;
        assert_eq!(the_requests.len(), 1);
        let the_request = &the_requests[0];
        assert_eq!(the_request.method, Method::GET);
        assert_eq!(the_request.path, "/go-test-1/_search");
        assert_eq!(the_request.query_value("q"), Some("Age:[10 TO 20]"));
        assert_eq!(the_request.query_value("sort"), Some("Age:asc"));
        assert_eq!(the_request.query_value("size"), Some("3"));
        assert_eq!(the_request.query_value("request_cache"), Some("false"));
        assert_eq!(the_request.query_value("pretty"), Some("true"));
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_wire_sees_the_same_four_params() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/go-test-1/_search"))
            .and(query_param("q", "Age:[10 TO 20]"))
            .and(query_param("sort", "Age:asc"))
            .and(query_param("size", "3"))
            .and(query_param("request_cache", "false"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"took\":1}"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(ClusterConfig {
            url: server.uri(),
            ..ClusterConfig::default()
        })?;
        let body = QueryClient::new(Arc::new(transport))
            .search("go-test-1", &the_age_spec())
            .await?;
        assert_eq!(body, "{\"took\":1}");
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_the_cache_is_allowed_to_answer() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/people/_search"))
            .and(query_param_is_missing("request_cache"))
            .and(query_param_is_missing("q"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(ClusterConfig {
            url: server.uri(),
            ..ClusterConfig::default()
        })?;
        let spec = QuerySpec::new("", vec![], 10, false);
        QueryClient::new(Arc::new(transport)).search("people", &spec).await?;
        Ok(())
    }

    #[tokio::test]
    async fn the_one_where_a_non_200_comes_back_with_its_receipts() {
        let transport = InMemoryTransport::new();
        transport
            .script("_search", 400, "{\"error\":\"query_shard_exception\"}")
            .await;

        let result = QueryClient::new(Arc::new(transport))
            .search("go-test-1", &the_age_spec())
            .await;

        match result {
            Err(Error::Server { status, body }) => {
                assert_eq!(status, 400);
                assert_eq!(body, "{\"error\":\"query_shard_exception\"}");
            }
            honestly_who_knows => panic!("💀 expected a server error, got {honestly_who_knows:?}"),
        }
    }

    #[test]
    fn the_one_where_sort_keys_parse_or_complain() -> Result<()> {
        assert_eq!("Age:asc".parse::<SortKey>()?, SortKey::asc("Age"));
        assert_eq!("Height:DESC".parse::<SortKey>()?, SortKey::desc("Height"));
        assert_eq!(SortKey::desc("Height").to_string(), "Height:desc");

        for nope in ["Age", "Age:sideways", ":asc", ""] {
            assert!(
                matches!(nope.parse::<SortKey>(), Err(Error::Configuration(_))),
                "'{nope}' should not parse"
            );
        }
        Ok(())
    }

    #[test]
    fn the_one_where_multiple_sort_keys_hold_hands() {
        let spec = QuerySpec::new(
            "Email:*.com",
            vec![SortKey::asc("Age"), SortKey::desc("Height")],
            0,
            false,
        );
        let the_request = spec.to_request("people");
        assert_eq!(the_request.query_value("sort"), Some("Age:asc,Height:desc"));
        assert_eq!(the_request.query_value("size"), Some("0"));
        assert_eq!(the_request.query_value("request_cache"), None);
    }
}
