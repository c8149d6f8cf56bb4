use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use tracing::{debug, trace};

use super::{EngineRequest, Transport, ensure_ok};
use crate::error::{Error, Result};

// 🔧 auth is tri-modal: username+password, api_key, or "I hope anonymous works" (it might, on localhost).
#[derive(Debug, Deserialize, Clone)]
pub struct ClusterConfig {
    /// 📡 Where the cluster lives. Scheme + host + port. Yes, all of it.
    #[serde(default)]
    pub url: String,
    /// 🔒 Username. The bouncer at the club. Except the club is a search index.
    #[serde(default)]
    pub username: Option<String>,
    /// 🔒 Password. "password123" is not a password. It is a confession.
    #[serde(default)]
    pub password: Option<String>,
    /// 🔒 API key, the velvet rope variant of authentication. Wins over basic auth.
    #[serde(default)]
    pub api_key: Option<String>,
    /// ⚠️ Skip TLS certificate verification. Handy for self-signed dev clusters, terrifying anywhere else.
    #[serde(default)]
    pub danger_accept_invalid_certs: bool,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_connect_timeout_secs() -> u64 {
    10
}

// -- bulk requests can be meaty and we're not monsters
fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: None,
            password: None,
            api_key: None,
            danger_accept_invalid_certs: false,
            connect_timeout_secs: default_connect_timeout_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// 📡 The reqwest-backed [`Transport`]. Pure I/O, zero buffering, zero retries.
///
/// Internally holds:
/// - `client`: the HTTP muscle 💪, reused across requests so connections pool
/// - `base_url`: the cluster root, validated once at construction
/// - `config`: auth bits
///
/// Construct it once, hand it (as `Arc<dyn Transport>`) to everything that needs to talk
/// to the cluster. No globals were harmed in the making of this struct.
#[derive(Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    config: ClusterConfig,
}

impl HttpTransport {
    /// 🚀 Build the client and validate the URL. No network call happens here.
    pub fn new(config: ClusterConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            return Err(Error::configuration(
                "cluster url is empty; set cluster.url, OSL_CLUSTER__URL or OPEN_SEARCH_ENDPOINT",
            ));
        }
        let base_url = Url::parse(config.url.trim()).map_err(|parse_error| {
            Error::configuration(format!(
                "cluster url '{}' is not a valid URL: {}",
                config.url, parse_error
            ))
        })?;

        // 🔧 connect timeout: if the cluster can't handshake in 10 seconds, it's not having a good time
        // -- and neither are we. request timeout covers the whole round trip.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .danger_accept_invalid_certs(config.danger_accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            base_url,
            config,
        })
    }

    /// 📡 Join the cluster root with a request path and its query parameters.
    ///
    /// trim_end_matches('/') is the "/" hygiene you didn't know you needed.
    /// Without it: `https://host//_bulk`. With it: `https://host/_bulk`.
    fn url_for(&self, request: &EngineRequest) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            request.path.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined).map_err(|parse_error| {
            Error::configuration(format!("request url '{}' is invalid: {}", joined, parse_error))
        })?;
        if !request.query.is_empty() {
            // -- percent-encoding happens here, the values themselves stay verbatim
            let mut pairs = url.query_pairs_mut();
            for (key, value) in &request.query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: EngineRequest) -> Result<String> {
        let url = self.url_for(&request)?;
        debug!(
            "📡 {} {} ({} bytes)",
            request.method,
            url.path(),
            request.body.as_ref().map(String::len).unwrap_or(0)
        );

        let mut builder = self.client.request(request.method.clone(), url);
        if let Some(content_type) = request.content_type {
            builder = builder.header("Content-Type", content_type);
        }

        // -- 🔒 api_key beats basic auth in this club. This is not a democracy.
        if let Some(api_key) = self.config.api_key.as_deref().filter(|key| !key.is_empty()) {
            builder = builder.header("Authorization", format!("ApiKey {}", api_key));
        } else if let Some(ref username) = self.config.username {
            builder = builder.basic_auth(username, self.config.password.as_ref());
        }

        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        // -- the body is fetched either way: on success it's the answer, on failure it's the
        // -- postmortem. Elasticsearch error bodies are poetry. Dark poetry.
        let body = response.text().await?;
        trace!("📬 status {} with {} bytes of body", status, body.len());

        ensure_ok(status, body)
    }
}
