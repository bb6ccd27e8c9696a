use crate::auth::Credential;
use crate::error::{ProbeError, Result};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, COOKIE};
use reqwest::{Client, Proxy};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;

const DEFAULT_TIMEOUT: u64 = 30;

const USER_AGENT: &str = concat!("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36");

#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    headers: HashMap<String, String>,
    credential: Credential,
}

impl HttpClient {
    pub fn new(proxy: Option<&str>, headers: HashMap<String, String>) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT))
            .danger_accept_invalid_certs(true)
            .user_agent(USER_AGENT);

        if let Some(proxy_url) = proxy {
            let proxy = Proxy::all(proxy_url)
                .map_err(|e| ProbeError::Client(format!("invalid proxy URL {}: {}", proxy_url, e)))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| ProbeError::Client(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            headers,
            credential: Credential::None,
        })
    }

    /// Attach credential material to every request sent by this client.
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = credential;
        self
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// JSON defaults, then user headers, then credential material. Later
    /// layers replace earlier ones with the same (case-insensitive) name.
    fn request_headers(&self) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        map.insert(ACCEPT, HeaderValue::from_static("application/json"));

        for (key, value) in self.credential.headers(&self.headers) {
            match (
                HeaderName::from_bytes(key.as_bytes()),
                HeaderValue::from_str(&value),
            ) {
                (Ok(name), Ok(value)) => {
                    map.insert(name, value);
                }
                _ => tracing::warn!(header = %key, "skipping invalid header"),
            }
        }

        let cookies = self.credential.cookies();
        if !cookies.is_empty() {
            match HeaderValue::from_str(&cookies.header_value()) {
                Ok(value) => {
                    map.insert(COOKIE, value);
                }
                Err(_) => tracing::warn!("skipping cookie header with invalid characters"),
            }
        }

        map
    }

    /// POST `{"query": ...}` to `url` with a hard per-call timeout.
    ///
    /// Only transport failures are errors. Any HTTP status comes back as a
    /// response, with the body kept raw so callers can decide how strict to be
    /// about parsing it.
    pub async fn post_graphql(
        &self,
        url: &str,
        query: &str,
        timeout: Duration,
    ) -> Result<GraphQLResponse> {
        let body = json!({ "query": query });

        let response = self
            .client
            .post(url)
            .headers(self.request_headers())
            .timeout(timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let raw = response.text().await?;

        tracing::trace!(url, status, bytes = raw.len(), "graphql response");

        Ok(GraphQLResponse::new(status, raw))
    }
}

#[derive(Debug, Clone)]
pub struct GraphQLResponse {
    pub status: u16,
    pub raw: String,
    pub body: Option<Value>,
}

impl GraphQLResponse {
    pub fn new(status: u16, raw: String) -> Self {
        let body = serde_json::from_str(&raw).ok();
        Self { status, raw, body }
    }

    pub fn has_data(&self) -> bool {
        self.get_data().is_some()
    }

    pub fn has_errors(&self) -> bool {
        self.get_errors().is_some()
    }

    pub fn get_data(&self) -> Option<&Value> {
        self.body.as_ref()?.get("data")
    }

    pub fn get_errors(&self) -> Option<&Value> {
        self.body.as_ref()?.get("errors")
    }

    /// 200 with a JSON object carrying a top-level `data` or `errors` key.
    pub fn looks_like_graphql(&self) -> bool {
        self.status == 200 && (self.has_data() || self.has_errors())
    }

    pub fn is_auth_denied(&self) -> bool {
        matches!(self.status, 401 | 403)
    }
}
