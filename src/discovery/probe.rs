use crate::http::HttpClient;
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

const DETECTION_QUERY: &str = "{ __typename }";

/// Outcome of testing one candidate path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub candidate: String,
    pub matched: bool,
    pub resolved_url: Option<String>,
}

impl ProbeResult {
    pub fn miss(candidate: &str) -> Self {
        Self {
            candidate: candidate.to_string(),
            matched: false,
            resolved_url: None,
        }
    }

    pub fn hit(candidate: &str, url: String) -> Self {
        Self {
            candidate: candidate.to_string(),
            matched: true,
            resolved_url: Some(url),
        }
    }
}

#[async_trait]
pub trait Prober: Send + Sync {
    /// Test `candidate` under `base_url`. Must return promptly once `cancel`
    /// fires; a cancelled probe reports a miss.
    async fn probe(&self, base_url: &str, candidate: &str, cancel: &CancellationToken)
        -> ProbeResult;
}

/// Join a base URL and a candidate path without doubling the slash. An empty
/// candidate leaves the URL exactly as given.
pub fn join_url(base_url: &str, candidate: &str) -> String {
    if candidate.is_empty() {
        return base_url.to_string();
    }
    format!("{}{}", base_url.trim_end_matches('/'), candidate)
}

pub struct HttpProber {
    client: HttpClient,
    timeout: Duration,
}

impl HttpProber {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            timeout: PROBE_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(
        &self,
        base_url: &str,
        candidate: &str,
        cancel: &CancellationToken,
    ) -> ProbeResult {
        let target = join_url(base_url, candidate);

        let response = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::trace!(url = %target, "probe cancelled");
                return ProbeResult::miss(candidate);
            }
            response = self.client.post_graphql(&target, DETECTION_QUERY, self.timeout) => response,
        };

        match response {
            Ok(resp) if resp.looks_like_graphql() => ProbeResult::hit(candidate, target),
            Ok(resp) => {
                tracing::debug!(url = %target, status = resp.status, "not a graphql endpoint");
                ProbeResult::miss(candidate)
            }
            Err(e) => {
                tracing::debug!(url = %target, error = %e, "probe failed");
                ProbeResult::miss(candidate)
            }
        }
    }
}
