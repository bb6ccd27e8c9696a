use crate::http::HttpClient;
use serde::Serialize;
use std::time::Duration;

pub const AUTH_TIMEOUT: Duration = Duration::from_secs(10);

const PROBE_QUERY: &str = "{ __typename }";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthReason {
    Ok,
    Unauthorized,
    Forbidden,
    Unexpected,
    NetworkError,
}

impl std::fmt::Display for AuthReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthReason::Ok => write!(f, "OK"),
            AuthReason::Unauthorized => write!(f, "UNAUTHORIZED"),
            AuthReason::Forbidden => write!(f, "FORBIDDEN"),
            AuthReason::Unexpected => write!(f, "UNEXPECTED"),
            AuthReason::NetworkError => write!(f, "NETWORK_ERROR"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthOutcome {
    pub valid: bool,
    pub reason: AuthReason,
    /// `false` when no credential was configured and nothing was sent.
    pub tested: bool,
    pub status: Option<u16>,
    pub detail: String,
}

impl AuthOutcome {
    fn skipped() -> Self {
        Self {
            valid: true,
            reason: AuthReason::Ok,
            tested: false,
            status: None,
            detail: "No authentication provided (testing unauthenticated endpoint)".to_string(),
        }
    }

    fn network_error(err: impl std::fmt::Display) -> Self {
        Self {
            valid: false,
            reason: AuthReason::NetworkError,
            tested: true,
            status: None,
            detail: format!("Connection error: {}", err),
        }
    }

    fn classify(status: u16, graphql_shaped: bool) -> Self {
        let (reason, detail) = match status {
            401 => (
                AuthReason::Unauthorized,
                "Invalid or expired credentials (401 Unauthorized)".to_string(),
            ),
            403 => (
                AuthReason::Forbidden,
                "Valid credentials but insufficient permissions (403 Forbidden)".to_string(),
            ),
            200 if graphql_shaped => (AuthReason::Ok, "Authentication successful".to_string()),
            other => (
                AuthReason::Unexpected,
                format!("Unexpected response (Status: {})", other),
            ),
        };

        Self {
            valid: reason == AuthReason::Ok,
            reason,
            tested: true,
            status: Some(status),
            detail,
        }
    }
}

/// Check the client's credential against `url` with a minimal query.
pub async fn validate_against(client: &HttpClient, url: &str) -> AuthOutcome {
    if !client.credential().is_configured() {
        return AuthOutcome::skipped();
    }

    tracing::debug!(url, kind = client.credential().kind(), "validating credentials");

    match client.post_graphql(url, PROBE_QUERY, AUTH_TIMEOUT).await {
        Ok(response) => AuthOutcome::classify(response.status, response.looks_like_graphql()),
        Err(e) => AuthOutcome::network_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status_codes() {
        assert_eq!(AuthOutcome::classify(401, true).reason, AuthReason::Unauthorized);
        assert_eq!(AuthOutcome::classify(403, false).reason, AuthReason::Forbidden);
        assert_eq!(AuthOutcome::classify(200, true).reason, AuthReason::Ok);
        assert_eq!(AuthOutcome::classify(200, false).reason, AuthReason::Unexpected);
        assert_eq!(AuthOutcome::classify(302, false).reason, AuthReason::Unexpected);
    }

    #[test]
    fn test_only_ok_is_valid() {
        assert!(AuthOutcome::classify(200, true).valid);
        assert!(!AuthOutcome::classify(401, true).valid);
        assert!(!AuthOutcome::network_error("refused").valid);
    }

    #[test]
    fn test_skipped_is_vacuously_ok() {
        let outcome = AuthOutcome::skipped();
        assert!(outcome.valid);
        assert!(!outcome.tested);
        assert_eq!(outcome.reason, AuthReason::Ok);
    }
}
