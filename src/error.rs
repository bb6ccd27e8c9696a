use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProbeError>;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Authentication rejected during {stage} (HTTP {status})")]
    AuthDenied { stage: &'static str, status: u16 },

    #[error("Unexpected response during {stage} (HTTP {status})")]
    UnexpectedResponse { stage: &'static str, status: u16 },

    #[error("No GraphQL endpoint found")]
    NotFound,

    #[error("Failed to parse response body: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl From<reqwest::Error> for ProbeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProbeError::Transport(format!("request timed out: {}", err))
        } else {
            ProbeError::Transport(err.to_string())
        }
    }
}

impl ProbeError {
    /// Process exit status for a run that stopped on this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProbeError::NotFound => 2,
            ProbeError::AuthDenied { .. } => 3,
            ProbeError::Transport(_) => 4,
            ProbeError::Parse(_) | ProbeError::UnexpectedResponse { .. } => 5,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_per_fatal_kind() {
        let denied = ProbeError::AuthDenied { stage: "validation", status: 401 };
        let unexpected = ProbeError::UnexpectedResponse { stage: "schema dump", status: 500 };
        let parse = ProbeError::from(serde_json::from_str::<serde_json::Value>("{").unwrap_err());

        assert_eq!(ProbeError::NotFound.exit_code(), 2);
        assert_eq!(denied.exit_code(), 3);
        assert_eq!(ProbeError::Transport("refused".into()).exit_code(), 4);
        assert_eq!(unexpected.exit_code(), 5);
        assert_eq!(parse.exit_code(), 5);
        assert_eq!(ProbeError::Client("bad proxy".into()).exit_code(), 1);
    }

    #[test]
    fn test_auth_denied_message_carries_status() {
        let err = ProbeError::AuthDenied { stage: "capability check", status: 403 };
        assert_eq!(
            err.to_string(),
            "Authentication rejected during capability check (HTTP 403)"
        );
    }
}
