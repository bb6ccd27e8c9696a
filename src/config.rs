use crate::auth::Credential;
use crate::discovery::{CandidateSource, DEFAULT_CONCURRENCY, PROBE_TIMEOUT};
use crate::error::{ProbeError, Result};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_OUTPUT: &str = "schema_dump.json";

/// Everything one run needs, resolved from the command line.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub target: String,
    pub output: PathBuf,
    pub credential: Credential,
    pub candidates: CandidateSource,
    pub concurrency: usize,
    pub probe_timeout: Duration,
    /// Treat the target as the endpoint and skip discovery entirely.
    pub skip_discovery: bool,
    pub headers: HashMap<String, String>,
    pub proxy: Option<String>,
}

impl ScanConfig {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            output: PathBuf::from(DEFAULT_OUTPUT),
            credential: Credential::None,
            candidates: CandidateSource::BuiltIn,
            concurrency: DEFAULT_CONCURRENCY,
            probe_timeout: PROBE_TIMEOUT,
            skip_discovery: false,
            headers: HashMap::new(),
            proxy: None,
        }
    }

    /// The target must be an absolute http(s) URL.
    pub fn target_url(&self) -> Result<Url> {
        let url = Url::parse(&self.target)?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ProbeError::InvalidTarget(format!(
                "unsupported scheme '{}' in {}",
                other, self.target
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ScanConfig::new("http://x/api");
        assert_eq!(config.output, PathBuf::from("schema_dump.json"));
        assert_eq!(config.concurrency, 10);
        assert_eq!(config.probe_timeout, Duration::from_secs(5));
        assert_eq!(config.candidates, CandidateSource::BuiltIn);
        assert!(!config.credential.is_configured());
    }

    #[test]
    fn test_target_url_validation() {
        assert!(ScanConfig::new("https://example.com/api").target_url().is_ok());
        assert!(ScanConfig::new("example.com").target_url().is_err());
        assert!(ScanConfig::new("ftp://example.com").target_url().is_err());
    }
}
