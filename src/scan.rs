use crate::auth::{validate_against, AuthOutcome, AuthReason, Credential};
use crate::config::ScanConfig;
use crate::discovery::{EndpointDiscovery, HttpProber, Prober};
use crate::error::{ProbeError, Result};
use crate::http::HttpClient;
use crate::schema::{IntrospectionSession, MutationFinding, SessionOutcome};
use serde::Serialize;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Progress hooks for a run. Every method defaults to doing nothing, so a
/// renderer only implements what it displays.
pub trait Reporter: Send + Sync {
    fn credential_configured(&self, _credential: &Credential) {}
    fn discovery_started(&self, _base_url: &str, _candidates: usize) {}
    fn discovery_finished(&self, _resolved: Option<&str>) {}
    fn endpoint_resolved(&self, _url: &str, _how: Resolution) {}
    fn auth_validated(&self, _outcome: &AuthOutcome) {}
    fn introspection_started(&self, _url: &str) {}
}

pub struct SilentReporter;

impl Reporter for SilentReporter {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Taken as given on the command line.
    Assumed,
    /// The target itself answered the probe.
    Direct,
    /// Found by racing the candidate paths.
    Discovered,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Introspection {
    Disabled,
    Enabled { schema_file: PathBuf, types: usize },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub target: String,
    pub endpoint: String,
    pub resolution: Resolution,
    pub auth: AuthOutcome,
    pub introspection: Introspection,
    pub mutations: Vec<MutationFinding>,
}

impl RunReport {
    pub fn sensitive_mutations(&self) -> impl Iterator<Item = &MutationFinding> {
        self.mutations.iter().filter(|m| m.sensitive)
    }
}

/// Discovery, credential validation, capability check, dump and mutation
/// extraction, strictly in that order. Every fatal condition is an `Err`.
pub async fn run(config: &ScanConfig, reporter: &dyn Reporter) -> Result<RunReport> {
    config.target_url()?;

    let client = HttpClient::new(config.proxy.as_deref(), config.headers.clone())?
        .with_credential(config.credential.clone());
    reporter.credential_configured(client.credential());

    let (endpoint, resolution) = resolve_endpoint(config, &client, reporter).await?;
    reporter.endpoint_resolved(&endpoint, resolution);

    let auth = validate_against(&client, &endpoint).await;
    reporter.auth_validated(&auth);
    if !auth.valid {
        return Err(auth_failure(&auth));
    }

    reporter.introspection_started(&endpoint);
    let session = IntrospectionSession::new(&client, endpoint.as_str());

    let (introspection, mutations) = match session.run(&config.output).await? {
        SessionOutcome::Disabled => (Introspection::Disabled, Vec::new()),
        SessionOutcome::Denied { stage, status } => {
            return Err(ProbeError::AuthDenied {
                stage: stage.label(),
                status,
            })
        }
        SessionOutcome::Dumped { document, findings } => (
            Introspection::Enabled {
                schema_file: config.output.clone(),
                types: document.type_count(),
            },
            findings,
        ),
    };

    Ok(RunReport {
        target: config.target.clone(),
        endpoint,
        resolution,
        auth,
        introspection,
        mutations,
    })
}

async fn resolve_endpoint(
    config: &ScanConfig,
    client: &HttpClient,
    reporter: &dyn Reporter,
) -> Result<(String, Resolution)> {
    if config.skip_discovery {
        return Ok((config.target.clone(), Resolution::Assumed));
    }

    let prober = HttpProber::new(client.clone()).with_timeout(config.probe_timeout);

    let direct = prober
        .probe(&config.target, "", &CancellationToken::new())
        .await;
    if let Some(url) = direct.resolved_url.filter(|_| direct.matched) {
        return Ok((url, Resolution::Direct));
    }

    let candidates = config.candidates.list();
    reporter.discovery_started(&config.target, candidates.len());

    let discovery = EndpointDiscovery::new(prober).with_concurrency(config.concurrency);
    let found = discovery.discover(&config.target, &candidates).await;
    reporter.discovery_finished(found.as_deref());

    found
        .map(|url| (url, Resolution::Discovered))
        .ok_or(ProbeError::NotFound)
}

fn auth_failure(outcome: &AuthOutcome) -> ProbeError {
    const STAGE: &str = "credential validation";

    match (outcome.reason, outcome.status) {
        (AuthReason::Unauthorized | AuthReason::Forbidden, Some(status)) => {
            ProbeError::AuthDenied { stage: STAGE, status }
        }
        (AuthReason::NetworkError, _) | (_, None) => ProbeError::Transport(outcome.detail.clone()),
        (_, Some(status)) => ProbeError::UnexpectedResponse { stage: STAGE, status },
    }
}
