use super::introspection::{SchemaDocument, CAPABILITY_QUERY, FULL_INTROSPECTION_QUERY};
use super::mutations::{extract_mutations, MutationFinding};
use crate::error::{ProbeError, Result};
use crate::http::HttpClient;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

pub const CAPABILITY_TIMEOUT: Duration = Duration::from_secs(10);
pub const DUMP_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStage {
    CapabilityCheck,
    SchemaDump,
}

impl SessionStage {
    pub fn label(&self) -> &'static str {
        match self {
            SessionStage::CapabilityCheck => "capability check",
            SessionStage::SchemaDump => "schema dump",
        }
    }
}

impl std::fmt::Display for SessionStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Enabled,
    Disabled,
    Denied(u16),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome {
    Disabled,
    Denied { stage: SessionStage, status: u16 },
    Dumped {
        document: SchemaDocument,
        findings: Vec<MutationFinding>,
    },
}

/// Capability check followed by a full dump against one endpoint, using the
/// client's credential for both calls.
pub struct IntrospectionSession<'a> {
    client: &'a HttpClient,
    url: String,
}

impl<'a> IntrospectionSession<'a> {
    pub fn new(client: &'a HttpClient, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub async fn check_capability(&self) -> Capability {
        let response = match self
            .client
            .post_graphql(&self.url, CAPABILITY_QUERY, CAPABILITY_TIMEOUT)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::debug!(url = %self.url, error = %e, "capability check failed");
                return Capability::Disabled;
            }
        };

        if response.is_auth_denied() {
            return Capability::Denied(response.status);
        }

        let schema = response.get_data().and_then(|d| d.get("__schema"));
        if response.status == 200 && schema.is_some_and(is_truthy) {
            Capability::Enabled
        } else {
            tracing::debug!(url = %self.url, status = response.status, "introspection not exposed");
            Capability::Disabled
        }
    }

    /// Fetch the full schema. Errors are terminal; nothing is retried.
    pub async fn dump(&self) -> Result<SchemaDocument> {
        let response = self
            .client
            .post_graphql(&self.url, FULL_INTROSPECTION_QUERY, DUMP_TIMEOUT)
            .await?;

        if response.is_auth_denied() {
            return Err(ProbeError::AuthDenied {
                stage: SessionStage::SchemaDump.label(),
                status: response.status,
            });
        }

        if response.status != 200 {
            return Err(ProbeError::UnexpectedResponse {
                stage: SessionStage::SchemaDump.label(),
                status: response.status,
            });
        }

        SchemaDocument::parse(&response.raw)
    }

    /// Run both stages, writing the dumped schema to `output`.
    pub async fn run(&self, output: &Path) -> Result<SessionOutcome> {
        match self.check_capability().await {
            Capability::Disabled => return Ok(SessionOutcome::Disabled),
            Capability::Denied(status) => {
                return Ok(SessionOutcome::Denied {
                    stage: SessionStage::CapabilityCheck,
                    status,
                })
            }
            Capability::Enabled => {}
        }

        let document = match self.dump().await {
            Ok(document) => document,
            Err(ProbeError::AuthDenied { status, .. }) => {
                return Ok(SessionOutcome::Denied {
                    stage: SessionStage::SchemaDump,
                    status,
                })
            }
            Err(e) => return Err(e),
        };

        document.write_to(output)?;
        tracing::debug!(path = %output.display(), types = document.type_count(), "schema written");

        let findings = extract_mutations(&document);
        Ok(SessionOutcome::Dumped { document, findings })
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
