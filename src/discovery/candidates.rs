use std::path::{Path, PathBuf};

pub const DEFAULT_PATHS: &[&str] = &[
    "/graphql",
    "/graphiql",
    "/v1/graphql",
    "/v2/graphql",
    "/api/graphql",
    "/graphql/console",
    "/playground",
    "/query",
    "/api/v1/graphql",
    "/api/v2/graphql",
    "/gql",
    "/api/gql",
    "/graph",
    "/console",
];

/// Where the candidate paths for a discovery run come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidateSource {
    BuiltIn,
    File(PathBuf),
}

impl CandidateSource {
    pub fn from_wordlist(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => CandidateSource::File(path),
            None => CandidateSource::BuiltIn,
        }
    }

    /// An unreadable wordlist yields no candidates rather than an error.
    pub fn list(&self) -> Vec<String> {
        match self {
            CandidateSource::BuiltIn => DEFAULT_PATHS.iter().map(|s| s.to_string()).collect(),
            CandidateSource::File(path) => load_wordlist(path).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "could not read wordlist");
                Vec::new()
            }),
        }
    }
}

pub fn load_wordlist(path: &Path) -> std::io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(parse_wordlist(&content))
}

fn parse_wordlist(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(|line| {
            if line.starts_with('/') {
                line.to_string()
            } else {
                format!("/{}", line)
            }
        })
        .collect()
}
