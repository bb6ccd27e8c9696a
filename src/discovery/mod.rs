mod candidates;
mod endpoint;
mod probe;

pub use candidates::{load_wordlist, CandidateSource, DEFAULT_PATHS};
pub use endpoint::{EndpointDiscovery, DEFAULT_CONCURRENCY};
pub use probe::{join_url, HttpProber, ProbeResult, Prober, PROBE_TIMEOUT};
