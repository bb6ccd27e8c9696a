use super::probe::{ProbeResult, Prober};
use std::sync::{Arc, OnceLock};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

pub const DEFAULT_CONCURRENCY: usize = 10;

/// Races candidate paths against a base URL over a bounded pool; the first
/// probe to match wins and everything else is cancelled.
pub struct EndpointDiscovery<P> {
    prober: Arc<P>,
    concurrency: usize,
}

impl<P: Prober + 'static> EndpointDiscovery<P> {
    pub fn new(prober: P) -> Self {
        Self {
            prober: Arc::new(prober),
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.clamp(1, Semaphore::MAX_PERMITS);
        self
    }

    pub fn prober(&self) -> &P {
        &self.prober
    }

    pub async fn discover(&self, base_url: &str, candidates: &[String]) -> Option<String> {
        if candidates.is_empty() {
            return None;
        }

        let base_url: Arc<str> = Arc::from(base_url.trim_end_matches('/'));
        let width = self.concurrency.min(candidates.len());
        let semaphore = Arc::new(Semaphore::new(width));
        let cancel = CancellationToken::new();
        let winner: Arc<OnceLock<String>> = Arc::new(OnceLock::new());

        tracing::debug!(
            base = %base_url,
            candidates = candidates.len(),
            concurrency = width,
            "starting discovery"
        );

        let mut tasks = JoinSet::new();
        for candidate in candidates {
            let prober = Arc::clone(&self.prober);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            let winner = Arc::clone(&winner);
            let base_url = Arc::clone(&base_url);
            let candidate = candidate.clone();

            tasks.spawn(async move {
                let _permit = tokio::select! {
                    _ = cancel.cancelled() => return None,
                    permit = semaphore.acquire_owned() => permit.ok()?,
                };
                if cancel.is_cancelled() {
                    return None;
                }

                let result = prober.probe(&base_url, &candidate, &cancel).await;
                if let Some(url) = result.resolved_url.as_ref().filter(|_| result.matched) {
                    if winner.set(url.clone()).is_ok() {
                        cancel.cancel();
                    }
                }
                Some(result)
            });
        }

        let mut completed = 0usize;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some(result)) => {
                    completed += 1;
                    log_result(&result);
                }
                Ok(None) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => tracing::warn!(error = %e, "probe task failed"),
            }

            if let Some(url) = winner.get() {
                tasks.abort_all();
                tracing::debug!(url = %url, completed, "endpoint found, remaining probes cancelled");
                return Some(url.clone());
            }
        }

        tracing::debug!(completed, "discovery exhausted all candidates");
        winner.get().cloned()
    }
}

fn log_result(result: &ProbeResult) {
    if result.matched {
        tracing::debug!(candidate = %result.candidate, "candidate matched");
    } else {
        tracing::trace!(candidate = %result.candidate, "candidate missed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::probe::join_url;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    /// Answers from a table of candidate -> (delay, matched).
    struct ScriptedProber {
        script: HashMap<String, (Duration, bool)>,
        started: AtomicUsize,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
    }

    impl ScriptedProber {
        fn new(entries: &[(&str, u64, bool)]) -> Self {
            Self {
                script: entries
                    .iter()
                    .map(|(c, ms, m)| (c.to_string(), (Duration::from_millis(*ms), *m)))
                    .collect(),
                started: AtomicUsize::new(0),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Prober for ScriptedProber {
        async fn probe(
            &self,
            base_url: &str,
            candidate: &str,
            cancel: &CancellationToken,
        ) -> ProbeResult {
            self.started.fetch_add(1, Ordering::SeqCst);
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);

            let (delay, matched) = self
                .script
                .get(candidate)
                .copied()
                .unwrap_or((Duration::from_millis(1), false));

            let result = tokio::select! {
                _ = cancel.cancelled() => ProbeResult::miss(candidate),
                _ = tokio::time::sleep(delay) => {
                    if matched {
                        ProbeResult::hit(candidate, join_url(base_url, candidate))
                    } else {
                        ProbeResult::miss(candidate)
                    }
                }
            };

            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    fn paths(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_returns_single_match() {
        let prober = ScriptedProber::new(&[("/a", 5, false), ("/b", 5, true), ("/c", 5, false)]);
        let discovery = EndpointDiscovery::new(prober);

        let found = discovery
            .discover("http://x/api/", &paths(&["/a", "/b", "/c"]))
            .await;
        assert_eq!(found.as_deref(), Some("http://x/api/b"));
    }

    #[tokio::test]
    async fn test_no_match_returns_none() {
        let prober = ScriptedProber::new(&[("/a", 5, false), ("/b", 5, false)]);
        let discovery = EndpointDiscovery::new(prober);

        assert!(discovery.discover("http://x", &paths(&["/a", "/b"])).await.is_none());
        assert_eq!(discovery.prober().started.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_candidates() {
        let discovery = EndpointDiscovery::new(ScriptedProber::new(&[]));
        assert!(discovery.discover("http://x", &[]).await.is_none());
    }

    #[tokio::test]
    async fn test_probes_run_concurrently() {
        let names: Vec<String> = (0..10).map(|i| format!("/p{}", i)).collect();
        let entries: Vec<(&str, u64, bool)> =
            names.iter().map(|n| (n.as_str(), 300, false)).collect();
        let discovery = EndpointDiscovery::new(ScriptedProber::new(&entries));

        let start = Instant::now();
        assert!(discovery.discover("http://x", &names).await.is_none());

        // Serial execution would take ~3s.
        assert!(start.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_pool_width_is_bounded() {
        let names: Vec<String> = (0..12).map(|i| format!("/p{}", i)).collect();
        let entries: Vec<(&str, u64, bool)> =
            names.iter().map(|n| (n.as_str(), 20, false)).collect();
        let discovery = EndpointDiscovery::new(ScriptedProber::new(&entries)).with_concurrency(3);

        discovery.discover("http://x", &names).await;

        let prober = discovery.prober();
        assert_eq!(prober.started.load(Ordering::SeqCst), 12);
        assert!(prober.peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_does_not_wait_for_stragglers() {
        let prober = ScriptedProber::new(&[("/slow", 30_000, false), ("/fast", 10, true)]);
        let discovery = EndpointDiscovery::new(prober);

        let found = tokio::time::timeout(
            Duration::from_secs(5),
            discovery.discover("http://x", &paths(&["/slow", "/fast"])),
        )
        .await
        .expect("discovery should not wait for the slow probe");

        assert_eq!(found.as_deref(), Some("http://x/fast"));
    }

    #[tokio::test]
    async fn test_pending_candidates_are_skipped_after_win() {
        let prober = ScriptedProber::new(&[("/a", 5, true), ("/b", 5, true), ("/c", 5, true)]);
        let discovery = EndpointDiscovery::new(prober).with_concurrency(1);

        let found = discovery.discover("http://x", &paths(&["/a", "/b", "/c"])).await;

        assert!(found.is_some());
        assert_eq!(discovery.prober().started.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_multiple_matches_yield_one_winner() {
        let prober = ScriptedProber::new(&[("/a", 10, true), ("/b", 10, true), ("/c", 10, true)]);
        let discovery = EndpointDiscovery::new(prober);

        let found = discovery
            .discover("http://x", &paths(&["/a", "/b", "/c"]))
            .await
            .unwrap();
        assert!(["http://x/a", "http://x/b", "http://x/c"].contains(&found.as_str()));
    }

    #[tokio::test]
    async fn test_oversized_concurrency_is_clamped() {
        let prober = ScriptedProber::new(&[("/a", 5, false), ("/b", 5, true)]);
        let discovery = EndpointDiscovery::new(prober).with_concurrency(usize::MAX);
        assert_eq!(discovery.concurrency, Semaphore::MAX_PERMITS);

        let found = discovery.discover("http://x", &paths(&["/a", "/b"])).await;
        assert_eq!(found.as_deref(), Some("http://x/b"));
    }

    #[test]
    fn test_zero_concurrency_becomes_one() {
        let discovery = EndpointDiscovery::new(ScriptedProber::new(&[])).with_concurrency(0);
        assert_eq!(discovery.concurrency, 1);
    }
}
