//! External scoring oracle.
//!
//! When candidate reduction has too many options to act on
//! deterministically, an external service ranks them. This crate holds
//! the [`ScoringOracle`] seam, the HTTP implementation, a scripted test
//! double, and the [`Throttle`] that protects the rate-limited service
//! from bursty demand.

pub mod errors;
pub mod http;
pub mod throttle;

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;
use webscout_core_types::Candidate;

pub use errors::OracleError;
pub use http::{HttpOracle, HttpOracleConfig};
pub use throttle::Throttle;

/// Ranks a candidate list against a page excerpt and an objective.
///
/// Returns indices into the candidate list, best first. Implementations
/// may fail or return garbage; callers own the fallback.
#[async_trait]
pub trait ScoringOracle: Send + Sync {
    async fn score(
        &self,
        candidates: &[Candidate],
        page_text: &str,
        objective: &str,
    ) -> Result<Vec<usize>, OracleError>;
}

/// Decorates any oracle with a shared [`Throttle`].
///
/// All oracle callers in a process share one throttle instance by
/// reference, so calls are globally serialized and spaced regardless of
/// how many reducers are running.
pub struct RateLimitedOracle {
    inner: Arc<dyn ScoringOracle>,
    throttle: Arc<Throttle>,
}

impl RateLimitedOracle {
    pub fn new(inner: Arc<dyn ScoringOracle>, throttle: Arc<Throttle>) -> Self {
        Self { inner, throttle }
    }
}

#[async_trait]
impl ScoringOracle for RateLimitedOracle {
    async fn score(
        &self,
        candidates: &[Candidate],
        page_text: &str,
        objective: &str,
    ) -> Result<Vec<usize>, OracleError> {
        let _slot = self.throttle.admit().await;
        debug!(candidates = candidates.len(), "oracle slot acquired");
        self.inner.score(candidates, page_text, objective).await
    }
}

/// Deterministic oracle for tests: pops one canned response per call.
pub struct ScriptedOracle {
    responses: Mutex<VecDeque<Result<Vec<usize>, OracleError>>>,
}

impl ScriptedOracle {
    pub fn new(responses: Vec<Result<Vec<usize>, OracleError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }

    /// An oracle that always fails, for fallback tests.
    pub fn always_failing() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl ScoringOracle for ScriptedOracle {
    async fn score(
        &self,
        _candidates: &[Candidate],
        _page_text: &str,
        _objective: &str,
    ) -> Result<Vec<usize>, OracleError> {
        self.responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Err(OracleError::Transport("script exhausted".to_string())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::Instant;

    fn candidates(n: usize) -> Vec<Candidate> {
        (0..n).map(|i| Candidate::new(format!("#c{i}"))).collect()
    }

    #[tokio::test]
    async fn scripted_oracle_replays_responses_in_order() {
        let oracle = ScriptedOracle::new(vec![
            Ok(vec![2, 0]),
            Err(OracleError::Malformed("nope".to_string())),
        ]);

        let first = oracle.score(&candidates(3), "", "explore").await;
        assert_eq!(first.expect("first"), vec![2, 0]);

        let second = oracle.score(&candidates(3), "", "explore").await;
        assert!(second.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_oracle_spaces_successive_calls() {
        let throttle = Throttle::new(Duration::from_millis(1000));
        let oracle = Arc::new(RateLimitedOracle::new(
            Arc::new(ScriptedOracle::new(vec![Ok(vec![0]), Ok(vec![0])])),
            throttle,
        ));

        let started = Instant::now();
        oracle
            .score(&candidates(1), "", "explore")
            .await
            .expect("first call");
        let first_elapsed = started.elapsed();

        oracle
            .score(&candidates(1), "", "explore")
            .await
            .expect("second call");
        let second_elapsed = started.elapsed();

        assert!(first_elapsed < Duration::from_millis(100));
        assert!(second_elapsed >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn concurrent_callers_queue_fifo_through_one_throttle() {
        let throttle = Throttle::new(Duration::from_millis(1000));
        let oracle = Arc::new(RateLimitedOracle::new(
            Arc::new(ScriptedOracle::new(vec![
                Ok(vec![0]),
                Ok(vec![1]),
                Ok(vec![2]),
            ])),
            throttle,
        ));

        let mut handles = Vec::new();
        for _ in 0..3 {
            let oracle = Arc::clone(&oracle);
            handles.push(tokio::spawn(async move {
                oracle.score(&candidates(3), "", "explore").await
            }));
        }

        let started = Instant::now();
        for handle in handles {
            handle.await.expect("join").expect("score");
        }
        // Three calls spaced 1s apart: at least 2s total.
        assert!(started.elapsed() >= Duration::from_millis(2000));
    }
}
