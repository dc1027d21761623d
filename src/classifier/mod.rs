//! Trade classification
//!
//! The oracle is any `Classifier`. Its answers are never trusted directly:
//! `classify_with_fallback` retries failed calls with exponential backoff,
//! normalizes the answer, and substitutes the fallback category for
//! off-list answers and exhausted retries.

mod cli_oracle;
pub mod cache;

pub use cache::ClassificationCache;
pub use cli_oracle::CliClassifier;

use crate::error::Result;
use boq_tagger_common::match_allowed;
use futures::stream::{self, StreamExt};
use indicatif::ProgressBar;
use std::future::Future;
use std::time::Duration;

/// Text-classification oracle
pub trait Classifier {
    /// Propose one of `allowed` for `description`. The answer may be off-list.
    fn classify(
        &self,
        description: &str,
        allowed: &[String],
    ) -> impl Future<Output = Result<String>> + Send;

    /// Identifies the oracle (provider/model) for cache keys
    fn cache_identity(&self) -> String {
        String::new()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Attempts including the first; at least one attempt is always made
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (1-based): base * 2^(attempt-1)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Accepted,
    /// The oracle answered with something outside the allowed set
    OffList(String),
    /// Every attempt failed
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// Always a member of the allowed set (or the fallback)
    pub tag: String,
    pub outcome: Outcome,
}

impl Classification {
    /// Whether this answer came from the oracle and may be cached
    pub fn is_answer(&self) -> bool {
        !matches!(self.outcome, Outcome::Failed(_))
    }
}

/// Classify one description, absorbing every oracle failure into `fallback`
pub async fn classify_with_fallback<C: Classifier>(
    classifier: &C,
    description: &str,
    allowed: &[String],
    fallback: &str,
    retry: RetryPolicy,
) -> Classification {
    let attempts = retry.max_attempts.max(1);
    let mut last_error = String::new();

    for attempt in 1..=attempts {
        match classifier.classify(description, allowed).await {
            Ok(raw) => {
                return match match_allowed(&raw, allowed) {
                    Some(tag) => Classification { tag, outcome: Outcome::Accepted },
                    None => {
                        tracing::debug!("off-list answer {:?} for {:?}", raw, description);
                        Classification {
                            tag: fallback.to_string(),
                            outcome: Outcome::OffList(raw),
                        }
                    }
                };
            }
            Err(e) => {
                last_error = e.to_string();
                if attempt < attempts {
                    let delay = retry.backoff(attempt);
                    tracing::debug!(
                        "oracle attempt {}/{} failed: {}; retrying in {:?}",
                        attempt,
                        attempts,
                        e,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    tracing::warn!(
        "classification failed after {} attempt(s), using {:?}: {}",
        attempts,
        fallback,
        last_error
    );
    Classification {
        tag: fallback.to_string(),
        outcome: Outcome::Failed(last_error),
    }
}

/// Classify many descriptions with at most `concurrency` oracle calls in flight.
/// Results are in input order.
pub async fn classify_batch<C: Classifier>(
    classifier: &C,
    descriptions: &[&str],
    allowed: &[String],
    fallback: &str,
    retry: RetryPolicy,
    concurrency: usize,
    progress: &ProgressBar,
) -> Vec<Classification> {
    stream::iter(descriptions.iter().copied())
        .map(move |description| async move {
            let result = classify_with_fallback(classifier, description, allowed, fallback, retry).await;
            progress.inc(1);
            result
        })
        .buffered(concurrency.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoqError;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Scripted {
        /// Calls that fail before the answer is returned
        failures: u32,
        answer: &'static str,
        calls: AtomicU32,
    }

    impl Scripted {
        fn new(failures: u32, answer: &'static str) -> Self {
            Self { failures, answer, calls: AtomicU32::new(0) }
        }
    }

    impl Classifier for Scripted {
        async fn classify(&self, _description: &str, _allowed: &[String]) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.failures {
                Err(BoqError::Oracle("busy".into()))
            } else {
                Ok(self.answer.to_string())
            }
        }
    }

    fn allowed() -> Vec<String> {
        vec!["Masonry".into(), "General / Preliminaries".into()]
    }

    fn fast_retry(max_attempts: u32) -> RetryPolicy {
        RetryPolicy { max_attempts, base_delay: Duration::from_millis(1) }
    }

    const FALLBACK: &str = "General / Preliminaries";

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy { max_attempts: 4, base_delay: Duration::from_millis(100) };
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
    }

    #[tokio::test]
    async fn test_accepted_answer_is_normalized() {
        let oracle = Scripted::new(0, "  Masonry \n");
        let result = classify_with_fallback(&oracle, "Blockwork", &allowed(), FALLBACK, fast_retry(3)).await;
        assert_eq!(result.tag, "Masonry");
        assert_eq!(result.outcome, Outcome::Accepted);
    }

    #[tokio::test]
    async fn test_off_list_answer_falls_back_without_retry() {
        let oracle = Scripted::new(0, "UNMAPPED");
        let result = classify_with_fallback(&oracle, "Misc", &allowed(), FALLBACK, fast_retry(3)).await;
        assert_eq!(result.tag, FALLBACK);
        assert_eq!(result.outcome, Outcome::OffList("UNMAPPED".into()));
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 1);
        assert!(result.is_answer());
    }

    #[tokio::test]
    async fn test_transient_failure_recovers() {
        let oracle = Scripted::new(2, "Masonry");
        let result = classify_with_fallback(&oracle, "Blockwork", &allowed(), FALLBACK, fast_retry(3)).await;
        assert_eq!(result.tag, "Masonry");
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausted_retries_fall_back() {
        let oracle = Scripted::new(10, "Masonry");
        let result = classify_with_fallback(&oracle, "Blockwork", &allowed(), FALLBACK, fast_retry(2)).await;
        assert_eq!(result.tag, FALLBACK);
        assert!(matches!(result.outcome, Outcome::Failed(ref msg) if msg.contains("busy")));
        assert!(!result.is_answer());
        assert_eq!(oracle.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_attempts_still_calls_once() {
        let oracle = Scripted::new(0, "Masonry");
        let result = classify_with_fallback(&oracle, "x", &allowed(), FALLBACK, fast_retry(0)).await;
        assert_eq!(result.tag, "Masonry");
    }

    struct Echo {
        in_flight: AtomicU32,
        peak: AtomicU32,
    }

    impl Classifier for Echo {
        async fn classify(&self, description: &str, _allowed: &[String]) -> Result<String> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            Ok(description.to_string())
        }
    }

    #[tokio::test]
    async fn test_classify_batch_keeps_order_and_bounds_concurrency() {
        let oracle = Echo { in_flight: AtomicU32::new(0), peak: AtomicU32::new(0) };
        let descriptions = ["Masonry", "Roofing", "Masonry", "General / Preliminaries", "Masonry"];
        let results = classify_batch(
            &oracle,
            &descriptions,
            &allowed(),
            FALLBACK,
            fast_retry(1),
            2,
            &ProgressBar::hidden(),
        )
        .await;

        let tags: Vec<&str> = results.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(tags, vec!["Masonry", FALLBACK, "Masonry", FALLBACK, "Masonry"]);
        assert!(oracle.peak.load(Ordering::SeqCst) <= 2);
    }
}
