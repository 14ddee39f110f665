//! Submission Fan-out (C10): executes a `RelayPlan` against lanes with
//! bounded retries under a cancellation-aware worker pool.
//!
//! The relay lane itself is abstracted behind `RelayClient` so this
//! logic is exercised against in-process test doubles; no concrete
//! HTTP client lives in this crate.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinSet;

use kestrel_core::bundle::BundlePlan;
use kestrel_core::router::{RelayPlan, RelayStrategy};

use crate::worker_pool::CancellationSignal;

/// A "success" is a relay acknowledgement carrying a bundle-hash-like
/// identifier.
#[async_trait]
pub trait RelayClient: Send + Sync {
    async fn submit(&self, lane_id: &str, plan: &BundlePlan) -> Result<String, SubmissionError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionError {
    LaneUnreachable { lane_id: String },
    AllFailed,
    DeadlineExceeded,
    Cancelled,
}

impl fmt::Display for SubmissionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LaneUnreachable { lane_id } => write!(f, "lane {lane_id} unreachable"),
            Self::AllFailed => write!(f, "all relay lanes failed"),
            Self::DeadlineExceeded => write!(f, "submission deadline exceeded"),
            Self::Cancelled => write!(f, "submission cancelled"),
        }
    }
}

impl std::error::Error for SubmissionError {}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub lane_id: String,
    pub bundle_ref: String,
}

/// Submit `bundle_plan` per `relay_plan`. `deadline_ms` aborts
/// outstanding attempts once wall-clock exceeds it; `now_ms` is
/// injectable so tests run without real time passing.
pub async fn submit_plan(
    intent_id: &str,
    corr_id: &str,
    client: Arc<dyn RelayClient>,
    relay_plan: &RelayPlan,
    bundle_plan: Arc<BundlePlan>,
    deadline_ms: i64,
    now_ms: impl Fn() -> i64,
    cancel: &CancellationSignal,
) -> Result<SubmissionOutcome, SubmissionError> {
    let span = tracing::info_span!("submission_submit", intent_id, corr_id);
    let _enter = span.enter();

    if now_ms() > deadline_ms {
        tracing::warn!(intent_id, "submission deadline already passed");
        return Err(SubmissionError::DeadlineExceeded);
    }
    if cancel.is_cancelled() {
        tracing::warn!(intent_id, "submission cancelled before dispatch");
        return Err(SubmissionError::Cancelled);
    }

    let result = match relay_plan.strategy {
        RelayStrategy::ParallelPreferAuth => {
            submit_parallel(client, relay_plan, bundle_plan).await
        }
        RelayStrategy::SequentialPreferAuth => {
            submit_sequential(client, relay_plan, bundle_plan, deadline_ms, now_ms, cancel).await
        }
    };

    match &result {
        Ok(outcome) => tracing::debug!(intent_id, lane_id = %outcome.lane_id, "submission accepted by relay"),
        Err(e) => tracing::warn!(intent_id, error = %e, "submission failed on every lane"),
    }
    result
}

async fn submit_parallel(
    client: Arc<dyn RelayClient>,
    relay_plan: &RelayPlan,
    bundle_plan: Arc<BundlePlan>,
) -> Result<SubmissionOutcome, SubmissionError> {
    let mut tasks = JoinSet::new();
    for lane_id in &relay_plan.targets {
        let client = Arc::clone(&client);
        let bundle_plan = Arc::clone(&bundle_plan);
        let lane_id = lane_id.clone();
        tasks.spawn(async move {
            let result = client.submit(&lane_id, &bundle_plan).await;
            (lane_id, result)
        });
    }

    let mut last_err = SubmissionError::AllFailed;
    while let Some(joined) = tasks.join_next().await {
        let (lane_id, result) = joined.map_err(|_| SubmissionError::AllFailed)?;
        match result {
            Ok(bundle_ref) => {
                tasks.abort_all();
                return Ok(SubmissionOutcome { lane_id, bundle_ref });
            }
            Err(e) => last_err = e,
        }
    }

    tracing::warn!(?last_err, "all parallel relay submissions failed");
    Err(SubmissionError::AllFailed)
}

async fn submit_sequential(
    client: Arc<dyn RelayClient>,
    relay_plan: &RelayPlan,
    bundle_plan: Arc<BundlePlan>,
    deadline_ms: i64,
    now_ms: impl Fn() -> i64,
    cancel: &CancellationSignal,
) -> Result<SubmissionOutcome, SubmissionError> {
    for (i, lane_id) in relay_plan.targets.iter().enumerate() {
        if now_ms() > deadline_ms {
            return Err(SubmissionError::DeadlineExceeded);
        }
        if cancel.is_cancelled() {
            return Err(SubmissionError::Cancelled);
        }

        match client.submit(lane_id, &bundle_plan).await {
            Ok(bundle_ref) => {
                return Ok(SubmissionOutcome {
                    lane_id: lane_id.clone(),
                    bundle_ref,
                });
            }
            Err(e) => {
                tracing::warn!(lane_id, error = %e, "sequential relay attempt failed");
            }
        }

        if let (Some(&backoff), Some(&jitter)) = (relay_plan.backoff.get(i), relay_plan.jitter.get(i)) {
            tokio::time::sleep(Duration::from_millis(backoff + jitter)).await;
        }
    }

    Err(SubmissionError::AllFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kestrel_core::bundle::{BundlePlanInput, TxKind, TxTemplate, build_bundle_plan};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedClient {
        outcomes: Vec<(String, Result<String, SubmissionError>)>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl RelayClient for ScriptedClient {
        async fn submit(&self, lane_id: &str, _plan: &BundlePlan) -> Result<String, SubmissionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .iter()
                .find(|(id, _)| id == lane_id)
                .map(|(_, result)| result.clone())
                .unwrap_or(Err(SubmissionError::LaneUnreachable {
                    lane_id: lane_id.to_string(),
                }))
        }
    }

    fn plan() -> Arc<BundlePlan> {
        Arc::new(build_bundle_plan(BundlePlanInput {
            tx_templates: vec![TxTemplate::new(TxKind::Buy, "0xa", "0x01")],
            now_ms: 0,
            deadline_secs: 60,
            atomic: true,
            base_fee_max: 100,
            priority_fee: 2,
            bump_step: 5,
            bump_cap: 10,
            nonce: 1,
            max_bumps: 2,
        }))
    }

    fn relay_plan(strategy: RelayStrategy, targets: &[&str]) -> RelayPlan {
        RelayPlan {
            targets: targets.iter().map(|s| s.to_string()).collect(),
            strategy,
            backoff: vec![0; targets.len().saturating_sub(1)],
            jitter: vec![0; targets.len().saturating_sub(1)],
        }
    }

    #[tokio::test]
    async fn parallel_returns_first_success() {
        let client = Arc::new(ScriptedClient {
            outcomes: vec![
                ("A".to_string(), Ok("bundle-a".to_string())),
                ("B".to_string(), Err(SubmissionError::LaneUnreachable { lane_id: "B".to_string() })),
            ],
            calls: AtomicUsize::new(0),
        });
        let relay_plan = relay_plan(RelayStrategy::ParallelPreferAuth, &["A", "B"]);
        let cancel = CancellationSignal::new();
        let outcome = submit_plan("i1", "c1", client, &relay_plan, plan(), 10_000, || 0, &cancel)
            .await
            .unwrap();
        assert_eq!(outcome.bundle_ref, "bundle-a");
    }

    #[tokio::test]
    async fn parallel_all_fail_returns_all_failed() {
        let client = Arc::new(ScriptedClient {
            outcomes: vec![],
            calls: AtomicUsize::new(0),
        });
        let relay_plan = relay_plan(RelayStrategy::ParallelPreferAuth, &["A", "B"]);
        let cancel = CancellationSignal::new();
        let result = submit_plan("i1", "c1", client, &relay_plan, plan(), 10_000, || 0, &cancel).await;
        assert_eq!(result, Err(SubmissionError::AllFailed));
    }

    #[tokio::test]
    async fn sequential_tries_in_order_and_stops_on_success() {
        let client = Arc::new(ScriptedClient {
            outcomes: vec![("B".to_string(), Ok("bundle-b".to_string()))],
            calls: AtomicUsize::new(0),
        });
        let relay_plan = relay_plan(RelayStrategy::SequentialPreferAuth, &["A", "B", "C"]);
        let cancel = CancellationSignal::new();
        let outcome = submit_plan("i1", "c1", client, &relay_plan, plan(), 10_000, || 0, &cancel)
            .await
            .unwrap();
        assert_eq!(outcome.lane_id, "B");
    }

    #[tokio::test]
    async fn deadline_already_passed_fails_fast() {
        let client = Arc::new(ScriptedClient {
            outcomes: vec![],
            calls: AtomicUsize::new(0),
        });
        let relay_plan = relay_plan(RelayStrategy::SequentialPreferAuth, &["A"]);
        let cancel = CancellationSignal::new();
        let result = submit_plan("i1", "c1", client, &relay_plan, plan(), 0, || 1_000, &cancel).await;
        assert_eq!(result, Err(SubmissionError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn cancellation_signal_short_circuits() {
        let client = Arc::new(ScriptedClient {
            outcomes: vec![("A".to_string(), Ok("bundle-a".to_string()))],
            calls: AtomicUsize::new(0),
        });
        let relay_plan = relay_plan(RelayStrategy::SequentialPreferAuth, &["A"]);
        let cancel = CancellationSignal::new();
        cancel.cancel();
        let result = submit_plan("i1", "c1", client, &relay_plan, plan(), 10_000, || 0, &cancel).await;
        assert_eq!(result, Err(SubmissionError::Cancelled));
    }
}
