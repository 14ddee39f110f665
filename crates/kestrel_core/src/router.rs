//! Relay router (C9): health-filtered lane selection and backoff/jitter
//! series generation.
//!
//! Pure given an injected randomness source, so the series is
//! reproducible under test with a fixed-seed RNG.

use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Read-only view of one relay lane's health, mutated by an
/// out-of-core health daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaneHealth {
    pub lane_id: String,
    pub healthy: bool,
    pub authenticated: bool,
    #[serde(default)]
    pub rtt_ms: Option<f64>,
    #[serde(default)]
    pub inc_rate: Option<f64>,
    #[serde(default)]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelayStrategy {
    ParallelPreferAuth,
    SequentialPreferAuth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayPlan {
    pub targets: Vec<String>,
    pub strategy: RelayStrategy,
    pub backoff: Vec<u64>,
    pub jitter: Vec<u64>,
}

#[derive(Debug, Clone, Copy)]
pub struct RouterTuning {
    pub base_ms: u64,
    pub factor: f64,
    pub max_ms: u64,
    pub jitter_pct: f64,
}

/// Sort key: score descending, then rtt ascending (missing values sort last).
fn sort_key(lane: &LaneHealth) -> (f64, f64) {
    (-lane.score.unwrap_or(f64::MIN), lane.rtt_ms.unwrap_or(f64::MAX))
}

fn sorted_by_score_then_rtt<'a>(mut lanes: Vec<&'a LaneHealth>) -> Vec<&'a LaneHealth> {
    lanes.sort_by(|a, b| {
        sort_key(a)
            .partial_cmp(&sort_key(b))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    lanes
}

/// Build a `RelayPlan`: authenticated-healthy lanes first, then
/// unauthenticated-healthy, falling back to degraded lanes only if both
/// are empty, plus a capped backoff/jitter series.
pub fn route(
    plan_atomic: bool,
    lanes: &[LaneHealth],
    tuning: &RouterTuning,
    rng: &mut dyn RngCore,
) -> RelayPlan {
    let (healthy, unhealthy): (Vec<&LaneHealth>, Vec<&LaneHealth>) =
        lanes.iter().partition(|l| l.healthy);
    let (auth_healthy, unauth_healthy): (Vec<&LaneHealth>, Vec<&LaneHealth>) =
        healthy.into_iter().partition(|l| l.authenticated);

    let auth_healthy = sorted_by_score_then_rtt(auth_healthy);
    let unauth_healthy = sorted_by_score_then_rtt(unauth_healthy);

    let mut targets: Vec<String> = auth_healthy
        .iter()
        .chain(unauth_healthy.iter())
        .map(|l| l.lane_id.clone())
        .collect();

    if targets.is_empty() {
        let degraded = sorted_by_score_then_rtt(unhealthy);
        targets = degraded.iter().map(|l| l.lane_id.clone()).collect();
    }

    let attempts = targets.len().max(1);
    let jitter_pct = tuning.jitter_pct.clamp(0.0, 100.0);
    let series_len = attempts.saturating_sub(1);
    let mut backoff = Vec::with_capacity(series_len);
    let mut jitter = Vec::with_capacity(series_len);
    for i in 0..series_len {
        let raw = tuning.base_ms as f64 * tuning.factor.powi(i as i32);
        let capped = (raw.floor() as u64).min(tuning.max_ms);
        backoff.push(capped);
        let rand_unit = rng.next_u32() as f64 / u32::MAX as f64;
        let j = (capped as f64 * rand_unit * jitter_pct / 100.0).floor() as u64;
        jitter.push(j);
    }

    let strategy = if plan_atomic {
        RelayStrategy::ParallelPreferAuth
    } else {
        RelayStrategy::SequentialPreferAuth
    };

    RelayPlan {
        targets,
        strategy,
        backoff,
        jitter,
    }
}
