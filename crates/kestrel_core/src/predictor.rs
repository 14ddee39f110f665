//! Inclusion predictor (C8): a pure sigmoid heuristic over a bundle plan
//! and the current lane health snapshot. No network calls; purely
//! arithmetic over already-gathered inputs.

use crate::bundle::BundlePlan;
use crate::router::LaneHealth;

/// Regression coefficients. Not derived from a fitted model; chosen so
/// each input's sign matches intuition (higher inclusion rate and tip
/// raise `pInclusion`, larger size and less time to deadline lower it).
const A0: f64 = -1.0;
const A_INC: f64 = 0.6;
const A_TIP: f64 = 0.15;
const A_SIZE: f64 = -0.05;
const A_TIME: f64 = -0.1;
const A_ATOMIC: f64 = 0.3;
const EPS: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InclusionPrediction {
    pub p_inclusion: f64,
    pub p_latency_ms: f64,
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

fn mean_inc_rate(lanes: &[LaneHealth]) -> f64 {
    let rates: Vec<f64> = lanes.iter().filter_map(|l| l.inc_rate).collect();
    if rates.is_empty() {
        return 0.0;
    }
    rates.iter().sum::<f64>() / rates.len() as f64
}

fn mean_rtt(lanes: &[LaneHealth]) -> f64 {
    let rtts: Vec<f64> = lanes.iter().filter_map(|l| l.rtt_ms).collect();
    if rtts.is_empty() {
        return 0.0;
    }
    rtts.iter().sum::<f64>() / rtts.len() as f64
}

/// Predict `pInclusion` and `pLatencyMs` for `plan` given `lanes`.
///
/// `tip_gwei` and `size` describe the plan's priority fee and template
/// count; `now_ms` is used against `plan.deadline` for the time terms.
pub fn predict_inclusion(
    plan: &BundlePlan,
    lanes: &[LaneHealth],
    tip_gwei: f64,
    now_ms: i64,
) -> InclusionPrediction {
    let size = plan.tx_templates.len() as f64;
    let time_to_deadline_sec = ((plan.deadline - now_ms).max(0) as f64) / 1000.0;
    let inc_rate = mean_inc_rate(lanes).max(EPS);

    let x = A0
        + A_INC * inc_rate.ln()
        + A_TIP * (1.0 + tip_gwei.max(0.0)).ln()
        + A_SIZE * size
        + A_TIME * (time_to_deadline_sec / 30.0)
        + A_ATOMIC * if plan.atomic { 1.0 } else { 0.0 };

    let p_inclusion = sigmoid(x).clamp(0.001, 0.999);

    let deadline_gap = (plan.deadline - now_ms).max(0) as f64;
    let p_latency_ms = (mean_rtt(lanes) + size * 25.0).clamp(50.0, deadline_gap.max(50.0));

    InclusionPrediction {
        p_inclusion,
        p_latency_ms,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{BundlePlanInput, TxKind, TxTemplate, build_bundle_plan};

    fn sample_plan(atomic: bool) -> BundlePlan {
        build_bundle_plan(BundlePlanInput {
            tx_templates: vec![TxTemplate::new(TxKind::Buy, "0xa", "0x01")],
            now_ms: 1_000_000,
            deadline_secs: 60,
            atomic,
            base_fee_max: 100,
            priority_fee: 2,
            bump_step: 5,
            bump_cap: 10,
            nonce: 1,
            max_bumps: 2,
        })
    }

    fn healthy_lane() -> LaneHealth {
        LaneHealth {
            lane_id: "A".to_string(),
            healthy: true,
            authenticated: true,
            rtt_ms: Some(50.0),
            inc_rate: Some(0.8),
            score: Some(1.0),
        }
    }

    #[test]
    fn p_inclusion_is_within_bounds() {
        let plan = sample_plan(true);
        let prediction = predict_inclusion(&plan, &[healthy_lane()], 5.0, 1_000_000);
        assert!(prediction.p_inclusion >= 0.001 && prediction.p_inclusion <= 0.999);
    }

    #[test]
    fn higher_inclusion_rate_raises_p_inclusion() {
        let plan = sample_plan(true);
        let mut poor = healthy_lane();
        poor.inc_rate = Some(0.01);
        let mut good = healthy_lane();
        good.inc_rate = Some(0.99);
        let low = predict_inclusion(&plan, &[poor], 5.0, 1_000_000);
        let high = predict_inclusion(&plan, &[good], 5.0, 1_000_000);
        assert!(high.p_inclusion > low.p_inclusion);
    }

    #[test]
    fn atomic_plans_predict_higher_inclusion_than_non_atomic() {
        let atomic_plan = sample_plan(true);
        let nonatomic_plan = sample_plan(false);
        let a = predict_inclusion(&atomic_plan, &[healthy_lane()], 5.0, 1_000_000);
        let b = predict_inclusion(&nonatomic_plan, &[healthy_lane()], 5.0, 1_000_000);
        assert!(a.p_inclusion > b.p_inclusion);
    }

    #[test]
    fn p_latency_is_bounded_by_deadline_gap() {
        let plan = sample_plan(true);
        let near_deadline_now = plan.deadline - 60;
        let prediction = predict_inclusion(&plan, &[healthy_lane()], 5.0, near_deadline_now);
        assert!(prediction.p_latency_ms <= 60.0_f64.max(50.0));
    }

    #[test]
    fn empty_lane_set_does_not_panic() {
        let plan = sample_plan(true);
        let prediction = predict_inclusion(&plan, &[], 0.0, 1_000_000);
        assert!(prediction.p_inclusion > 0.0);
        assert!(prediction.p_latency_ms >= 50.0);
    }
}
