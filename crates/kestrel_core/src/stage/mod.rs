//! Stage pipeline (C4): Screen, Validate, Enrich, Policy, run in that
//! fixed order with short-circuit on the first rejection.

pub mod enrich;
pub mod policy;
pub mod screen;
pub mod validate;

use crate::reason::Reason;
use enrich::{EnrichMetrics, EnrichResult, EnrichedContext, evaluate_enrich};
use policy::{PolicyInput, PolicyMetrics, PolicyResult, evaluate_policy};
use screen::{ScreenInput, ScreenMetrics, ScreenResult, evaluate_screen};
use validate::{ValidateInput, ValidateMetrics, ValidateResult, evaluate_validate};

/// Which stage produced a rejection, for audit/metrics labeling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageName {
    Screen,
    Validate,
    Enrich,
    Policy,
}

impl StageName {
    pub fn as_str(self) -> &'static str {
        match self {
            StageName::Screen => "screen",
            StageName::Validate => "validate",
            StageName::Enrich => "enrich",
            StageName::Policy => "policy",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    Advanced(EnrichedContext),
    Rejected { stage: StageName, reason: Reason },
}

pub struct PipelineInput<'a> {
    pub screen: ScreenInput<'a>,
    pub validate: ValidateInput<'a>,
    pub enrich_outcome: Option<EnrichedContext>,
    pub policy: PolicyInput<'a>,
}

#[derive(Debug, Default)]
pub struct PipelineMetrics {
    pub screen: ScreenMetrics,
    pub validate: ValidateMetrics,
    pub enrich: EnrichMetrics,
    pub policy: PolicyMetrics,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Run all four stages in order, stopping at the first rejection.
pub fn evaluate_pipeline(input: PipelineInput, metrics: &mut PipelineMetrics) -> PipelineOutcome {
    if let ScreenResult::Rejected(reason) = evaluate_screen(&input.screen, &mut metrics.screen) {
        return PipelineOutcome::Rejected {
            stage: StageName::Screen,
            reason,
        };
    }

    if let ValidateResult::Rejected(reason) =
        evaluate_validate(&input.validate, &mut metrics.validate)
    {
        return PipelineOutcome::Rejected {
            stage: StageName::Validate,
            reason,
        };
    }

    let enriched = match evaluate_enrich(input.enrich_outcome, &mut metrics.enrich) {
        EnrichResult::Rejected(reason) => {
            return PipelineOutcome::Rejected {
                stage: StageName::Enrich,
                reason,
            };
        }
        EnrichResult::Advanced(ctx) => ctx,
    };

    if let PolicyResult::Rejected(reason) = evaluate_policy(&input.policy, &mut metrics.policy) {
        return PipelineOutcome::Rejected {
            stage: StageName::Policy,
            reason,
        };
    }

    PipelineOutcome::Advanced(enriched)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capital::CapitalPrecheckInput;
    use crate::model::IntentPayload;

    fn payload() -> IntentPayload {
        IntentPayload {
            target_chain: "eth-mainnet".to_string(),
            target_block: None,
            deadline_ms: 2_000,
            max_calldata_bytes: None,
            constraints: None,
            txs: None,
            meta: None,
        }
    }

    fn base_capital() -> CapitalPrecheckInput {
        CapitalPrecheckInput {
            kill_switch: false,
            daily_loss: 0.0,
            daily_loss_cap: 50_000.0,
            account_used: 0.0,
            account_cap: 250_000.0,
            strategy_used: 0.0,
            strategy_cap: 100_000.0,
            notional: 1_000.0,
        }
    }

    fn base_input(payload: &IntentPayload) -> PipelineInput<'_> {
        PipelineInput {
            screen: ScreenInput {
                payload,
                now_ms: 1_000,
                max_calldata_bytes_ceiling: 128_000,
                recognized_chains: &["eth-mainnet"],
                replay_seen: false,
            },
            validate: ValidateInput { txs: &[] },
            enrich_outcome: Some(EnrichedContext {
                nonce_hint: 1,
                fee_hint_wei: 1,
            }),
            policy: PolicyInput {
                priority_fee_gwei: 5.0,
                fee_floor_gwei: 2.0,
                from_address: "0xaaa",
                denylist: &[],
                capital: base_capital(),
            },
        }
    }

    #[test]
    fn advances_through_all_four_stages() {
        let payload = payload();
        let mut metrics = PipelineMetrics::new();
        let outcome = evaluate_pipeline(base_input(&payload), &mut metrics);
        assert!(matches!(outcome, PipelineOutcome::Advanced(_)));
        assert_eq!(metrics.screen.passed_total(), 1);
        assert_eq!(metrics.validate.passed_total(), 1);
        assert_eq!(metrics.enrich.advanced_total(), 1);
        assert_eq!(metrics.policy.allowed_total(), 1);
    }

    #[test]
    fn screen_rejection_short_circuits_remaining_stages() {
        let mut payload = payload();
        payload.deadline_ms = 0;
        let mut metrics = PipelineMetrics::new();
        let outcome = evaluate_pipeline(base_input(&payload), &mut metrics);
        match outcome {
            PipelineOutcome::Rejected { stage, reason } => {
                assert_eq!(stage, StageName::Screen);
                assert_eq!(reason.code, "SCREEN_DEADLINE_EXPIRED");
            }
            PipelineOutcome::Advanced(_) => panic!("expected rejection"),
        }
        assert_eq!(metrics.validate.passed_total(), 0);
        assert_eq!(metrics.enrich.advanced_total(), 0);
        assert_eq!(metrics.policy.allowed_total(), 0);
    }

    #[test]
    fn enrich_failure_after_retries_short_circuits_policy() {
        let payload = payload();
        let mut input = base_input(&payload);
        input.enrich_outcome = None;
        let mut metrics = PipelineMetrics::new();
        let outcome = evaluate_pipeline(input, &mut metrics);
        match outcome {
            PipelineOutcome::Rejected { stage, reason } => {
                assert_eq!(stage, StageName::Enrich);
                assert_eq!(reason.code, "NETWORK_ENRICHMENT_UNAVAILABLE");
            }
            PipelineOutcome::Advanced(_) => panic!("expected rejection"),
        }
        assert_eq!(metrics.policy.allowed_total(), 0);
    }

    #[test]
    fn policy_rejection_reports_policy_stage() {
        let payload = payload();
        let mut input = base_input(&payload);
        input.policy.priority_fee_gwei = 0.5;
        let mut metrics = PipelineMetrics::new();
        let outcome = evaluate_pipeline(input, &mut metrics);
        match outcome {
            PipelineOutcome::Rejected { stage, reason } => {
                assert_eq!(stage, StageName::Policy);
                assert_eq!(reason.code, "POLICY_FEE_TOO_LOW");
            }
            PipelineOutcome::Advanced(_) => panic!("expected rejection"),
        }
    }
}
