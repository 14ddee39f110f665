//! Execution Runner: drives one `QUEUED` intent through Bundle
//! Assembly (C6), Anti-MEV Mitigation (C7), Inclusion Prediction (C8),
//! Relay Routing (C9), and Submission Fan-out (C10), then reports the
//! outcome back through the Transition Executor (C3).
//!
//! `kestrel_core` has no direct analog of this: its own composition
//! point, `execution::pipeline::evaluate_intent_pipeline`, is a pure
//! synchronous function over already-gathered inputs, with no store
//! I/O and nothing to await. This module is necessarily stateful (it
//! holds the store lock around each transition) and async (it awaits
//! the network-shaped submission call), so it is built in that pure
//! pipeline's compositional spirit — call each stage in turn, record
//! outcomes, advance the FSM — rather than lifted from it.

use std::fmt;
use std::sync::Arc;

use rand::RngCore;

use kestrel_core::antimev::{AntiMevMetrics, MitigateInput, mitigate};
use kestrel_core::bundle::{BundlePlanInput, TxKind, TxTemplate, build_bundle_plan};
use kestrel_core::model::IntentPayload;
use kestrel_core::predictor::{InclusionPrediction, predict_inclusion};
use kestrel_core::reason::{Reason, ReasonCode};
use kestrel_core::router::RouterTuning;
use kestrel_core::state::IntentState;

use crate::audit::AuditSubject;
use crate::context::AppContext;
use crate::store::{LedgerAppendError, StoreMetrics};
use crate::submission::{RelayClient, submit_plan};

/// Per-intent execution parameters the hot-updatable `ConfigSnapshot`
/// has no keys for (gas/replacement policy, deadlines, tip) — these
/// describe one submission attempt, not a tunable shared across every
/// intent, so the caller supplies them rather than the config daemon.
#[derive(Debug, Clone, Copy)]
pub struct ExecutionTuning {
    pub base_fee_max: u128,
    pub priority_fee: u128,
    pub bump_step: u128,
    pub bump_cap: u128,
    pub nonce: u64,
    pub max_bumps: u32,
    pub deadline_secs: i64,
    pub tip_gwei: f64,
    pub submission_deadline_ms: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunnerError {
    IntentNotFound,
    NotQueued { actual: IntentState },
    MalformedPayload(String),
    Store(LedgerAppendError),
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntentNotFound => write!(f, "intent_id not found"),
            Self::NotQueued { actual } => write!(f, "intent is {actual}, not QUEUED"),
            Self::MalformedPayload(reason) => write!(f, "malformed intent payload: {reason}"),
            Self::Store(e) => write!(f, "store error: {e}"),
        }
    }
}

impl std::error::Error for RunnerError {}

impl From<LedgerAppendError> for RunnerError {
    fn from(e: LedgerAppendError) -> Self {
        RunnerError::Store(e)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RunnerOutcome {
    pub final_state: IntentState,
    pub prediction: InclusionPrediction,
}

const PLACEHOLDER_TO: &str = "0x0000000000000000000000000000000000000000";

/// The validated payload carries raw signed-tx hex strings, not the
/// structured `(kind, to, data)` triples `TxTemplate` models; until the
/// wire format grows that metadata, each raw tx becomes a single atomic
/// buy template against a placeholder destination.
fn tx_templates_from_payload(payload: &IntentPayload) -> Vec<TxTemplate> {
    payload
        .txs
        .as_deref()
        .unwrap_or(&[])
        .iter()
        .map(|tx_hex| TxTemplate::new(TxKind::Buy, PLACEHOLDER_TO, tx_hex.clone()))
        .collect()
}

/// Drive one `QUEUED` intent all the way to `INCLUDED` or `DROPPED`.
///
/// Locks `ctx.store` twice, never across an `.await`: once up front to
/// fetch and validate the intent, once to record `Queued -> Submitted`
/// immediately before the async submission call, and once more after
/// it resolves to record the terminal transition.
pub async fn drive_queued_intent(
    ctx: &AppContext,
    intent_id: &str,
    corr_id: &str,
    client: Arc<dyn RelayClient>,
    rng: &mut dyn RngCore,
    tuning: &ExecutionTuning,
    now_ms: i64,
    now_ts: &str,
) -> Result<RunnerOutcome, RunnerError> {
    let span = tracing::info_span!("runner_drive_queued_intent", intent_id, corr_id);
    let _enter = span.enter();

    let payload = {
        let store = ctx.store.lock();
        let intent = store.get(intent_id).ok_or(RunnerError::IntentNotFound)?;
        if intent.state != IntentState::Queued {
            return Err(RunnerError::NotQueued { actual: intent.state });
        }
        serde_json::from_value::<IntentPayload>(intent.payload.clone())
            .map_err(|e| RunnerError::MalformedPayload(e.to_string()))?
    };

    let config = ctx.config.current();
    let atomic = payload
        .constraints
        .as_ref()
        .and_then(|c| c.revert_shield)
        .unwrap_or(true);

    let plan = build_bundle_plan(BundlePlanInput {
        tx_templates: tx_templates_from_payload(&payload),
        now_ms,
        deadline_secs: tuning.deadline_secs,
        atomic,
        base_fee_max: tuning.base_fee_max,
        priority_fee: tuning.priority_fee,
        bump_step: tuning.bump_step,
        bump_cap: tuning.bump_cap,
        nonce: tuning.nonce,
        max_bumps: tuning.max_bumps,
    });
    audit(ctx, AuditSubject::BundlePlan, intent_id, corr_id, serde_json::json!({
        "tx_count": plan.tx_templates.len(),
        "atomic": plan.atomic,
    }));

    let mut antimev_metrics = AntiMevMetrics::new();
    let mitigated = mitigate(
        &plan,
        intent_id,
        corr_id,
        &MitigateInput {
            now_ms,
            epoch_ms: config.antimev_epoch_ms() as i64,
            jitter_max_ms: config.antimev_jitter_max_ms() as i64,
            decoy_pct: config.antimev_decoy_pct(),
        },
        &mut antimev_metrics,
    );
    audit(ctx, AuditSubject::AntiMevAction, intent_id, corr_id, serde_json::json!({
        "decoys_appended": antimev_metrics.decoys_appended_total(),
        "not_before": mitigated.not_before,
    }));

    let lanes = ctx.relays.snapshot();
    let prediction = predict_inclusion(&mitigated, &lanes, tuning.tip_gwei, now_ms);
    tracing::debug!(
        intent_id,
        p_inclusion = prediction.p_inclusion,
        p_latency_ms = prediction.p_latency_ms,
        "advisory inclusion prediction; non-gating"
    );

    let router_tuning = RouterTuning {
        base_ms: config.router_base_ms() as u64,
        factor: config.router_factor(),
        max_ms: config.router_max_ms() as u64,
        jitter_pct: config.router_jitter_pct(),
    };
    let relay_plan = ctx.relays.route(intent_id, mitigated.atomic, &router_tuning, rng);
    audit(ctx, AuditSubject::RelayPlan, intent_id, corr_id, serde_json::json!({
        "targets": relay_plan.targets,
        "strategy": relay_plan.strategy,
    }));

    {
        let mut store = ctx.store.lock();
        let mut store_metrics = StoreMetrics::new();
        store.advance(
            intent_id,
            IntentState::Submitted,
            corr_id,
            None,
            None,
            now_ts,
            &mut store_metrics,
        )?;
    }

    let submit_result = submit_plan(
        intent_id,
        corr_id,
        client,
        &relay_plan,
        Arc::new(mitigated),
        tuning.submission_deadline_ms,
        || now_ms,
        &ctx.cancel,
    )
    .await;

    let final_state = {
        let mut store = ctx.store.lock();
        let mut store_metrics = StoreMetrics::new();
        match &submit_result {
            Ok(outcome) => {
                audit(ctx, AuditSubject::ClientSubmission, intent_id, corr_id, serde_json::json!({
                    "lane_id": outcome.lane_id,
                    "bundle_ref": outcome.bundle_ref,
                }));
                store.advance(
                    intent_id,
                    IntentState::Included,
                    corr_id,
                    None,
                    None,
                    now_ts,
                    &mut store_metrics,
                )?
            }
            Err(e) => {
                let reason = Reason::new(ReasonCode::SubmissionAllFailed, e.to_string());
                store.advance(
                    intent_id,
                    IntentState::Dropped,
                    corr_id,
                    None,
                    Some(reason),
                    now_ts,
                    &mut store_metrics,
                )?
            }
        }
    };

    Ok(RunnerOutcome { final_state, prediction })
}

fn audit(
    ctx: &AppContext,
    subject: AuditSubject,
    intent_id: &str,
    corr_id: &str,
    detail: serde_json::Value,
) {
    if let Err(e) = ctx.audit.record(subject, intent_id, corr_id, detail) {
        tracing::warn!(intent_id, error = %e, "audit record write failed");
    }
}
