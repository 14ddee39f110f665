//! Intent and event record shapes.
//!
//! These are the shared wire/persistence shapes for the intent store; the
//! store itself (and its WAL encoding) lives in the infra crate.

use serde::{Deserialize, Serialize};

use crate::reason::Reason;
use crate::state::IntentState;

/// Client-supplied submission body. Opaque beyond the fields the pipeline
/// actually inspects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentPayload {
    pub target_chain: String,
    #[serde(default)]
    pub target_block: Option<u64>,
    pub deadline_ms: i64,
    #[serde(default)]
    pub max_calldata_bytes: Option<u64>,
    #[serde(default)]
    pub constraints: Option<Constraints>,
    #[serde(default)]
    pub txs: Option<Vec<String>>,
    #[serde(default)]
    pub meta: Option<Meta>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Constraints {
    #[serde(default)]
    pub min_net_wei: Option<u128>,
    #[serde(default)]
    pub max_staleness_ms: Option<u64>,
    #[serde(default)]
    pub revert_shield: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Meta {
    #[serde(default)]
    pub strategy_kind: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// One persisted intent row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub intent_id: String,
    pub state: IntentState,
    pub version: u64,
    pub received_at: String,
    pub payload: serde_json::Value,
    pub request_hash: String,
    pub correlation_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reason: Option<Reason>,
}

impl Intent {
    pub fn new(
        intent_id: impl Into<String>,
        payload: serde_json::Value,
        request_hash: impl Into<String>,
        correlation_id: impl Into<String>,
        received_at: impl Into<String>,
    ) -> Self {
        Self {
            intent_id: intent_id.into(),
            state: IntentState::Received,
            version: 0,
            received_at: received_at.into(),
            payload,
            request_hash: request_hash.into(),
            correlation_id: correlation_id.into(),
            last_reason: None,
        }
    }
}

/// One append-only event in an intent's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentEvent {
    pub intent_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_state: Option<IntentState>,
    pub to_state: IntentState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
    pub corr_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_hash: Option<String>,
    pub ts: String,
}

impl IntentEvent {
    pub fn new(
        intent_id: impl Into<String>,
        from_state: Option<IntentState>,
        to_state: IntentState,
        corr_id: impl Into<String>,
        request_hash: Option<String>,
        ts: impl Into<String>,
    ) -> Self {
        Self {
            intent_id: intent_id.into(),
            from_state,
            to_state,
            reason_code: None,
            reason_category: None,
            reason_message: None,
            context: None,
            corr_id: corr_id.into(),
            request_hash,
            ts: ts.into(),
        }
    }

    pub fn with_reason(mut self, reason: &Reason) -> Self {
        self.reason_code = Some(reason.code.clone());
        self.reason_category = Some(reason.category.clone());
        self.reason_message = Some(reason.message.clone());
        self.context = reason.context.clone();
        self
    }
}
