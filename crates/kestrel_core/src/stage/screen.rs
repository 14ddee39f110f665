//! Screen stage: syntactic sanity on the raw submission. Never touches
//! cryptographic content (that is Validate's job) or the network.

use crate::model::IntentPayload;
use crate::reason::{Reason, ReasonCode};

pub struct ScreenInput<'a> {
    pub payload: &'a IntentPayload,
    pub now_ms: i64,
    pub max_calldata_bytes_ceiling: u64,
    pub recognized_chains: &'a [&'a str],
    pub replay_seen: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenResult {
    Passed,
    Rejected(Reason),
}

#[derive(Debug, Default)]
pub struct ScreenMetrics {
    rejected_oversize_total: u64,
    rejected_unknown_chain_total: u64,
    rejected_deadline_expired_total: u64,
    rejected_replay_seen_total: u64,
    passed_total: u64,
}

impl ScreenMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejected_oversize_total(&self) -> u64 {
        self.rejected_oversize_total
    }
    pub fn rejected_unknown_chain_total(&self) -> u64 {
        self.rejected_unknown_chain_total
    }
    pub fn rejected_deadline_expired_total(&self) -> u64 {
        self.rejected_deadline_expired_total
    }
    pub fn rejected_replay_seen_total(&self) -> u64 {
        self.rejected_replay_seen_total
    }
    pub fn passed_total(&self) -> u64 {
        self.passed_total
    }
}

/// Evaluate the Screen stage. Checks oversize, unrecognized chain,
/// expired deadline, then replay; the first failure wins.
pub fn evaluate_screen(input: &ScreenInput, metrics: &mut ScreenMetrics) -> ScreenResult {
    if let Some(max_bytes) = input.payload.max_calldata_bytes {
        if max_bytes > input.max_calldata_bytes_ceiling {
            metrics.rejected_oversize_total += 1;
            return ScreenResult::Rejected(Reason::new(
                ReasonCode::ScreenOversize,
                format!(
                    "max_calldata_bytes {max_bytes} exceeds ceiling {}",
                    input.max_calldata_bytes_ceiling
                ),
            ));
        }
    }

    if !input
        .recognized_chains
        .iter()
        .any(|c| *c == input.payload.target_chain)
    {
        metrics.rejected_unknown_chain_total += 1;
        return ScreenResult::Rejected(Reason::new(
            ReasonCode::ScreenUnknownChain,
            format!("unrecognized target_chain {}", input.payload.target_chain),
        ));
    }

    if input.payload.deadline_ms <= input.now_ms {
        metrics.rejected_deadline_expired_total += 1;
        return ScreenResult::Rejected(Reason::new(
            ReasonCode::ScreenDeadlineExpired,
            "deadline_ms has already passed",
        ));
    }

    if input.replay_seen {
        metrics.rejected_replay_seen_total += 1;
        return ScreenResult::Rejected(Reason::new(
            ReasonCode::ScreenReplaySeen,
            "request_hash already seen for this intent_id",
        ));
    }

    metrics.passed_total += 1;
    ScreenResult::Passed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_payload() -> IntentPayload {
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

    fn base_input(payload: &IntentPayload) -> ScreenInput<'_> {
        ScreenInput {
            payload,
            now_ms: 1_000,
            max_calldata_bytes_ceiling: 128_000,
            recognized_chains: &["eth-mainnet", "arb-one"],
            replay_seen: false,
        }
    }

    #[test]
    fn passes_well_formed_submission() {
        let payload = base_payload();
        let mut metrics = ScreenMetrics::new();
        let result = evaluate_screen(&base_input(&payload), &mut metrics);
        assert_eq!(result, ScreenResult::Passed);
        assert_eq!(metrics.passed_total(), 1);
    }

    #[test]
    fn rejects_expired_deadline_before_validate() {
        let mut payload = base_payload();
        payload.deadline_ms = 500;
        let mut metrics = ScreenMetrics::new();
        let result = evaluate_screen(&base_input(&payload), &mut metrics);
        match result {
            ScreenResult::Rejected(reason) => {
                assert_eq!(reason.code, "SCREEN_DEADLINE_EXPIRED");
            }
            ScreenResult::Passed => panic!("expected rejection"),
        }
        assert_eq!(metrics.rejected_deadline_expired_total(), 1);
    }

    #[test]
    fn rejects_unrecognized_chain() {
        let mut payload = base_payload();
        payload.target_chain = "made-up-chain".to_string();
        let mut metrics = ScreenMetrics::new();
        let result = evaluate_screen(&base_input(&payload), &mut metrics);
        match result {
            ScreenResult::Rejected(reason) => assert_eq!(reason.code, "SCREEN_UNKNOWN_CHAIN"),
            ScreenResult::Passed => panic!("expected rejection"),
        }
    }

    #[test]
    fn rejects_oversize_calldata() {
        let mut payload = base_payload();
        payload.max_calldata_bytes = Some(999_999);
        let mut metrics = ScreenMetrics::new();
        let result = evaluate_screen(&base_input(&payload), &mut metrics);
        match result {
            ScreenResult::Rejected(reason) => assert_eq!(reason.code, "SCREEN_OVERSIZE"),
            ScreenResult::Passed => panic!("expected rejection"),
        }
    }

    #[test]
    fn rejects_replay_seen() {
        let payload = base_payload();
        let mut input = base_input(&payload);
        input.replay_seen = true;
        let mut metrics = ScreenMetrics::new();
        let result = evaluate_screen(&input, &mut metrics);
        match result {
            ScreenResult::Rejected(reason) => assert_eq!(reason.code, "SCREEN_REPLAY_SEEN"),
            ScreenResult::Passed => panic!("expected rejection"),
        }
    }
}
