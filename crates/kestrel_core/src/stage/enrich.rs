//! Enrich stage: resolve context needed downstream (nonce hint, fee
//! hints). The bounded-retry loop against the enrichment provider lives
//! in the infra crate; this module only decides the terminal outcome
//! once that loop has produced a result or exhausted its retries.
//! Transient provider errors never reject on their own — only a final
//! `None` (retries exhausted) does, and only with a `NETWORK_*` code.

use crate::reason::{Reason, ReasonCode};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnrichedContext {
    pub nonce_hint: u64,
    pub fee_hint_wei: u128,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EnrichResult {
    Advanced(EnrichedContext),
    Rejected(Reason),
}

#[derive(Debug, Default)]
pub struct EnrichMetrics {
    advanced_total: u64,
    rejected_network_total: u64,
}

impl EnrichMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advanced_total(&self) -> u64 {
        self.advanced_total
    }

    pub fn rejected_network_total(&self) -> u64 {
        self.rejected_network_total
    }
}

/// `outcome` is `Some` if the provider eventually answered within the
/// retry budget, `None` if retries were exhausted.
pub fn evaluate_enrich(
    outcome: Option<EnrichedContext>,
    metrics: &mut EnrichMetrics,
) -> EnrichResult {
    match outcome {
        Some(ctx) => {
            metrics.advanced_total += 1;
            EnrichResult::Advanced(ctx)
        }
        None => {
            metrics.rejected_network_total += 1;
            EnrichResult::Rejected(Reason::new(
                ReasonCode::NetworkEnrichmentUnavailable,
                "enrichment provider did not answer within the retry budget",
            ))
        }
    }
}
