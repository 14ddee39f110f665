//! Validate stage: structural/format checks on any enclosed raw
//! transactions. This is a format gate, not a full signature
//! verifier — the CORE has no key material and no chain client; it
//! only checks that each transaction is well-formed hex of at least
//! signature length.

use crate::reason::{Reason, ReasonCode};

/// Minimum byte length of a hex transaction blob that could plausibly
/// carry an ECDSA signature (r, s, v).
const MIN_SIGNED_TX_BYTES: usize = 65;

pub struct ValidateInput<'a> {
    pub txs: &'a [String],
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidateResult {
    Passed,
    Rejected(Reason),
}

#[derive(Debug, Default)]
pub struct ValidateMetrics {
    rejected_bad_encoding_total: u64,
    rejected_bad_signature_total: u64,
    passed_total: u64,
}

impl ValidateMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejected_bad_encoding_total(&self) -> u64 {
        self.rejected_bad_encoding_total
    }
    pub fn rejected_bad_signature_total(&self) -> u64 {
        self.rejected_bad_signature_total
    }
    pub fn passed_total(&self) -> u64 {
        self.passed_total
    }
}

fn hex_body(tx: &str) -> Option<&str> {
    tx.strip_prefix("0x").or_else(|| tx.strip_prefix("0X"))
}

/// Evaluate the Validate stage over all enclosed raw transactions.
pub fn evaluate_validate(input: &ValidateInput, metrics: &mut ValidateMetrics) -> ValidateResult {
    for tx in input.txs {
        let Some(hex) = hex_body(tx) else {
            metrics.rejected_bad_encoding_total += 1;
            return ValidateResult::Rejected(Reason::new(
                ReasonCode::ValidationBadEncoding,
                "tx is missing the 0x prefix",
            ));
        };

        if hex.is_empty() || hex.len() % 2 != 0 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            metrics.rejected_bad_encoding_total += 1;
            return ValidateResult::Rejected(Reason::new(
                ReasonCode::ValidationBadEncoding,
                "tx is not well-formed hex",
            ));
        }

        if hex.len() / 2 < MIN_SIGNED_TX_BYTES {
            metrics.rejected_bad_signature_total += 1;
            return ValidateResult::Rejected(Reason::new(
                ReasonCode::ValidationBadSignature,
                format!(
                    "tx body is {} bytes, shorter than a signed transaction can be",
                    hex.len() / 2
                ),
            ));
        }
    }

    metrics.passed_total += 1;
    ValidateResult::Passed
}
