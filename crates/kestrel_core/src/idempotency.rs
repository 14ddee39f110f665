//! Idempotency / correlation support: canonical request hashing and
//! duplicate-submission classification.
//!
//! The durable lookup (by `intent_id`) and correlation-id minting live in
//! the infra crate; this module only covers the pure, deterministic half.

use xxhash_rust::xxh64::xxh64;

/// Canonicalize a payload and hash it.
///
/// `serde_json::Value`'s map is backed by a `BTreeMap` (this crate does
/// not enable serde_json's `preserve_order` feature), so serializing
/// through `Value` always emits object keys in sorted order regardless
/// of the client's original field order. Two structurally-equal
/// payloads therefore always hash identically.
pub fn compute_request_hash(payload: &serde_json::Value) -> Result<u64, serde_json::Error> {
    let canonical = serde_json::to_vec(payload)?;
    Ok(xxh64(&canonical, 0))
}

/// Hex-format a request hash for storage/display.
pub fn format_request_hash(hash: u64) -> String {
    format!("{hash:016x}")
}

/// Outcome of comparing an incoming request hash against an existing
/// intent's stored hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdempotencyOutcome {
    /// No prior intent with this id; proceed to create one.
    Fresh,
    /// Same `(intent_id, request_hash)`; replay the cached decision.
    CachedReplay,
    /// Same `intent_id`, different `request_hash`.
    Conflict,
}

/// Classify a submission against a possibly-existing stored hash.
pub fn classify_idempotency(
    existing_hash: Option<&str>,
    incoming_hash: &str,
) -> IdempotencyOutcome {
    match existing_hash {
        None => IdempotencyOutcome::Fresh,
        Some(h) if h == incoming_hash => IdempotencyOutcome::CachedReplay,
        Some(_) => IdempotencyOutcome::Conflict,
    }
}
