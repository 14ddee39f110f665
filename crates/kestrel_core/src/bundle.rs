//! Bundle assembly (C6): pure construction of a `BundlePlan` from a
//! validated intent and simulation outputs. No network I/O; the result
//! is an ephemeral, in-process value handed to the anti-MEV mitigator.

use serde::{Deserialize, Serialize};

/// Transaction template kind, also the sort priority within a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    Buy,
    Sell,
    Settle,
    Decoy,
}

impl TxKind {
    fn priority(self) -> u8 {
        match self {
            TxKind::Buy => 0,
            TxKind::Sell => 1,
            TxKind::Settle => 2,
            TxKind::Decoy => 3,
        }
    }

    fn name(self) -> &'static str {
        match self {
            TxKind::Buy => "buy",
            TxKind::Sell => "sell",
            TxKind::Settle => "settle",
            TxKind::Decoy => "decoy",
        }
    }
}

/// One transaction template in a bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxTemplate {
    pub kind: TxKind,
    pub to: String,
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<u128>,
    pub atomic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salt: Option<String>,
}

impl TxTemplate {
    pub fn new(kind: TxKind, to: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            kind,
            to: to.into(),
            data: data.into(),
            value: None,
            atomic: true,
            salt: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GasPolicy {
    pub base_fee_max: u128,
    pub priority_fee: u128,
    pub bump_step: u128,
    pub bump_cap: u128,
}

impl GasPolicy {
    /// `bump_step` is clamped to `bump_cap` so the invariant always holds.
    pub fn new(base_fee_max: u128, priority_fee: u128, bump_step: u128, bump_cap: u128) -> Self {
        Self {
            base_fee_max,
            priority_fee,
            bump_step: bump_step.min(bump_cap),
            bump_cap,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplacementPolicy {
    pub nonce: u64,
    pub max_bumps: u32,
    pub bump_step: u128,
    pub bump_cap: u128,
}

impl ReplacementPolicy {
    pub fn new(nonce: u64, max_bumps: u32, bump_step: u128, bump_cap: u128) -> Self {
        Self {
            nonce,
            max_bumps,
            bump_step: bump_step.min(bump_cap),
            bump_cap,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundlePlan {
    pub tx_templates: Vec<TxTemplate>,
    pub gas_policy: GasPolicy,
    pub replacement_policy: ReplacementPolicy,
    pub deadline: i64,
    pub atomic: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<i64>,
}

/// Inputs needed to assemble a plan.
#[derive(Debug, Clone)]
pub struct BundlePlanInput {
    pub tx_templates: Vec<TxTemplate>,
    pub now_ms: i64,
    pub deadline_secs: i64,
    pub atomic: bool,
    pub base_fee_max: u128,
    pub priority_fee: u128,
    pub bump_step: u128,
    pub bump_cap: u128,
    pub nonce: u64,
    pub max_bumps: u32,
}

/// Assemble a `BundlePlan`: order templates by kind priority (ties
/// broken by kind name, stably), stamp them with the bundle's atomic
/// flag, and derive gas/replacement policy with the bump invariant.
pub fn build_bundle_plan(input: BundlePlanInput) -> BundlePlan {
    let mut templates = input.tx_templates;
    templates.sort_by(|a, b| {
        a.kind
            .priority()
            .cmp(&b.kind.priority())
            .then_with(|| a.kind.name().cmp(b.kind.name()))
    });
    for template in templates.iter_mut() {
        template.atomic = input.atomic;
    }

    BundlePlan {
        tx_templates: templates,
        gas_policy: GasPolicy::new(
            input.base_fee_max,
            input.priority_fee,
            input.bump_step,
            input.bump_cap,
        ),
        replacement_policy: ReplacementPolicy::new(
            input.nonce,
            input.max_bumps,
            input.bump_step,
            input.bump_cap,
        ),
        deadline: input.now_ms + input.deadline_secs * 1000,
        atomic: input.atomic,
        not_before: None,
    }
}
