//! Policy stage: fee floor, address deny-list, and the capital precheck,
//! in that order. Capital denials are mapped onto their own
//! `POLICY_CAPITAL_*` codes so a client can tell a fee rejection from a
//! capital rejection without parsing the message.

use crate::capital::{
    CapitalDenyReason, CapitalMetrics, CapitalPrecheckInput, CapitalPrecheckResult,
    evaluate_capital_precheck,
};
use crate::reason::{Reason, ReasonCode};

pub struct PolicyInput<'a> {
    pub priority_fee_gwei: f64,
    pub fee_floor_gwei: f64,
    pub from_address: &'a str,
    pub denylist: &'a [&'a str],
    pub capital: CapitalPrecheckInput,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PolicyResult {
    Allowed,
    Rejected(Reason),
}

#[derive(Debug, Default)]
pub struct PolicyMetrics {
    rejected_fee_too_low_total: u64,
    rejected_denylisted_total: u64,
    allowed_total: u64,
    pub capital: CapitalMetrics,
}

impl PolicyMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rejected_fee_too_low_total(&self) -> u64 {
        self.rejected_fee_too_low_total
    }
    pub fn rejected_denylisted_total(&self) -> u64 {
        self.rejected_denylisted_total
    }
    pub fn allowed_total(&self) -> u64 {
        self.allowed_total
    }
}

fn capital_deny_code(reason: CapitalDenyReason) -> ReasonCode {
    match reason {
        CapitalDenyReason::KillSwitch => ReasonCode::PolicyCapitalKillSwitch,
        CapitalDenyReason::DailyLossCap => ReasonCode::PolicyCapitalDailyLossCap,
        CapitalDenyReason::AccountCap => ReasonCode::PolicyCapitalAccountCap,
        CapitalDenyReason::StrategyCap => ReasonCode::PolicyCapitalStrategyCap,
    }
}

/// Evaluate the Policy stage: fee floor, then deny-list, then capital.
pub fn evaluate_policy(input: &PolicyInput, metrics: &mut PolicyMetrics) -> PolicyResult {
    if input.priority_fee_gwei < input.fee_floor_gwei {
        metrics.rejected_fee_too_low_total += 1;
        return PolicyResult::Rejected(Reason::new(
            ReasonCode::PolicyFeeTooLow,
            format!(
                "priority_fee_gwei {} is below floor {}",
                input.priority_fee_gwei, input.fee_floor_gwei
            ),
        ));
    }

    if input.denylist.iter().any(|addr| *addr == input.from_address) {
        metrics.rejected_denylisted_total += 1;
        return PolicyResult::Rejected(Reason::new(
            ReasonCode::PolicyDenylisted,
            format!("from_address {} is denylisted", input.from_address),
        ));
    }

    match evaluate_capital_precheck(&input.capital, &mut metrics.capital) {
        CapitalPrecheckResult::Allowed { .. } => {
            metrics.allowed_total += 1;
            PolicyResult::Allowed
        }
        CapitalPrecheckResult::Denied {
            reason,
            account_used,
            account_cap,
            strategy_used,
            strategy_cap,
        } => PolicyResult::Rejected(
            Reason::new(
                capital_deny_code(reason),
                format!("capital precheck denied: {}", reason.as_str()),
            )
            .with_context(serde_json::json!({
                "accountUsed": account_used,
                "accountCap": account_cap,
                "strategyUsed": strategy_used,
                "strategyCap": strategy_cap,
            })),
        ),
    }
}
