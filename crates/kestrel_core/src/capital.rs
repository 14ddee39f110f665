//! Capital policy precheck (C5): fail-closed, evaluated in a fixed
//! order, consulted during the Policy stage.
//!
//! The live counters (`CapitalUsage`) are process-wide shared state
//! guarded by a mutex in the infra crate; this module only holds the
//! pure evaluation and the clamp-to-zero counter math, so the decision
//! logic is unit-tested without any locking involved.

/// Inputs to one precheck decision. All monetary fields share a unit
/// (e.g. USD notional); the caller is responsible for consistent units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapitalPrecheckInput {
    pub kill_switch: bool,
    pub daily_loss: f64,
    pub daily_loss_cap: f64,
    pub account_used: f64,
    pub account_cap: f64,
    pub strategy_used: f64,
    pub strategy_cap: f64,
    pub notional: f64,
}

/// Why a precheck denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapitalDenyReason {
    KillSwitch,
    DailyLossCap,
    AccountCap,
    StrategyCap,
}

impl CapitalDenyReason {
    pub fn as_str(self) -> &'static str {
        match self {
            CapitalDenyReason::KillSwitch => "kill_switch",
            CapitalDenyReason::DailyLossCap => "dailyLossCap",
            CapitalDenyReason::AccountCap => "accountCap",
            CapitalDenyReason::StrategyCap => "strategyCap",
        }
    }
}

/// Precheck decision with numeric snapshots for the audit log.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CapitalPrecheckResult {
    Allowed {
        account_used: f64,
        account_cap: f64,
        strategy_used: f64,
        strategy_cap: f64,
    },
    Denied {
        reason: CapitalDenyReason,
        account_used: f64,
        account_cap: f64,
        strategy_used: f64,
        strategy_cap: f64,
    },
}

/// Per-reason deny counters plus an allowed counter.
#[derive(Debug, Default)]
pub struct CapitalMetrics {
    denied_total: u64,
    denied_kill_switch_total: u64,
    denied_daily_loss_cap_total: u64,
    denied_account_cap_total: u64,
    denied_strategy_cap_total: u64,
    allowed_total: u64,
}

impl CapitalMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn denied_total(&self) -> u64 {
        self.denied_total
    }
    pub fn denied_kill_switch_total(&self) -> u64 {
        self.denied_kill_switch_total
    }
    pub fn denied_daily_loss_cap_total(&self) -> u64 {
        self.denied_daily_loss_cap_total
    }
    pub fn denied_account_cap_total(&self) -> u64 {
        self.denied_account_cap_total
    }
    pub fn denied_strategy_cap_total(&self) -> u64 {
        self.denied_strategy_cap_total
    }
    pub fn allowed_total(&self) -> u64 {
        self.allowed_total
    }

    fn record_denied(&mut self, reason: CapitalDenyReason) {
        self.denied_total += 1;
        match reason {
            CapitalDenyReason::KillSwitch => self.denied_kill_switch_total += 1,
            CapitalDenyReason::DailyLossCap => self.denied_daily_loss_cap_total += 1,
            CapitalDenyReason::AccountCap => self.denied_account_cap_total += 1,
            CapitalDenyReason::StrategyCap => self.denied_strategy_cap_total += 1,
        }
    }

    fn record_allowed(&mut self) {
        self.allowed_total += 1;
    }
}

/// Evaluate the fixed fail-closed ordering: kill switch, daily loss cap,
/// account cap, strategy cap, allow. A denial never mutates counters;
/// the caller commits the notional only after an `Allowed` result.
pub fn evaluate_capital_precheck(
    input: &CapitalPrecheckInput,
    metrics: &mut CapitalMetrics,
) -> CapitalPrecheckResult {
    let snapshot = |reason| CapitalPrecheckResult::Denied {
        reason,
        account_used: input.account_used,
        account_cap: input.account_cap,
        strategy_used: input.strategy_used,
        strategy_cap: input.strategy_cap,
    };

    if input.kill_switch {
        metrics.record_denied(CapitalDenyReason::KillSwitch);
        return snapshot(CapitalDenyReason::KillSwitch);
    }
    if input.daily_loss >= input.daily_loss_cap {
        metrics.record_denied(CapitalDenyReason::DailyLossCap);
        return snapshot(CapitalDenyReason::DailyLossCap);
    }
    if input.account_used + input.notional > input.account_cap {
        metrics.record_denied(CapitalDenyReason::AccountCap);
        return snapshot(CapitalDenyReason::AccountCap);
    }
    if input.strategy_used + input.notional > input.strategy_cap {
        metrics.record_denied(CapitalDenyReason::StrategyCap);
        return snapshot(CapitalDenyReason::StrategyCap);
    }

    metrics.record_allowed();
    CapitalPrecheckResult::Allowed {
        account_used: input.account_used,
        account_cap: input.account_cap,
        strategy_used: input.strategy_used,
        strategy_cap: input.strategy_cap,
    }
}

/// Apply a delta to a counter, clamping the result to `>= 0`.
pub fn clamp_add(current: f64, delta: f64) -> f64 {
    (current + delta).max(0.0)
}
