//! Capital Guard: the stateful half of the Capital Policy (C5).
//!
//! Owns the live `CapitalUsage` counters behind a `parking_lot::Mutex` so
//! the read-modify-compare sequence in `precheck` is atomic, and rolls
//! the daily-loss bucket over at UTC calendar-day boundaries.

use chrono::Utc;
use parking_lot::Mutex;

use kestrel_core::capital::{
    CapitalMetrics, CapitalPrecheckInput, CapitalPrecheckResult, clamp_add,
    evaluate_capital_precheck,
};

#[derive(Debug, Clone, Copy, Default)]
struct CapitalUsage {
    account_used: f64,
    strategy_used: f64,
    daily_loss: f64,
    day_key: u32,
}

fn utc_day_key() -> u32 {
    Utc::now().date_naive().num_days_from_ce() as u32
}

pub struct CapitalGuard {
    usage: Mutex<CapitalUsage>,
    account_cap: f64,
    strategy_cap: f64,
    daily_loss_cap: f64,
    kill_switch: Mutex<bool>,
}

impl CapitalGuard {
    pub fn new(account_cap: f64, strategy_cap: f64, daily_loss_cap: f64) -> Self {
        Self {
            usage: Mutex::new(CapitalUsage {
                day_key: utc_day_key(),
                ..Default::default()
            }),
            account_cap,
            strategy_cap,
            daily_loss_cap,
            kill_switch: Mutex::new(false),
        }
    }

    pub fn set_kill_switch(&self, on: bool) {
        *self.kill_switch.lock() = on;
    }

    /// `precheck(ctx) -> {allow, reason?, limits}`. Rolls the daily-loss
    /// bucket if the UTC day has advanced since the last decision.
    pub fn precheck(
        &self,
        intent_id: &str,
        notional: f64,
        metrics: &mut CapitalMetrics,
    ) -> CapitalPrecheckResult {
        let span = tracing::info_span!("capital_precheck", intent_id, notional);
        let _enter = span.enter();

        let mut usage = self.usage.lock();
        let today = utc_day_key();
        if usage.day_key != today {
            usage.daily_loss = 0.0;
            usage.day_key = today;
        }

        let input = CapitalPrecheckInput {
            kill_switch: *self.kill_switch.lock(),
            daily_loss: usage.daily_loss,
            daily_loss_cap: self.daily_loss_cap,
            account_used: usage.account_used,
            account_cap: self.account_cap,
            strategy_used: usage.strategy_used,
            strategy_cap: self.strategy_cap,
            notional,
        };

        let result = evaluate_capital_precheck(&input, metrics);
        match result {
            CapitalPrecheckResult::Allowed { .. } => {
                usage.account_used = clamp_add(usage.account_used, notional);
                usage.strategy_used = clamp_add(usage.strategy_used, notional);
                tracing::debug!(intent_id, "capital precheck allowed");
            }
            CapitalPrecheckResult::Denied { reason, .. } => {
                tracing::warn!(intent_id, reason = reason.as_str(), "capital precheck denied");
            }
        }
        result
    }

    /// `updateLoss(delta)`, clamped to `>= 0`.
    pub fn update_loss(&self, delta: f64) {
        let mut usage = self.usage.lock();
        let today = utc_day_key();
        if usage.day_key != today {
            usage.daily_loss = 0.0;
            usage.day_key = today;
        }
        usage.daily_loss = clamp_add(usage.daily_loss, delta);
    }

    /// `updateUsage(account, strategy, delta)`, clamped to `>= 0`.
    pub fn update_usage(&self, account_delta: f64, strategy_delta: f64) {
        let mut usage = self.usage.lock();
        usage.account_used = clamp_add(usage.account_used, account_delta);
        usage.strategy_used = clamp_add(usage.strategy_used, strategy_delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allowed_precheck_commits_notional() {
        let guard = CapitalGuard::new(10_000.0, 5_000.0, 1_000.0);
        let mut metrics = CapitalMetrics::new();
        let result = guard.precheck("intent-1", 100.0, &mut metrics);
        assert!(matches!(result, CapitalPrecheckResult::Allowed { .. }));
        let result2 = guard.precheck("intent-1", 0.0, &mut metrics);
        if let CapitalPrecheckResult::Allowed { account_used, .. } = result2 {
            assert_eq!(account_used, 100.0);
        } else {
            panic!("expected allowed");
        }
    }

    #[test]
    fn kill_switch_denies_every_precheck() {
        let guard = CapitalGuard::new(10_000.0, 5_000.0, 1_000.0);
        guard.set_kill_switch(true);
        let mut metrics = CapitalMetrics::new();
        let result = guard.precheck("intent-1", 1.0, &mut metrics);
        assert!(matches!(result, CapitalPrecheckResult::Denied { .. }));
        assert_eq!(metrics.denied_kill_switch_total(), 1);
    }

    #[test]
    fn denied_precheck_never_commits_notional() {
        let guard = CapitalGuard::new(100.0, 5_000.0, 1_000.0);
        let mut metrics = CapitalMetrics::new();
        let first = guard.precheck("intent-1", 90.0, &mut metrics);
        assert!(matches!(first, CapitalPrecheckResult::Allowed { .. }));
        let second = guard.precheck("intent-1", 50.0, &mut metrics);
        assert!(matches!(second, CapitalPrecheckResult::Denied { .. }));
        let third = guard.precheck("intent-1", 0.0, &mut metrics);
        if let CapitalPrecheckResult::Allowed { account_used, .. } = third {
            assert_eq!(account_used, 90.0);
        } else {
            panic!("expected allowed");
        }
    }

    #[test]
    fn update_loss_and_usage_clamp_to_zero() {
        let guard = CapitalGuard::new(100.0, 100.0, 100.0);
        guard.update_loss(-50.0);
        guard.update_usage(-10.0, -10.0);
        let mut metrics = CapitalMetrics::new();
        let result = guard.precheck("intent-1", 0.0, &mut metrics);
        if let CapitalPrecheckResult::Allowed { account_used, strategy_used, .. } = result {
            assert_eq!(account_used, 0.0);
            assert_eq!(strategy_used, 0.0);
        } else {
            panic!("expected allowed");
        }
    }
}
