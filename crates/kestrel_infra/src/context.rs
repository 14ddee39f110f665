//! Application Context (SS9): the explicit handle bundle every worker
//! is constructed with, in place of singleton connectors or
//! process-wide mutable registries.

use std::sync::Arc;

use crate::audit::AuditLog;
use crate::capital_guard::CapitalGuard;
use crate::config_daemon::ConfigHandle;
use crate::metrics::Metrics;
use crate::relay_registry::RelayRegistry;
use crate::store::IntentStore;
use crate::worker_pool::CancellationSignal;

use parking_lot::Mutex;

/// Everything a worker needs to process one intent, owned once at
/// startup and handed out by reference or cheap clone.
pub struct AppContext {
    pub store: Arc<Mutex<IntentStore>>,
    pub config: ConfigHandle,
    pub relays: Arc<RelayRegistry>,
    pub capital: Arc<CapitalGuard>,
    pub metrics: Arc<Metrics>,
    pub audit: Arc<AuditLog>,
    pub cancel: CancellationSignal,
}

impl AppContext {
    pub fn new(
        store: IntentStore,
        config: ConfigHandle,
        relays: RelayRegistry,
        capital: CapitalGuard,
        metrics: Metrics,
        audit: AuditLog,
    ) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            config,
            relays: Arc::new(relays),
            capital: Arc::new(capital),
            metrics: Arc::new(metrics),
            audit: Arc::new(audit),
            cancel: CancellationSignal::new(),
        }
    }
}

impl Clone for AppContext {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            config: self.config.clone(),
            relays: Arc::clone(&self.relays),
            capital: Arc::clone(&self.capital),
            metrics: Arc::clone(&self.metrics),
            audit: Arc::clone(&self.audit),
            cancel: self.cancel.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_daemon::ConfigDaemon;

    #[test]
    fn clone_shares_the_same_underlying_store() {
        let (_, handle) = ConfigDaemon::new();
        let ctx = AppContext::new(
            IntentStore::new(),
            handle,
            RelayRegistry::new(),
            CapitalGuard::new(1_000.0, 1_000.0, 1_000.0),
            Metrics::new().unwrap(),
            AuditLog::new(std::env::temp_dir().join("kestrel-context-test.jsonl")),
        );
        let cloned = ctx.clone();
        assert!(Arc::ptr_eq(&ctx.store, &cloned.store));
        assert!(Arc::ptr_eq(&ctx.relays, &cloned.relays));
    }
}
