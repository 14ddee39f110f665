//! Config Daemon (C12): the mutable half of hot-updatable tuning.
//!
//! Holds a `ConfigSnapshot` behind a `tokio::sync::watch` channel.
//! Consumers clone a receiver once at startup and pull the latest
//! snapshot at the start of each decision; the daemon never calls back
//! into them synchronously.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::watch;

use kestrel_core::config::{ConfigError, ConfigSnapshot};

pub struct ConfigDaemon {
    sender: watch::Sender<Arc<ConfigSnapshot>>,
}

/// A read-only handle to the live snapshot. Cheap to clone.
#[derive(Clone)]
pub struct ConfigHandle {
    receiver: watch::Receiver<Arc<ConfigSnapshot>>,
}

impl ConfigHandle {
    /// Latest published snapshot. Never blocks.
    pub fn current(&self) -> Arc<ConfigSnapshot> {
        self.receiver.borrow().clone()
    }
}

impl ConfigDaemon {
    pub fn new() -> (Self, ConfigHandle) {
        Self::with_snapshot(ConfigSnapshot::defaults())
    }

    pub fn with_snapshot(initial: ConfigSnapshot) -> (Self, ConfigHandle) {
        let (sender, receiver) = watch::channel(Arc::new(initial));
        (Self { sender }, ConfigHandle { receiver })
    }

    /// Apply a raw override map. Rejects any key not in the enumerated
    /// key set; never absorbs unknown keys silently.
    pub fn apply_overrides(&self, raw: &BTreeMap<String, f64>) -> Result<(), ConfigError> {
        let span = tracing::debug_span!("config_apply_overrides", keys = raw.len());
        let _enter = span.enter();

        let snapshot = match ConfigSnapshot::from_overrides(raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "rejected config overrides");
                return Err(e);
            }
        };
        tracing::info!("applied config overrides");
        // A receiver side can never disappear while `self` is alive, since
        // `ConfigDaemon` itself holds the sender half.
        let _ = self.sender.send(Arc::new(snapshot));
        Ok(())
    }

    pub fn handle(&self) -> ConfigHandle {
        ConfigHandle {
            receiver: self.sender.subscribe(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_observes_defaults_initially() {
        let (_daemon, handle) = ConfigDaemon::new();
        assert_eq!(handle.current().router_base_ms(), 200.0);
    }

    #[test]
    fn apply_overrides_is_visible_to_existing_handles() {
        let (daemon, handle) = ConfigDaemon::new();
        let mut raw = BTreeMap::new();
        raw.insert("router.baseMs".to_string(), 500.0);
        daemon.apply_overrides(&raw).unwrap();
        assert_eq!(handle.current().router_base_ms(), 500.0);
    }

    #[test]
    fn apply_overrides_rejects_unknown_key() {
        let (daemon, _handle) = ConfigDaemon::new();
        let mut raw = BTreeMap::new();
        raw.insert("bogus.key".to_string(), 1.0);
        assert!(daemon.apply_overrides(&raw).is_err());
    }

    #[test]
    fn new_handle_after_update_sees_latest_snapshot() {
        let (daemon, _first_handle) = ConfigDaemon::new();
        let mut raw = BTreeMap::new();
        raw.insert("capital.kill".to_string(), 1.0);
        daemon.apply_overrides(&raw).unwrap();
        let later_handle = daemon.handle();
        assert!(later_handle.current().capital_kill());
    }
}
