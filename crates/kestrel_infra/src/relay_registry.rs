//! Relay lane-health registry: the stateful half of the Relay Router
//! (C9). Mutated only by an out-of-core health daemon; every other
//! reader goes through `snapshot()` without locking beyond the read
//! guard, matching the locking primitive this codebase already uses
//! for its other read-mostly caches.

use parking_lot::RwLock;
use rand::RngCore;
use std::collections::HashMap;

use kestrel_core::router::{LaneHealth, RelayPlan, RouterTuning, route};

pub struct RelayRegistry {
    lanes: RwLock<HashMap<String, LaneHealth>>,
}

impl RelayRegistry {
    pub fn new() -> Self {
        Self {
            lanes: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace a lane's health record. Called by the owning
    /// health daemon task, never by routing consumers.
    pub fn upsert(&self, lane: LaneHealth) {
        self.lanes.write().insert(lane.lane_id.clone(), lane);
    }

    pub fn remove(&self, lane_id: &str) {
        self.lanes.write().remove(lane_id);
    }

    /// Read-only snapshot of all known lanes, in arbitrary order.
    pub fn snapshot(&self) -> Vec<LaneHealth> {
        self.lanes.read().values().cloned().collect()
    }

    pub fn get(&self, lane_id: &str) -> Option<LaneHealth> {
        self.lanes.read().get(lane_id).cloned()
    }

    /// Route against the current lane snapshot (C9). A thin traced
    /// wrapper around the pure `kestrel_core::router::route`, so the
    /// selection algorithm itself stays free of logging concerns.
    pub fn route(
        &self,
        intent_id: &str,
        atomic: bool,
        tuning: &RouterTuning,
        rng: &mut dyn RngCore,
    ) -> RelayPlan {
        let span = tracing::debug_span!("relay_route", intent_id);
        let _enter = span.enter();

        let lanes = self.snapshot();
        let plan = route(atomic, &lanes, tuning, rng);
        if plan.targets.is_empty() {
            tracing::warn!(intent_id, "route selected no targets; every lane is degraded");
        } else {
            tracing::debug!(intent_id, targets = plan.targets.len(), "route selected lanes");
        }
        plan
    }
}

impl Default for RelayRegistry {
    fn default() -> Self {
        Self::new()
    }
}
