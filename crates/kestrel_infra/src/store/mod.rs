//! Durable storage: the intent/event WAL store and its fixture loader.

pub mod fixture;
pub mod intent_store;

pub use fixture::{FixtureRow, load_fixture};
pub use intent_store::{
    IntentStore, LastEventView, LedgerAppendError, ReplayOutcome, StoreMetrics, SubmitOutcome,
};
