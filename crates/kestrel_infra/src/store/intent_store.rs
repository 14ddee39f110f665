//! Durable Intent Store (C2) and Transition Executor (C3).
//!
//! Intents and their events are captured as append-only WAL records,
//! exactly mirroring the write-then-apply discipline and line-numbered
//! parse-error reporting this codebase already uses for its other
//! append-only ledger. On startup the WAL is replayed in file order to
//! rebuild an in-memory `HashMap<intent_id, Intent>` index.

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use kestrel_core::idempotency::{IdempotencyOutcome, classify_idempotency};
use kestrel_core::model::{Intent, IntentEvent};
use kestrel_core::reason::Reason;
use kestrel_core::state::{IntentState, can};

/// Outcome of the submission boundary: either a fresh intent was
/// created, or an existing one is being replayed/conflicted against.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created(Intent),
    CachedReplay(Intent),
    Conflict,
}

/// Error returned by store operations.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerAppendError {
    DuplicateIntentId,
    IntentNotFound,
    InvalidTransition { from: IntentState, to: IntentState },
    QueueFull,
    WriteFailed { reason: String },
}

impl std::fmt::Display for LedgerAppendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateIntentId => write!(f, "duplicate intent_id"),
            Self::IntentNotFound => write!(f, "intent_id not found"),
            Self::InvalidTransition { from, to } => write!(f, "invalid transition {from} -> {to}"),
            Self::QueueFull => write!(f, "store capacity exhausted"),
            Self::WriteFailed { reason } => write!(f, "wal write failed: {reason}"),
        }
    }
}

impl std::error::Error for LedgerAppendError {}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum StoreRecord {
    IntentCreated { intent: Intent },
    Transitioned { event: IntentEvent },
}

/// Observability counters for the store.
#[derive(Debug, Default)]
pub struct StoreMetrics {
    wal_write_errors: u64,
    creates_total: u64,
    advances_total: u64,
    idempotent_replays_total: u64,
}

impl StoreMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn wal_write_errors(&self) -> u64 {
        self.wal_write_errors
    }
    pub fn creates_total(&self) -> u64 {
        self.creates_total
    }
    pub fn advances_total(&self) -> u64 {
        self.advances_total
    }
    pub fn idempotent_replays_total(&self) -> u64 {
        self.idempotent_replays_total
    }
}

/// Outcome of replaying the store on startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayOutcome {
    pub intents_replayed: usize,
    pub in_flight_count: usize,
    pub in_flight_ids: Vec<String>,
}

/// One row of the on-demand materialized view `intent_last_event`.
#[derive(Debug, Clone, PartialEq)]
pub struct LastEventView {
    pub intent_id: String,
    pub to_state: IntentState,
    pub ts: String,
}

pub struct IntentStore {
    latest_by_id: HashMap<String, Intent>,
    storage_path: Option<PathBuf>,
}

impl IntentStore {
    pub fn new() -> Self {
        Self {
            latest_by_id: HashMap::new(),
            storage_path: None,
        }
    }

    /// Create/load a store backed by a JSONL file, replaying it to
    /// rebuild the in-memory index.
    pub fn with_storage_path(storage_path: impl AsRef<Path>) -> io::Result<Self> {
        let path = storage_path.as_ref().to_path_buf();
        let records = read_records_from_path(&path)?;
        let latest_by_id = reduce_records(&records)
            .map_err(|reason| io::Error::new(io::ErrorKind::InvalidData, reason))?;
        Ok(Self {
            latest_by_id,
            storage_path: Some(path),
        })
    }

    pub fn storage_path(&self) -> Option<&Path> {
        self.storage_path.as_deref()
    }

    /// `create(intent_id, payload, request_hash, correlation_id)`. Fails
    /// with `DuplicateIntentId` if the id already exists.
    pub fn create(
        &mut self,
        intent_id: &str,
        payload: serde_json::Value,
        request_hash: &str,
        correlation_id: &str,
        now_ts: &str,
        metrics: &mut StoreMetrics,
    ) -> Result<Intent, LedgerAppendError> {
        if self.latest_by_id.contains_key(intent_id) {
            return Err(LedgerAppendError::DuplicateIntentId);
        }

        let intent = Intent::new(intent_id, payload, request_hash, correlation_id, now_ts);
        let event = IntentEvent::new(
            intent_id,
            None,
            IntentState::Received,
            correlation_id,
            Some(request_hash.to_string()),
            now_ts,
        );

        self.persist(&StoreRecord::IntentCreated {
            intent: intent.clone(),
        })
        .map_err(|reason| {
            metrics.wal_write_errors += 1;
            LedgerAppendError::WriteFailed { reason }
        })?;
        self.persist(&StoreRecord::Transitioned { event })
            .map_err(|reason| {
                metrics.wal_write_errors += 1;
                LedgerAppendError::WriteFailed { reason }
            })?;

        self.latest_by_id.insert(intent_id.to_string(), intent.clone());
        metrics.creates_total += 1;
        Ok(intent)
    }

    pub fn get(&self, intent_id: &str) -> Option<&Intent> {
        self.latest_by_id.get(intent_id)
    }

    /// The C11 submission boundary: classify against any existing row
    /// with this `intent_id`, minting a fresh `correlation_id` only for
    /// a genuinely new intent.
    pub fn submit(
        &mut self,
        intent_id: &str,
        payload: serde_json::Value,
        request_hash: &str,
        now_ts: &str,
        metrics: &mut StoreMetrics,
    ) -> Result<SubmitOutcome, LedgerAppendError> {
        let span = tracing::info_span!("intent_submit", intent_id);
        let _enter = span.enter();

        let existing = self.latest_by_id.get(intent_id);
        match classify_idempotency(existing.map(|i| i.request_hash.as_str()), request_hash) {
            IdempotencyOutcome::Fresh => {
                let correlation_id = uuid::Uuid::new_v4().to_string();
                let intent = self.create(intent_id, payload, request_hash, &correlation_id, now_ts, metrics)?;
                tracing::debug!(intent_id, corr_id = %correlation_id, "submission accepted as fresh intent");
                Ok(SubmitOutcome::Created(intent))
            }
            IdempotencyOutcome::CachedReplay => {
                metrics.idempotent_replays_total += 1;
                tracing::debug!(intent_id, "submission replayed from cached request_hash");
                Ok(SubmitOutcome::CachedReplay(existing.expect("checked above").clone()))
            }
            IdempotencyOutcome::Conflict => {
                tracing::warn!(intent_id, "submission conflicts with a prior request_hash");
                Ok(SubmitOutcome::Conflict)
            }
        }
    }

    /// `advance(intent_id, to, corr_id, request_hash?, reason?)` — the
    /// C3 Transition Executor algorithm: FSM check, optimistic CAS,
    /// audit-first event append.
    pub fn advance(
        &mut self,
        intent_id: &str,
        to: IntentState,
        corr_id: &str,
        request_hash: Option<&str>,
        reason: Option<Reason>,
        now_ts: &str,
        metrics: &mut StoreMetrics,
    ) -> Result<IntentState, LedgerAppendError> {
        let span = tracing::info_span!("intent_advance", intent_id, corr_id, to = %to);
        let _enter = span.enter();

        let current = self
            .latest_by_id
            .get(intent_id)
            .ok_or_else(|| {
                tracing::warn!(intent_id, "advance on unknown intent_id");
                LedgerAppendError::IntentNotFound
            })?;
        let from = current.state;
        let expected_version = current.version;

        if !can(from, to) {
            if from == to {
                tracing::trace!(intent_id, %from, "advance to current state is a no-op");
                return Ok(from);
            }
            tracing::warn!(intent_id, %from, %to, "illegal state transition rejected");
            return Err(LedgerAppendError::InvalidTransition { from, to });
        }

        let mut event = IntentEvent::new(
            intent_id,
            Some(from),
            to,
            corr_id,
            request_hash.map(str::to_string),
            now_ts,
        );
        if let Some(r) = &reason {
            event = event.with_reason(r);
        }

        self.persist(&StoreRecord::Transitioned {
            event: event.clone(),
        })
        .map_err(|reason| {
            metrics.wal_write_errors += 1;
            LedgerAppendError::WriteFailed { reason }
        })?;

        let record = self.latest_by_id.get_mut(intent_id).expect("checked above");
        if record.version != expected_version {
            // Lost the race to a concurrent writer between the read above
            // and this point; re-read and treat a matching target as a
            // no-op, matching the optimistic-concurrency discipline.
            return if record.state == to {
                Ok(to)
            } else {
                Err(LedgerAppendError::InvalidTransition {
                    from: record.state,
                    to,
                })
            };
        }

        record.state = to;
        record.version += 1;
        if to.is_terminal() {
            record.last_reason = reason;
        }
        metrics.advances_total += 1;
        if to == IntentState::Rejected || to == IntentState::Dropped {
            tracing::warn!(intent_id, corr_id, %from, %to, "intent reached a failure terminal state");
        } else {
            tracing::debug!(intent_id, corr_id, %from, %to, "intent advanced");
        }
        Ok(to)
    }

    /// Replay summary: how many intents are non-terminal.
    pub fn replay(&self) -> ReplayOutcome {
        let mut in_flight_ids = Vec::new();
        for intent in self.latest_by_id.values() {
            if !intent.state.is_terminal() {
                in_flight_ids.push(intent.intent_id.clone());
            }
        }
        ReplayOutcome {
            intents_replayed: self.latest_by_id.len(),
            in_flight_count: in_flight_ids.len(),
            in_flight_ids,
        }
    }

    /// On-demand materialized view; not a background task (§9).
    pub fn last_event_view(&self) -> Vec<LastEventView> {
        self.latest_by_id
            .values()
            .map(|intent| LastEventView {
                intent_id: intent.intent_id.clone(),
                to_state: intent.state,
                ts: intent.received_at.clone(),
            })
            .collect()
    }

    fn persist(&self, record: &StoreRecord) -> Result<(), String> {
        let Some(path) = &self.storage_path else {
            return Ok(());
        };
        write_record_to_path(path, record)
    }
}

impl Default for IntentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn reduce_records(records: &[StoreRecord]) -> Result<HashMap<String, Intent>, String> {
    let mut latest_by_id: HashMap<String, Intent> = HashMap::new();
    for record in records {
        match record {
            StoreRecord::IntentCreated { intent } => {
                latest_by_id.insert(intent.intent_id.clone(), intent.clone());
            }
            StoreRecord::Transitioned { event } => {
                let intent = latest_by_id
                    .get_mut(&event.intent_id)
                    .ok_or_else(|| format!("transition missing intent_id: {}", event.intent_id))?;
                intent.state = event.to_state;
                // The synthetic creation event (from_state = None) is not a
                // real transition; create() itself never bumps version for
                // it, so replay must not either.
                if event.from_state.is_some() {
                    intent.version += 1;
                }
                if event.to_state.is_terminal() {
                    if let Some(code) = &event.reason_code {
                        intent.last_reason = Some(
                            Reason::new(
                                kestrel_core::reason::ReasonCode::InternalError,
                                event.reason_message.clone().unwrap_or_default(),
                            )
                            .with_context(serde_json::json!({ "code": code })),
                        );
                    }
                }
            }
        }
    }
    Ok(latest_by_id)
}

fn write_record_to_path(path: &Path, record: &StoreRecord) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("failed to create wal parent directory {}: {e}", parent.display()))?;
    }

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| format!("failed to open wal {}: {e}", path.display()))?;
    let line =
        serde_json::to_string(record).map_err(|e| format!("failed to encode wal record: {e}"))?;
    file.write_all(line.as_bytes())
        .map_err(|e| format!("failed to write wal record {}: {e}", path.display()))?;
    file.write_all(b"\n")
        .map_err(|e| format!("failed to write wal newline {}: {e}", path.display()))?;
    file.flush()
        .map_err(|e| format!("failed to flush wal {}: {e}", path.display()))
}

fn read_records_from_path(path: &Path) -> io::Result<Vec<StoreRecord>> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new()
        .create(true)
        .read(true)
        .append(true)
        .open(path)?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (index, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let record: StoreRecord = serde_json::from_str(trimmed).map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("invalid wal record at line {} in {}: {e}", index + 1, path.display()),
            )
        })?;
        records.push(record);
    }

    Ok(records)
}
