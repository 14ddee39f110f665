//! JSONL fixture loader for the Intent Store's event log. Malformed
//! lines are skipped with a warning rather than aborting the load,
//! matching the tolerant-loading convention this codebase uses for
//! other line-delimited inputs.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;

use kestrel_core::model::IntentEvent;
use kestrel_core::state::IntentState;

/// One row of the fixture format: an event row with an optional
/// `from_state` (null for the initial RECEIVED row).
#[derive(Debug, Clone, Deserialize)]
pub struct FixtureRow {
    pub intent_id: String,
    #[serde(default)]
    pub from_state: Option<IntentState>,
    pub to_state: IntentState,
    #[serde(default)]
    pub reason_code: Option<String>,
    #[serde(default)]
    pub reason_category: Option<String>,
    #[serde(default)]
    pub reason_message: Option<String>,
    #[serde(default)]
    pub context: Option<serde_json::Value>,
    #[serde(default)]
    pub corr_id: Option<String>,
    #[serde(default)]
    pub request_hash: Option<String>,
    pub ts: String,
}

impl FixtureRow {
    pub fn into_event(self) -> IntentEvent {
        let mut event = IntentEvent::new(
            self.intent_id,
            self.from_state,
            self.to_state,
            self.corr_id.unwrap_or_default(),
            self.request_hash,
            self.ts,
        );
        event.reason_code = self.reason_code;
        event.reason_category = self.reason_category;
        event.reason_message = self.reason_message;
        event.context = self.context;
        event
    }
}

/// Load a JSONL fixture of event rows, skipping malformed lines.
/// Returns the parsed events plus how many lines were skipped.
pub fn load_fixture(path: impl AsRef<Path>) -> io::Result<(Vec<IntentEvent>, usize)> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);

    let mut events = Vec::new();
    let mut skipped = 0usize;
    for (index, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<FixtureRow>(trimmed) {
            Ok(row) => events.push(row.into_event()),
            Err(e) => {
                tracing::warn!(
                    line = index + 1,
                    path = %path.as_ref().display(),
                    error = %e,
                    "skipping malformed fixture line"
                );
                skipped += 1;
            }
        }
    }

    Ok((events, skipped))
}
