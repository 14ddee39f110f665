//! Audit Log (C14): an append-only JSONL trail of the decisions the
//! other components make, keyed by logical subject. Mirrors the same
//! append/replay idiom the intent store's WAL uses, applied to a
//! second, non-authoritative log.

use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditSubject {
    BundlePlan,
    RelayPlan,
    CapitalDecision,
    AntiMevAction,
    ClientSubmission,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub subject: AuditSubject,
    pub intent_id: String,
    pub correlation_id: String,
    pub ts: String,
    pub detail: Value,
}

pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one record, stamping `ts` with the current UTC instant.
    pub fn record(
        &self,
        subject: AuditSubject,
        intent_id: &str,
        correlation_id: &str,
        detail: Value,
    ) -> io::Result<()> {
        let record = AuditRecord {
            subject,
            intent_id: intent_id.to_string(),
            correlation_id: correlation_id.to_string(),
            ts: Utc::now().to_rfc3339(),
            detail,
        };
        write_record_to_path(&self.path, &record)
    }

    /// Replay the full log. Malformed lines are skipped with a warning,
    /// not fatal: the audit trail is diagnostic, not authoritative.
    pub fn read_all(&self) -> io::Result<Vec<AuditRecord>> {
        read_records_from_path(&self.path)
    }

    pub fn read_for_subject(&self, subject: AuditSubject) -> io::Result<Vec<AuditRecord>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|r| r.subject == subject)
            .collect())
    }
}

fn write_record_to_path(path: &Path, record: &AuditRecord) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    let line = serde_json::to_string(record)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
    file.write_all(line.as_bytes())?;
    file.write_all(b"\n")?;
    file.flush()
}

fn read_records_from_path(path: &Path) -> io::Result<Vec<AuditRecord>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let file = std::fs::File::open(path)?;
    let reader = io::BufReader::new(file);
    let mut records = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<AuditRecord>(&line) {
            Ok(record) => records.push(record),
            Err(error) => {
                tracing::warn!(
                    line = line_no + 1,
                    path = %path.display(),
                    %error,
                    "skipping malformed audit line"
                );
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;

    fn temp_path(name: &str) -> PathBuf {
        let mut p = temp_dir();
        p.push(format!("kestrel-audit-test-{name}-{}.jsonl", std::process::id()));
        let _ = std::fs::remove_file(&p);
        p
    }

    #[test]
    fn record_then_read_all_round_trips() {
        let path = temp_path("roundtrip");
        let log = AuditLog::new(&path);
        log.record(
            AuditSubject::BundlePlan,
            "intent-1",
            "corr-1",
            serde_json::json!({"deadline": 60}),
        )
        .unwrap();
        log.record(
            AuditSubject::CapitalDecision,
            "intent-1",
            "corr-1",
            serde_json::json!({"allowed": true}),
        )
        .unwrap();

        let all = log.read_all().unwrap();
        assert_eq!(all.len(), 2);
        let capital_only = log.read_for_subject(AuditSubject::CapitalDecision).unwrap();
        assert_eq!(capital_only.len(), 1);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn malformed_line_is_skipped_not_fatal() {
        let path = temp_path("malformed");
        std::fs::write(&path, "{not json}\n").unwrap();
        let log = AuditLog::new(&path);
        log.record(
            AuditSubject::RelayPlan,
            "intent-2",
            "corr-2",
            serde_json::json!({}),
        )
        .unwrap();
        let all = log.read_all().unwrap();
        assert_eq!(all.len(), 1);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn reading_missing_file_returns_empty() {
        let path = temp_path("missing");
        let log = AuditLog::new(&path);
        assert!(log.read_all().unwrap().is_empty());
    }
}
