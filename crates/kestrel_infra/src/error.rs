//! Aggregated error type (C15) for the few call sites that must return a
//! single error across component boundaries: the executor, the
//! submission fan-out, and the config daemon.

use std::fmt;

use kestrel_core::config::ConfigError as CoreConfigError;
use kestrel_core::reason::{Reason, ReasonCode};

use crate::store::LedgerAppendError;
use crate::submission::SubmissionError;

#[derive(Debug, Clone, PartialEq)]
pub enum KestrelError {
    Store(LedgerAppendError),
    Config(CoreConfigError),
    Submission(SubmissionError),
    InvalidTransition { from: String, to: String },
    Internal(String),
}

impl fmt::Display for KestrelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KestrelError::Store(e) => write!(f, "store error: {e}"),
            KestrelError::Config(e) => write!(f, "config error: {e}"),
            KestrelError::Submission(e) => write!(f, "submission error: {e}"),
            KestrelError::InvalidTransition { from, to } => {
                write!(f, "invalid transition {from} -> {to}")
            }
            KestrelError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for KestrelError {}

impl From<LedgerAppendError> for KestrelError {
    fn from(e: LedgerAppendError) -> Self {
        KestrelError::Store(e)
    }
}

impl From<CoreConfigError> for KestrelError {
    fn from(e: CoreConfigError) -> Self {
        KestrelError::Config(e)
    }
}

impl From<SubmissionError> for KestrelError {
    fn from(e: SubmissionError) -> Self {
        KestrelError::Submission(e)
    }
}

impl KestrelError {
    /// Map this error onto a stable `Reason` for the canonical envelope.
    pub fn to_reason(&self) -> Reason {
        match self {
            KestrelError::Store(_) | KestrelError::Internal(_) => {
                Reason::new(ReasonCode::InternalError, self.to_string())
            }
            KestrelError::Config(_) => Reason::new(ReasonCode::ClientBadRequest, self.to_string()),
            KestrelError::Submission(_) => {
                Reason::new(ReasonCode::SubmissionAllFailed, self.to_string())
            }
            KestrelError::InvalidTransition { .. } => {
                Reason::new(ReasonCode::InvalidTransition, self.to_string())
            }
        }
    }
}
