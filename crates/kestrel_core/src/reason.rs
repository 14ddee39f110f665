//! Stable reason-code registry shared by the stage pipeline, capital
//! policy, and submission fan-out.
//!
//! Codes are a caller contract: once published their string form and
//! category never change, only new codes are added.

use std::fmt;

/// Broad retry-policy category a reason code belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReasonCategory {
    Screen,
    Validation,
    Enrich,
    Policy,
    Queue,
    Network,
    Client,
    Internal,
}

impl ReasonCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ReasonCategory::Screen => "SCREEN",
            ReasonCategory::Validation => "VALIDATION",
            ReasonCategory::Enrich => "ENRICH",
            ReasonCategory::Policy => "POLICY",
            ReasonCategory::Queue => "QUEUE",
            ReasonCategory::Network => "NETWORK",
            ReasonCategory::Client => "CLIENT",
            ReasonCategory::Internal => "INTERNAL",
        }
    }

    /// Retry guidance surfaced to the submitting client.
    pub fn retry_with_backoff(self) -> bool {
        matches!(self, ReasonCategory::Queue | ReasonCategory::Network)
    }
}

impl fmt::Display for ReasonCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stable reason code token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReasonCode {
    ScreenOversize,
    ScreenUnknownChain,
    ScreenDeadlineExpired,
    ScreenReplaySeen,
    ValidationBadSignature,
    ValidationBadEncoding,
    NetworkEnrichmentUnavailable,
    NetworkRelayUnreachable,
    PolicyFeeTooLow,
    PolicyDenylisted,
    PolicyCapitalKillSwitch,
    PolicyCapitalDailyLossCap,
    PolicyCapitalAccountCap,
    PolicyCapitalStrategyCap,
    ClientIdempotencyConflict,
    ClientBadRequest,
    ClientDuplicateIntentId,
    QueueBackpressure,
    SubmissionAllFailed,
    DeadlineExceeded,
    Shutdown,
    InternalError,
    InvalidTransition,
}

impl ReasonCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ReasonCode::ScreenOversize => "SCREEN_OVERSIZE",
            ReasonCode::ScreenUnknownChain => "SCREEN_UNKNOWN_CHAIN",
            ReasonCode::ScreenDeadlineExpired => "SCREEN_DEADLINE_EXPIRED",
            ReasonCode::ScreenReplaySeen => "SCREEN_REPLAY_SEEN",
            ReasonCode::ValidationBadSignature => "VALIDATION_BAD_SIGNATURE",
            ReasonCode::ValidationBadEncoding => "VALIDATION_BAD_ENCODING",
            ReasonCode::NetworkEnrichmentUnavailable => "NETWORK_ENRICHMENT_UNAVAILABLE",
            ReasonCode::NetworkRelayUnreachable => "NETWORK_RELAY_UNREACHABLE",
            ReasonCode::PolicyFeeTooLow => "POLICY_FEE_TOO_LOW",
            ReasonCode::PolicyDenylisted => "POLICY_DENYLISTED",
            ReasonCode::PolicyCapitalKillSwitch => "POLICY_CAPITAL_KILL_SWITCH",
            ReasonCode::PolicyCapitalDailyLossCap => "POLICY_CAPITAL_DAILY_LOSS_CAP",
            ReasonCode::PolicyCapitalAccountCap => "POLICY_CAPITAL_ACCOUNT_CAP",
            ReasonCode::PolicyCapitalStrategyCap => "POLICY_CAPITAL_STRATEGY_CAP",
            ReasonCode::ClientIdempotencyConflict => "CLIENT_IDEMPOTENCY_CONFLICT",
            ReasonCode::ClientBadRequest => "CLIENT_BAD_REQUEST",
            ReasonCode::ClientDuplicateIntentId => "CLIENT_DUPLICATE_INTENT_ID",
            ReasonCode::QueueBackpressure => "QUEUE_BACKPRESSURE",
            ReasonCode::SubmissionAllFailed => "SUBMISSION_ALL_FAILED",
            ReasonCode::DeadlineExceeded => "DEADLINE_EXCEEDED",
            ReasonCode::Shutdown => "SHUTDOWN",
            ReasonCode::InternalError => "INTERNAL_ERROR",
            ReasonCode::InvalidTransition => "INVALID_TRANSITION",
        }
    }

    pub fn category(self) -> ReasonCategory {
        match self {
            ReasonCode::ScreenOversize
            | ReasonCode::ScreenUnknownChain
            | ReasonCode::ScreenDeadlineExpired
            | ReasonCode::ScreenReplaySeen => ReasonCategory::Screen,
            ReasonCode::ValidationBadSignature | ReasonCode::ValidationBadEncoding => {
                ReasonCategory::Validation
            }
            ReasonCode::NetworkEnrichmentUnavailable | ReasonCode::NetworkRelayUnreachable => {
                ReasonCategory::Network
            }
            ReasonCode::PolicyFeeTooLow
            | ReasonCode::PolicyDenylisted
            | ReasonCode::PolicyCapitalKillSwitch
            | ReasonCode::PolicyCapitalDailyLossCap
            | ReasonCode::PolicyCapitalAccountCap
            | ReasonCode::PolicyCapitalStrategyCap => ReasonCategory::Policy,
            ReasonCode::ClientIdempotencyConflict
            | ReasonCode::ClientBadRequest
            | ReasonCode::ClientDuplicateIntentId => ReasonCategory::Client,
            ReasonCode::QueueBackpressure => ReasonCategory::Queue,
            ReasonCode::SubmissionAllFailed
            | ReasonCode::DeadlineExceeded
            | ReasonCode::Shutdown
            | ReasonCode::InternalError
            | ReasonCode::InvalidTransition => ReasonCategory::Internal,
        }
    }

    /// HTTP status a transport boundary would map this code to.
    pub fn http_status(self) -> u16 {
        match self.category() {
            ReasonCategory::Client => 400,
            ReasonCategory::Screen | ReasonCategory::Validation | ReasonCategory::Policy => 422,
            ReasonCategory::Queue => 429,
            ReasonCategory::Network => 503,
            ReasonCategory::Enrich | ReasonCategory::Internal => 500,
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const REGISTRY: &[ReasonCode] = &[
    ReasonCode::ScreenOversize,
    ReasonCode::ScreenUnknownChain,
    ReasonCode::ScreenDeadlineExpired,
    ReasonCode::ScreenReplaySeen,
    ReasonCode::ValidationBadSignature,
    ReasonCode::ValidationBadEncoding,
    ReasonCode::NetworkEnrichmentUnavailable,
    ReasonCode::NetworkRelayUnreachable,
    ReasonCode::PolicyFeeTooLow,
    ReasonCode::PolicyDenylisted,
    ReasonCode::PolicyCapitalKillSwitch,
    ReasonCode::PolicyCapitalDailyLossCap,
    ReasonCode::PolicyCapitalAccountCap,
    ReasonCode::PolicyCapitalStrategyCap,
    ReasonCode::ClientIdempotencyConflict,
    ReasonCode::ClientBadRequest,
    ReasonCode::ClientDuplicateIntentId,
    ReasonCode::QueueBackpressure,
    ReasonCode::SubmissionAllFailed,
    ReasonCode::DeadlineExceeded,
    ReasonCode::Shutdown,
    ReasonCode::InternalError,
    ReasonCode::InvalidTransition,
];

pub fn reason_code_registry() -> &'static [ReasonCode] {
    REGISTRY
}

/// Structured reason attached to a rejection, denial, or drop.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Reason {
    pub code: String,
    pub category: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
}

impl Reason {
    pub fn new(code: ReasonCode, message: impl Into<String>) -> Self {
        Self {
            code: code.as_str().to_string(),
            category: code.category().as_str().to_string(),
            message: message.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: serde_json::Value) -> Self {
        self.context = Some(context);
        self
    }
}
