//! Error types for Mintgate
//!
//! Pattern adapted from doorway/src/types/error.rs. The variants mirror the
//! failure classes of the remote ledger API: transport, authorization,
//! resolution, version mismatch, and the genuinely-unknown timeout case.

/// Main error type for Mintgate operations
#[derive(Debug, thiserror::Error)]
pub enum MintgateError {
    /// Non-2xx HTTP status or a network failure that is not a timeout.
    /// The command did not take effect.
    #[error("Transport failure (status {status:?}): {body}")]
    Transport { status: Option<u16>, body: String },

    /// The ledger rejected the transaction: a required signer was missing or
    /// the command was submitted to a participant that does not host the
    /// acting party. Never retried with the same shape.
    #[error("Authorization failure (status {status}): {body}")]
    Authorization { status: u16, body: String },

    /// A successful outcome did not contain the expected created contract.
    /// Never silently substituted with an update id.
    #[error("Contract identifier unresolved: {0}")]
    Unresolved(String),

    /// A choice was exercised against a contract created under a schema
    /// version that does not define it. Surfaced verbatim from the remote.
    #[error("Schema version mismatch: {0}")]
    VersionMismatch(String),

    /// Timeout without a response. The command may have succeeded remotely;
    /// callers must re-query active state rather than resubmit blindly.
    #[error("Outcome unknown (timed out): {0}")]
    UnknownOutcome(String),

    /// A 2xx response whose body does not carry what the caller needs, such
    /// as a holding with an unparseable amount.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MintgateError {
    /// Whether a follow-up active-state query is needed to learn what the
    /// ledger actually did.
    pub fn outcome_is_unknown(&self) -> bool {
        matches!(self, Self::UnknownOutcome(_))
    }
}

impl From<jsonwebtoken::errors::Error> for MintgateError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Auth(format!("JWT error: {}", err))
    }
}

/// Result type alias for Mintgate operations
pub type Result<T> = std::result::Result<T, MintgateError>;
