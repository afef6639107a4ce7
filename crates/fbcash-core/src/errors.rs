//! Error types for the FBCash client

use thiserror::Error;

/// Core errors that can occur in the client
#[derive(Debug, Error)]
pub enum Error {
    #[error("Node error: {0}")]
    Node(#[from] NodeError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] TxError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// RPC connection and query errors
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("Node unreachable at {url}")]
    Unreachable { url: String },

    #[error("Node returned error: {message}")]
    ApiError { message: String },

    #[error("Node request timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Call to {method} reverted: {reason}")]
    CallReverted { method: String, reason: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),
}

impl NodeError {
    /// True when the contract itself rejected the call, as opposed to the
    /// node being unreachable or slow.
    pub fn is_revert(&self) -> bool {
        matches!(self, Self::CallReverted { .. } | Self::ParseError(_))
    }
}

/// Protocol-specific errors
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Unknown contract: {name}")]
    UnknownContract { name: String },

    #[error("Unknown token: {symbol}")]
    UnknownToken { symbol: String },

    #[error("Protocol state unavailable: {reason}")]
    StateUnavailable { reason: String },

    #[error("Price unavailable for {asset}: {reason}")]
    PriceUnavailable { asset: String, reason: String },

    #[error("Boardroom {version} is no longer accepting changes; exit it and stake again")]
    StaleBoardroomVersion { version: String },

    #[error("Boardroom version has not been resolved yet")]
    BoardroomUnresolved,

    #[error("Wallet is locked")]
    WalletLocked,

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Action not allowed: {reason}")]
    ActionNotAllowed { reason: String },
}

/// Transaction building and submission errors
#[derive(Debug, Error)]
pub enum TxError {
    #[error("Transaction {method} would revert: {reason}")]
    TransactionWouldRevert { method: String, reason: String },

    #[error("A signer is required to submit {method}")]
    SignerRequired { method: String },

    #[error("Transaction submission failed: {message}")]
    SubmissionFailed { message: String },
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Get a stable machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Node(e) => e.error_code(),
            Self::Protocol(e) => e.error_code(),
            Self::Transaction(e) => e.error_code(),
            Self::Config(_) => "config",
            Self::Serialization(_) => "serialization",
        }
    }
}

impl NodeError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Unreachable { .. } => "node_unreachable",
            Self::ApiError { .. } => "node_api_error",
            Self::Timeout { .. } => "node_timeout",
            Self::CallReverted { .. } => "view_call_reverted",
            Self::ParseError(_) => "node_parse_error",
        }
    }
}

impl ProtocolError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownContract { .. } => "unknown_contract",
            Self::UnknownToken { .. } => "unknown_token",
            Self::StateUnavailable { .. } => "state_unavailable",
            Self::PriceUnavailable { .. } => "price_unavailable",
            Self::StaleBoardroomVersion { .. } => "stale_boardroom_version",
            Self::BoardroomUnresolved => "boardroom_unresolved",
            Self::WalletLocked => "wallet_locked",
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::ActionNotAllowed { .. } => "action_not_allowed",
        }
    }

    /// Whether the caller can recover without changing inputs
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::PriceUnavailable { .. }
                | Self::StaleBoardroomVersion { .. }
                | Self::BoardroomUnresolved
        )
    }
}

impl TxError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::TransactionWouldRevert { .. } => "transaction_would_revert",
            Self::SignerRequired { .. } => "signer_required",
            Self::SubmissionFailed { .. } => "submission_failed",
        }
    }
}
