use crate::types::RequestId;
use thiserror::Error;

/// Errors surfaced to callers of the wallet.
///
/// Everything else that can go wrong (ceremony, funding, broadcast) is absorbed
/// inside the pipeline and downgraded to a logged warning or a simulated result.
#[derive(Debug, Error)]
pub enum WalletError {
    /// No session is connected; the caller must connect first.
    #[error("No wallet connected")]
    NoWallet,

    /// The approver rejected the pending transaction.
    #[error("User rejected transaction")]
    UserRejected,

    /// A disconnect arrived while `connect` was still running.
    #[error("Disconnected before connect completed")]
    Disconnected,

    /// Another transaction already occupies the approval slot.
    #[error("Transaction {0} is still awaiting approval")]
    ApprovalPending(RequestId),

    /// Key material could not be persisted.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Ledger query failed. Only display queries (balance) return this.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Failure during the real submission attempt. Never reaches the caller.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Wallet {0} has no balance")]
    EmptyWallet(String),

    #[error("Signing failed: {0}")]
    Signing(String),

    #[error("Confirmation failed: {0}")]
    Confirmation(String),

    /// The session went away between approval and signing.
    #[error("Session closed before signing")]
    SessionClosed,
}

/// Failure of the platform credential prompt.
#[derive(Debug, Error)]
pub enum CeremonyError {
    #[error("Ceremony cancelled by user")]
    Cancelled,

    #[error("Platform authenticator unavailable")]
    Unsupported,

    #[error("Ceremony timed out")]
    Timeout,

    #[error("Authenticator error: {0}")]
    Platform(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum VaultError {
    /// Stored key material exists but cannot be decoded into a keypair.
    #[error("Corrupt key material: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result type alias for wallet operations
pub type Result<T> = std::result::Result<T, WalletError>;
