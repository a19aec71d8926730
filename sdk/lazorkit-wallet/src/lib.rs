//! Lazorkit passkey wallet
//!
//! A client-side Solana wallet that logs in with a passkey ceremony instead
//! of a seed phrase and holds every outgoing transaction until a human
//! approves it.
//!
//! - [`basic::session`] restores, connects and disconnects the session key
//! - [`basic::approval`] suspends submissions until confirm / reject
//! - [`basic::submitter`] signs and broadcasts, falling back to a simulated
//!   signature when the ledger is unavailable
//! - [`LazorWallet`] composes them for presentation code

pub mod basic;
pub mod config;
pub mod core;
pub mod error;
pub mod logging;
pub mod types;
pub mod utils;

pub use crate::basic::approval::{ApprovalGate, ApprovalTicket};
pub use crate::basic::session::{FundingOutcome, SessionManager};
pub use crate::basic::wallet::{LazorWallet, WalletBuilder};
pub use crate::config::WalletConfig;
pub use crate::core::authenticator::{PasskeyAuthenticator, UnsupportedAuthenticator};
pub use crate::core::connection::{RpcConnection, SolConnection};
pub use crate::core::storage::{FileStore, KeyValueStore, MemoryStore};
pub use crate::error::{Result, WalletError};
pub use crate::types::{
    ApprovalDecision, PendingTransaction, PipelineState, Provenance, SubmissionResult,
    SubmitOptions,
};
pub use crate::utils::transfer_sol;
