use serde::{Deserialize, Serialize};
use solana_sdk::instruction::Instruction;
use solana_sdk::signature::Signature;
use std::fmt;

/// Identifier of a single approval request
pub type RequestId = u64;

/// Which platform credential flow to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyMode {
    /// Register a new passkey (login)
    Create,
    /// Assert an existing passkey (transaction signing)
    Get,
}

impl CeremonyMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CeremonyMode::Create => "create",
            CeremonyMode::Get => "get",
        }
    }
}

/// How a credential ceremony ended. Never an error for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CeremonyOutcome {
    Completed,
    /// The prompt failed or was dismissed; the flow continued anyway.
    Skipped(String),
}

/// Human decision on a pending transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalDecision {
    Approved,
    Rejected,
}

/// Options the caller attaches to a submission.
///
/// Fee sponsorship is not implemented; these values are carried through to the
/// approval prompt and logs only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitOptions {
    /// Token the user intends to pay fees with (e.g. "USDC")
    #[serde(default)]
    pub fee_token: Option<String>,

    /// Route fees through a paymaster
    #[serde(default)]
    pub sponsored: bool,
}

impl SubmitOptions {
    pub fn with_fee_token(mut self, token: impl Into<String>) -> Self {
        self.fee_token = Some(token.into());
        self
    }

    pub fn sponsored(mut self) -> Self {
        self.sponsored = true;
        self
    }
}

/// Where a pending transaction is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingStatus {
    AwaitingApproval,
    /// Approved; signing and submission in progress
    Approved,
}

/// Read-only view of the transaction waiting in the approval slot
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    /// Request this snapshot belongs to
    pub id: RequestId,

    /// Instructions in submission order
    pub instructions: Vec<Instruction>,

    pub options: SubmitOptions,

    pub status: PendingStatus,
}

/// Coarse pipeline state for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    AwaitingApproval,
    Signing,
}

/// Whether a signature was actually broadcast and confirmed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Real,
    Simulated,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Real => f.write_str("real"),
            Provenance::Simulated => f.write_str("simulated"),
        }
    }
}

/// Outcome of a completed submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionResult {
    pub signature: Signature,
    pub provenance: Provenance,
}

impl SubmissionResult {
    pub fn real(signature: Signature) -> Self {
        Self {
            signature,
            provenance: Provenance::Real,
        }
    }

    pub fn simulated(signature: Signature) -> Self {
        Self {
            signature,
            provenance: Provenance::Simulated,
        }
    }

    /// A simulated signature looks like a real one but was never on-chain.
    pub fn is_verifiable(&self) -> bool {
        self.provenance == Provenance::Real
    }
}
