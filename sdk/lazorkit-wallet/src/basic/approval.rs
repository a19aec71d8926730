//! Human-in-the-loop approval gate.
//!
//! A request registers itself in a single exclusive slot and receives an
//! [`ApprovalTicket`] holding the receiving half of a one-shot channel. The
//! approver (UI, terminal prompt) resolves it through `confirm`/`reject`. The
//! sending half is consumed by the first decision, so a ticket resolves at
//! most once. While the slot is occupied new requests are refused with
//! [`WalletError::ApprovalPending`].

use crate::error::{Result, WalletError};
use crate::types::{
    ApprovalDecision, PendingStatus, PendingTransaction, PipelineState, RequestId, SubmitOptions,
};
use solana_sdk::instruction::Instruction;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{oneshot, watch};
use tracing::{debug, info};

struct Slot {
    id: RequestId,
    /// `None` once a decision has been sent
    decision: Option<oneshot::Sender<ApprovalDecision>>,
}

struct GateInner {
    slot: Mutex<Option<Slot>>,
    /// Snapshot published for rendering; always written under `slot`
    pending: watch::Sender<Option<PendingTransaction>>,
    next_id: AtomicU64,
}

impl GateInner {
    fn lock(&self) -> MutexGuard<'_, Option<Slot>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn release(&self, id: RequestId) -> bool {
        let mut slot = self.lock();
        if slot.as_ref().map(|s| s.id) != Some(id) {
            return false;
        }
        *slot = None;
        self.pending.send_replace(None);
        true
    }
}

/// Exclusive single-slot approval gate
#[derive(Clone)]
pub struct ApprovalGate {
    inner: Arc<GateInner>,
}

impl Default for ApprovalGate {
    fn default() -> Self {
        Self::new()
    }
}

impl ApprovalGate {
    pub fn new() -> Self {
        let (pending, _) = watch::channel(None);
        Self {
            inner: Arc::new(GateInner {
                slot: Mutex::new(None),
                pending,
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Register a transaction for approval.
    pub fn request_approval(
        &self,
        instructions: Vec<Instruction>,
        options: SubmitOptions,
    ) -> Result<ApprovalTicket> {
        let mut slot = self.inner.lock();
        if let Some(existing) = slot.as_ref() {
            debug!(request_id = existing.id, "Approval slot occupied");
            return Err(WalletError::ApprovalPending(existing.id));
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
        let (sender, receiver) = oneshot::channel();
        *slot = Some(Slot {
            id,
            decision: Some(sender),
        });

        info!(
            request_id = id,
            instructions = instructions.len(),
            fee_token = options.fee_token.as_deref().unwrap_or("SOL"),
            sponsored = options.sponsored,
            "Transaction awaiting approval"
        );
        self.inner.pending.send_replace(Some(PendingTransaction {
            id,
            instructions,
            options,
            status: PendingStatus::AwaitingApproval,
        }));

        Ok(ApprovalTicket {
            gate: self.inner.clone(),
            id,
            receiver: Some(receiver),
            decided: None,
        })
    }

    /// Approve the outstanding request, if any.
    pub fn confirm(&self) -> bool {
        match self.current_id() {
            Some(id) => self.confirm_request(id),
            None => false,
        }
    }

    /// Reject the outstanding request, if any, and clear the slot.
    pub fn reject(&self) -> bool {
        match self.current_id() {
            Some(id) => self.reject_request(id),
            None => false,
        }
    }

    /// Approve request `id`. The slot stays occupied until submission ends.
    pub fn confirm_request(&self, id: RequestId) -> bool {
        let mut slot = self.inner.lock();
        let Some(sender) = take_sender(&mut slot, id) else {
            return false;
        };
        let _ = sender.send(ApprovalDecision::Approved);
        self.inner.pending.send_modify(|pending| {
            if let Some(pending) = pending {
                pending.status = PendingStatus::Approved;
            }
        });
        info!(request_id = id, "Transaction approved");
        true
    }

    /// Reject request `id` and free the slot.
    pub fn reject_request(&self, id: RequestId) -> bool {
        let mut slot = self.inner.lock();
        let Some(sender) = take_sender(&mut slot, id) else {
            return false;
        };
        let _ = sender.send(ApprovalDecision::Rejected);
        *slot = None;
        self.inner.pending.send_replace(None);
        info!(request_id = id, "Transaction rejected");
        true
    }

    pub fn current_id(&self) -> Option<RequestId> {
        self.inner.lock().as_ref().map(|slot| slot.id)
    }

    /// Snapshot of the transaction occupying the slot
    pub fn pending(&self) -> Option<PendingTransaction> {
        self.inner.pending.borrow().clone()
    }

    /// Receiver notified whenever the slot changes
    pub fn subscribe(&self) -> watch::Receiver<Option<PendingTransaction>> {
        self.inner.pending.subscribe()
    }

    pub fn state(&self) -> PipelineState {
        match self.inner.pending.borrow().as_ref().map(|p| p.status) {
            None => PipelineState::Idle,
            Some(PendingStatus::AwaitingApproval) => PipelineState::AwaitingApproval,
            Some(PendingStatus::Approved) => PipelineState::Signing,
        }
    }
}

fn take_sender(
    slot: &mut Option<Slot>,
    id: RequestId,
) -> Option<oneshot::Sender<ApprovalDecision>> {
    match slot.as_mut() {
        Some(current) if current.id == id => current.decision.take(),
        _ => None,
    }
}

/// Requester's handle on an approval request.
///
/// Dropping the ticket releases the slot.
pub struct ApprovalTicket {
    gate: Arc<GateInner>,
    id: RequestId,
    receiver: Option<oneshot::Receiver<ApprovalDecision>>,
    decided: Option<ApprovalDecision>,
}

impl ApprovalTicket {
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// Wait for the decision. A gate torn down without deciding counts as rejection.
    pub async fn decision(&mut self) -> ApprovalDecision {
        if let Some(decision) = self.decided {
            return decision;
        }
        let decision = match self.receiver.take() {
            Some(receiver) => receiver.await.unwrap_or(ApprovalDecision::Rejected),
            None => ApprovalDecision::Rejected,
        };
        self.decided = Some(decision);
        decision
    }

    /// Release the slot once the approved work has finished.
    pub fn finish(self) {}
}

impl Drop for ApprovalTicket {
    fn drop(&mut self) {
        if self.gate.release(self.id) {
            debug!(request_id = self.id, "Approval slot released");
        }
    }
}

impl std::fmt::Debug for ApprovalTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalTicket")
            .field("id", &self.id)
            .field("decided", &self.decided)
            .finish()
    }
}
