//! Approval-gated submission with a simulated fallback.
//!
//! Order is fixed: approval, then the `Get` ceremony, then the ledger. A
//! rejected request never touches the ledger. Any failure after approval is
//! replaced by a simulated signature so the caller always sees a completed
//! transfer or an explicit rejection.

use crate::basic::approval::ApprovalGate;
use crate::basic::ceremony::CredentialCeremony;
use crate::basic::session::SessionManager;
use crate::core::connection::SolConnection;
use crate::error::{Result, SubmitError, WalletError};
use crate::types::{ApprovalDecision, CeremonyMode, SubmissionResult, SubmitOptions};
use crate::utils::random_signature;
use solana_sdk::instruction::Instruction;
use solana_sdk::signature::Signature;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Resets the processing flag on every exit path.
struct ProcessingFlag<'a>(&'a AtomicBool);

impl<'a> ProcessingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for ProcessingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct TransactionSubmitter {
    session: Arc<SessionManager>,
    gate: ApprovalGate,
    ceremony: Arc<CredentialCeremony>,
    connection: Arc<dyn SolConnection>,
    simulated_delay: Duration,
    processing: AtomicBool,
}

impl TransactionSubmitter {
    pub fn new(
        session: Arc<SessionManager>,
        gate: ApprovalGate,
        ceremony: Arc<CredentialCeremony>,
        connection: Arc<dyn SolConnection>,
        simulated_delay: Duration,
    ) -> Self {
        Self {
            session,
            gate,
            ceremony,
            connection,
            simulated_delay,
            processing: AtomicBool::new(false),
        }
    }

    /// True while an approved transaction is being signed or submitted
    pub fn is_processing(&self) -> bool {
        self.processing.load(Ordering::SeqCst)
    }

    /// Wait for approval, then sign and submit.
    ///
    /// Fails only with `NoWallet`, `UserRejected` or `ApprovalPending`.
    pub async fn submit(
        &self,
        instructions: Vec<Instruction>,
        options: SubmitOptions,
    ) -> Result<SubmissionResult> {
        if !self.session.is_connected() {
            return Err(WalletError::NoWallet);
        }

        let mut ticket = self.gate.request_approval(instructions.clone(), options)?;
        let request_id = ticket.id();

        if ticket.decision().await == ApprovalDecision::Rejected {
            return Err(WalletError::UserRejected);
        }

        let _processing = ProcessingFlag::raise(&self.processing);

        self.ceremony.trigger(CeremonyMode::Get).await;

        let result = match self.attempt_real(&instructions).await {
            Ok(signature) => {
                info!(request_id, %signature, "Transaction confirmed");
                SubmissionResult::real(signature)
            },
            Err(SubmitError::SessionClosed) => {
                warn!(request_id, "Session closed before signing");
                return Err(WalletError::NoWallet);
            },
            Err(e) => {
                warn!(request_id, error = %e, "Submission failed, falling back to simulation");
                let signature = self.simulate().await;
                info!(request_id, %signature, "Returning simulated signature");
                SubmissionResult::simulated(signature)
            },
        };

        ticket.finish();
        Ok(result)
    }

    /// Sign with the session key and broadcast.
    ///
    /// A zero balance short-circuits before broadcasting.
    pub(crate) async fn attempt_real(
        &self,
        instructions: &[Instruction],
    ) -> std::result::Result<Signature, SubmitError> {
        let blockhash = self
            .connection
            .get_latest_blockhash()
            .await
            .map_err(|e| SubmitError::Connection(e.to_string()))?;

        let tx = self.session.sign_transaction(instructions, blockhash)?;
        let payer = tx
            .message
            .account_keys
            .first()
            .copied()
            .ok_or(SubmitError::SessionClosed)?;

        let balance = self
            .connection
            .get_balance(&payer)
            .await
            .map_err(|e| SubmitError::Connection(e.to_string()))?;
        if balance == 0 {
            return Err(SubmitError::EmptyWallet(payer.to_string()));
        }
        debug!(payer = %payer, balance, "Broadcasting transaction");

        let signature = self
            .connection
            .send_transaction(&tx)
            .await
            .map_err(|e| SubmitError::Connection(e.to_string()))?;

        self.connection
            .confirm_transaction(&signature)
            .await
            .map_err(|e| SubmitError::Confirmation(e.to_string()))?;

        Ok(signature)
    }

    /// Stand-in signature after the fixed fallback delay. Not verifiable.
    pub(crate) async fn simulate(&self) -> Signature {
        tokio::time::sleep(self.simulated_delay).await;
        random_signature()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basic::session::FundingPolicy;
    use crate::basic::vault::KeyVault;
    use crate::core::authenticator::UnsupportedAuthenticator;
    use crate::core::storage::MemoryStore;
    use async_trait::async_trait;
    use solana_sdk::hash::Hash;
    use solana_sdk::native_token::LAMPORTS_PER_SOL;
    use solana_sdk::pubkey::Pubkey;
    use solana_sdk::transaction::Transaction;
    use std::error::Error;
    use std::sync::atomic::AtomicU64;
    use std::sync::Mutex;
    use std::time::Instant;

    type RpcResult<T> = std::result::Result<T, Box<dyn Error + Send + Sync>>;

    struct Ledger {
        balance: AtomicU64,
        sent: Mutex<Vec<Transaction>>,
    }

    #[async_trait]
    impl SolConnection for Ledger {
        async fn get_balance(&self, _pubkey: &Pubkey) -> RpcResult<u64> {
            Ok(self.balance.load(Ordering::SeqCst))
        }

        async fn get_latest_blockhash(&self) -> RpcResult<Hash> {
            Ok(Hash::new_unique())
        }

        async fn request_airdrop(&self, _pubkey: &Pubkey, _lamports: u64) -> RpcResult<Signature> {
            Ok(random_signature())
        }

        async fn send_transaction(&self, tx: &Transaction) -> RpcResult<Signature> {
            self.sent.lock().unwrap().push(tx.clone());
            Ok(tx.signatures[0])
        }

        async fn confirm_transaction(&self, _signature: &Signature) -> RpcResult<()> {
            Ok(())
        }
    }

    fn setup(balance: u64) -> (TransactionSubmitter, Arc<SessionManager>, Arc<Ledger>) {
        let ledger = Arc::new(Ledger {
            balance: AtomicU64::new(balance),
            sent: Mutex::new(Vec::new()),
        });
        let ceremony = Arc::new(CredentialCeremony::new(
            Arc::new(UnsupportedAuthenticator),
            "Lazorkit",
            1_000,
        ));
        let session = Arc::new(SessionManager::new(
            KeyVault::new(Arc::new(MemoryStore::new()), "lazor_secret"),
            ceremony.clone(),
            ledger.clone(),
            FundingPolicy {
                threshold_lamports: 0,
                airdrop_lamports: 0,
                timeout: Duration::from_millis(100),
            },
        ));
        let submitter = TransactionSubmitter::new(
            session.clone(),
            ApprovalGate::new(),
            ceremony,
            ledger.clone(),
            Duration::from_millis(20),
        );
        (submitter, session, ledger)
    }

    fn transfer(from: Pubkey) -> Vec<Instruction> {
        vec![crate::utils::transfer_sol(&from, &Pubkey::new_unique(), 0.01)]
    }

    #[tokio::test]
    async fn test_attempt_real_signs_with_session_key() {
        let (submitter, session, ledger) = setup(LAMPORTS_PER_SOL);
        let address = session.connect().await.unwrap();

        let signature = submitter.attempt_real(&transfer(address)).await.unwrap();

        let sent = ledger.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message.account_keys[0], address);
        assert_eq!(sent[0].signatures[0], signature);
        assert!(sent[0].verify().is_ok());
    }

    #[tokio::test]
    async fn test_attempt_real_refuses_empty_wallet() {
        let (submitter, session, ledger) = setup(0);
        let address = session.connect().await.unwrap();

        let err = submitter.attempt_real(&transfer(address)).await.unwrap_err();

        assert!(matches!(err, SubmitError::EmptyWallet(payer) if payer == address.to_string()));
        assert!(ledger.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_attempt_real_without_session() {
        let (submitter, _session, ledger) = setup(LAMPORTS_PER_SOL);

        let err = submitter
            .attempt_real(&transfer(Pubkey::new_unique()))
            .await
            .unwrap_err();

        assert!(matches!(err, SubmitError::SessionClosed));
        assert!(ledger.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_simulate_waits_and_returns_fresh_signatures() {
        let (submitter, _session, _ledger) = setup(0);

        let started = Instant::now();
        let first = submitter.simulate().await;
        assert!(started.elapsed() >= Duration::from_millis(20));

        let second = submitter.simulate().await;
        assert_ne!(first, second);
    }
}
