use crate::basic::approval::ApprovalGate;
use crate::basic::ceremony::CredentialCeremony;
use crate::basic::session::{FundingOutcome, FundingPolicy, SessionManager};
use crate::basic::submitter::TransactionSubmitter;
use crate::basic::vault::KeyVault;
use crate::config::WalletConfig;
use crate::core::authenticator::{PasskeyAuthenticator, UnsupportedAuthenticator};
use crate::core::connection::{RpcConnection, SolConnection};
use crate::core::storage::{KeyValueStore, MemoryStore};
use crate::error::{Result, WalletError};
use crate::types::{PendingTransaction, PipelineState, RequestId, SubmissionResult, SubmitOptions};
use crate::utils;
use solana_sdk::instruction::Instruction;
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;
use tokio::sync::watch;

/// Passkey wallet as seen by presentation code.
///
/// Exposes connection state, the pending-approval snapshot and the
/// connect / disconnect / submit / confirm / reject entry points. Key
/// material stays inside the session manager.
pub struct LazorWallet {
    config: WalletConfig,
    connection: Arc<dyn SolConnection>,
    session: Arc<SessionManager>,
    gate: ApprovalGate,
    submitter: TransactionSubmitter,
}

impl LazorWallet {
    /// Start configuring a wallet
    pub fn builder() -> WalletBuilder {
        WalletBuilder::new()
    }

    pub fn config(&self) -> &WalletConfig {
        &self.config
    }

    pub async fn connect(&self) -> Result<Pubkey> {
        self.session.connect().await
    }

    pub async fn disconnect(&self) {
        self.session.disconnect().await
    }

    /// Queue `instructions` for approval and submit them once approved.
    pub async fn submit(
        &self,
        instructions: Vec<Instruction>,
        options: SubmitOptions,
    ) -> Result<SubmissionResult> {
        self.submitter.submit(instructions, options).await
    }

    /// Approve the pending transaction. Returns false if nothing was waiting.
    pub fn confirm(&self) -> bool {
        self.gate.confirm()
    }

    /// Reject the pending transaction. Returns false if nothing was waiting.
    pub fn reject(&self) -> bool {
        self.gate.reject()
    }

    pub fn confirm_request(&self, id: RequestId) -> bool {
        self.gate.confirm_request(id)
    }

    pub fn reject_request(&self, id: RequestId) -> bool {
        self.gate.reject_request(id)
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    pub fn is_connecting(&self) -> bool {
        self.session.is_connecting()
    }

    pub fn is_processing(&self) -> bool {
        self.submitter.is_processing()
    }

    /// Address of the connected wallet
    pub fn address(&self) -> Option<Pubkey> {
        self.session.address()
    }

    /// Faucet result of the last connect, if it got that far
    pub fn last_funding(&self) -> Option<FundingOutcome> {
        self.session.last_funding()
    }

    pub fn pending_transaction(&self) -> Option<PendingTransaction> {
        self.gate.pending()
    }

    /// Receiver that changes whenever a transaction enters or leaves approval
    pub fn subscribe_pending(&self) -> watch::Receiver<Option<PendingTransaction>> {
        self.gate.subscribe()
    }

    pub fn state(&self) -> PipelineState {
        self.gate.state()
    }

    /// Current balance in lamports, for display
    pub async fn balance(&self) -> Result<u64> {
        let address = self.address().ok_or(WalletError::NoWallet)?;
        self.connection
            .get_balance(&address)
            .await
            .map_err(|e| WalletError::Connection(e.to_string()))
    }

    /// System transfer of `sol` from the connected wallet
    pub fn transfer(&self, to: &Pubkey, sol: f64) -> Result<Instruction> {
        let from = self.address().ok_or(WalletError::NoWallet)?;
        Ok(utils::transfer_sol(&from, to, sol))
    }
}

impl std::fmt::Debug for LazorWallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazorWallet")
            .field("session", &self.session)
            .field("state", &self.state())
            .finish()
    }
}

/// Assembles a [`LazorWallet`] and restores any persisted session.
#[derive(Default)]
pub struct WalletBuilder {
    config: Option<WalletConfig>,
    connection: Option<Arc<dyn SolConnection>>,
    authenticator: Option<Arc<dyn PasskeyAuthenticator>>,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl WalletBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: WalletConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Ledger client. Defaults to an RPC client for `config.rpc_url`.
    pub fn with_connection(mut self, connection: Arc<dyn SolConnection>) -> Self {
        self.connection = Some(connection);
        self
    }

    /// Passkey platform. Defaults to [`UnsupportedAuthenticator`].
    pub fn with_authenticator(mut self, authenticator: Arc<dyn PasskeyAuthenticator>) -> Self {
        self.authenticator = Some(authenticator);
        self
    }

    /// Key-value storage. Defaults to an in-memory store.
    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn build(self) -> Result<LazorWallet> {
        let config = self.config.unwrap_or_default();

        let connection: Arc<dyn SolConnection> = match self.connection {
            Some(connection) => connection,
            None => Arc::new(RpcConnection::new(
                config.rpc_url.clone(),
                config.commitment_config()?,
            )),
        };
        let authenticator = self
            .authenticator
            .unwrap_or_else(|| Arc::new(UnsupportedAuthenticator));
        let store = self.store.unwrap_or_else(|| Arc::new(MemoryStore::new()));

        let ceremony = Arc::new(CredentialCeremony::new(
            authenticator,
            config.relying_party.clone(),
            config.ceremony_timeout_ms,
        ));
        let session = Arc::new(SessionManager::new(
            KeyVault::new(store, config.storage_key.clone()),
            ceremony.clone(),
            connection.clone(),
            FundingPolicy::from(&config),
        ));
        session.restore();

        let gate = ApprovalGate::new();
        let submitter = TransactionSubmitter::new(
            session.clone(),
            gate.clone(),
            ceremony,
            connection.clone(),
            config.simulated_delay(),
        );

        Ok(LazorWallet {
            config,
            connection,
            session,
            gate,
            submitter,
        })
    }
}
