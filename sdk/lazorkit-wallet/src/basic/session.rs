//! Session lifecycle: restore, connect, disconnect.
//!
//! The session keypair lives only inside [`SessionManager`]. It is never
//! returned, serialized for callers or logged; the rest of the crate sees the
//! public address and asks the manager to sign.

use crate::basic::ceremony::CredentialCeremony;
use crate::basic::vault::KeyVault;
use crate::config::WalletConfig;
use crate::core::connection::SolConnection;
use crate::error::{Result, SubmitError, VaultError, WalletError};
use crate::types::CeremonyMode;
use solana_sdk::hash::Hash;
use solana_sdk::instruction::Instruction;
use solana_sdk::message::Message;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::{Keypair, Signature, Signer};
use solana_sdk::transaction::Transaction;
use std::error::Error;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{
    Arc, Mutex as StdMutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Connected wallet. Holding one means the key material is loaded.
struct WalletSession {
    keypair: Keypair,
    address: Pubkey,
}

impl WalletSession {
    fn new(keypair: Keypair) -> Self {
        let address = keypair.pubkey();
        Self { keypair, address }
    }
}

impl std::fmt::Debug for WalletSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletSession")
            .field("address", &self.address)
            .field("keypair", &"[REDACTED]")
            .finish()
    }
}

/// Result of the connect-time faucet top-up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FundingOutcome {
    /// Balance already at or above the threshold
    Sufficient(u64),
    AirdropRequested(Signature),
    /// Swallowed failure; login continued
    Failed(String),
}

/// Faucet parameters used on connect
#[derive(Debug, Clone, Copy)]
pub struct FundingPolicy {
    pub threshold_lamports: u64,
    pub airdrop_lamports: u64,
    pub timeout: Duration,
}

impl From<&WalletConfig> for FundingPolicy {
    fn from(config: &WalletConfig) -> Self {
        Self {
            threshold_lamports: config.top_up_threshold_lamports,
            airdrop_lamports: config.airdrop_lamports,
            timeout: config.funding_timeout(),
        }
    }
}

/// Clears the connecting flag even if `connect` is cancelled mid-flight.
struct ConnectingFlag<'a>(&'a AtomicBool);

impl<'a> ConnectingFlag<'a> {
    fn raise(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for ConnectingFlag<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct SessionManager {
    vault: KeyVault,
    ceremony: Arc<CredentialCeremony>,
    connection: Arc<dyn SolConnection>,
    funding: FundingPolicy,
    session: RwLock<Option<WalletSession>>,
    /// Serializes connect calls so only one key is ever generated
    connect_lock: Mutex<()>,
    /// Bumped by every disconnect; a connect started in an older epoch is dropped
    epoch: StdMutex<u64>,
    connecting: AtomicBool,
    last_funding: StdMutex<Option<FundingOutcome>>,
}

impl SessionManager {
    pub fn new(
        vault: KeyVault,
        ceremony: Arc<CredentialCeremony>,
        connection: Arc<dyn SolConnection>,
        funding: FundingPolicy,
    ) -> Self {
        Self {
            vault,
            ceremony,
            connection,
            funding,
            session: RwLock::new(None),
            connect_lock: Mutex::new(()),
            epoch: StdMutex::new(0),
            connecting: AtomicBool::new(false),
            last_funding: StdMutex::new(None),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<WalletSession>> {
        self.session.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<WalletSession>> {
        self.session.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn epoch(&self) -> MutexGuard<'_, u64> {
        self.epoch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_connected(&self) -> bool {
        self.read().is_some()
    }

    pub fn is_connecting(&self) -> bool {
        self.connecting.load(Ordering::SeqCst)
    }

    /// Public address of the connected session
    pub fn address(&self) -> Option<Pubkey> {
        self.read().as_ref().map(|session| session.address)
    }

    /// Funding result of the most recent connect that reached the faucet step
    pub fn last_funding(&self) -> Option<FundingOutcome> {
        self.last_funding
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Load a persisted session at startup.
    ///
    /// A corrupt entry is purged and treated as logged out.
    pub fn restore(&self) -> Option<Pubkey> {
        match self.vault.load() {
            Ok(Some(keypair)) => {
                let session = WalletSession::new(keypair);
                let address = session.address;
                *self.write() = Some(session);
                info!(address = %address, "Restored wallet session");
                Some(address)
            },
            Ok(None) => {
                debug!("No persisted wallet session");
                None
            },
            Err(VaultError::Corrupt(reason)) => {
                warn!(key = self.vault.key(), %reason, "Discarding corrupt wallet session");
                self.purge();
                None
            },
            Err(VaultError::Storage(e)) => {
                warn!(error = %e, "Wallet storage unreadable, starting logged out");
                None
            },
        }
    }

    /// Connect, creating key material on first use.
    ///
    /// Idempotent: an existing session is returned without prompting again.
    /// A disconnect issued while this runs wins, and the connect fails with
    /// [`WalletError::Disconnected`].
    pub async fn connect(&self) -> Result<Pubkey> {
        let _connect = self.connect_lock.lock().await;
        if let Some(address) = self.address() {
            debug!(address = %address, "Already connected");
            return Ok(address);
        }

        let _connecting = ConnectingFlag::raise(&self.connecting);
        let started = *self.epoch();

        self.ceremony.trigger(CeremonyMode::Create).await;

        let keypair = {
            let epoch = self.epoch();
            if *epoch != started {
                return Err(self.superseded());
            }
            self.load_or_generate()?
        };
        let address = keypair.pubkey();

        let funding = self.top_up(&address).await;
        debug!(address = %address, ?funding, "Funding attempt finished");
        *self
            .last_funding
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(funding);

        let epoch = self.epoch();
        if *epoch != started {
            return Err(self.superseded());
        }
        *self.write() = Some(WalletSession::new(keypair));
        info!(address = %address, "Wallet connected");
        Ok(address)
    }

    /// Drop the session and erase persisted key material.
    ///
    /// Never waits on an in-flight connect. Pending transactions are left alone.
    pub async fn disconnect(&self) {
        let previous = {
            let mut epoch = self.epoch();
            *epoch += 1;
            let previous = self.write().take();
            self.purge();
            previous
        };

        match previous {
            Some(session) => info!(address = %session.address, "Wallet disconnected"),
            None => debug!("Disconnect without an active session"),
        }
    }

    /// Build a transaction paid for and signed by the session key.
    pub fn sign_transaction(
        &self,
        instructions: &[Instruction],
        recent_blockhash: Hash,
    ) -> std::result::Result<Transaction, SubmitError> {
        let guard = self.read();
        let session = guard.as_ref().ok_or(SubmitError::SessionClosed)?;

        let message = Message::new(instructions, Some(&session.address));
        let mut tx = Transaction::new_unsigned(message);
        tx.try_sign(&[&session.keypair], recent_blockhash)
            .map_err(|e| SubmitError::Signing(e.to_string()))?;
        Ok(tx)
    }

    fn load_or_generate(&self) -> Result<Keypair> {
        match self.vault.load() {
            Ok(Some(keypair)) => Ok(keypair),
            Ok(None) => self.generate(),
            Err(VaultError::Corrupt(reason)) => {
                warn!(%reason, "Replacing corrupt wallet session");
                self.generate()
            },
            Err(VaultError::Storage(e)) => {
                warn!(error = %e, "Wallet storage unreadable, generating a new key");
                self.generate()
            },
        }
    }

    fn superseded(&self) -> WalletError {
        warn!("Disconnected while connecting, dropping session");
        WalletError::Disconnected
    }

    fn generate(&self) -> Result<Keypair> {
        let keypair = Keypair::new();
        self.vault.save(&keypair)?;
        info!(address = %keypair.pubkey(), "Generated new wallet key");
        Ok(keypair)
    }

    fn purge(&self) {
        if let Err(e) = self.vault.erase() {
            warn!(key = self.vault.key(), error = %e, "Failed to erase wallet session");
        }
    }

    async fn top_up(&self, address: &Pubkey) -> FundingOutcome {
        match tokio::time::timeout(self.funding.timeout, self.request_funds(address)).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                warn!(address = %address, error = %e, "Funding failed, continuing login");
                FundingOutcome::Failed(e.to_string())
            },
            Err(_) => {
                warn!(address = %address, "Funding timed out, continuing login");
                FundingOutcome::Failed("timed out".to_string())
            },
        }
    }

    async fn request_funds(
        &self,
        address: &Pubkey,
    ) -> std::result::Result<FundingOutcome, Box<dyn Error + Send + Sync>> {
        let balance = self.connection.get_balance(address).await?;
        if balance >= self.funding.threshold_lamports {
            return Ok(FundingOutcome::Sufficient(balance));
        }

        let signature = self
            .connection
            .request_airdrop(address, self.funding.airdrop_lamports)
            .await?;
        info!(address = %address, balance, %signature, "Requested faucet airdrop");
        Ok(FundingOutcome::AirdropRequested(signature))
    }
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("vault", &self.vault)
            .field("session", &*self.read())
            .field("connecting", &self.is_connecting())
            .finish()
    }
}
