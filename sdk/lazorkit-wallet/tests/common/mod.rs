#![allow(dead_code)]

use async_trait::async_trait;
use lazorkit_wallet::core::authenticator::{
    Credential, PasskeyAuthenticator, RelyingParty, UserInfo,
};
use lazorkit_wallet::error::{CeremonyError, StorageError};
use lazorkit_wallet::utils::random_signature;
use lazorkit_wallet::{
    KeyValueStore, LazorWallet, MemoryStore, PendingTransaction, SolConnection, WalletConfig,
};
use solana_sdk::hash::Hash;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::transaction::Transaction;
use std::error::Error;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub const SESSION_KEY: &str = "lazor_secret";
pub const SIMULATED_DELAY_MS: u64 = 20;

/// Ordered record of every collaborator call
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<&'static str>>>);

impl EventLog {
    pub fn push(&self, event: &'static str) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    pub fn count(&self, event: &str) -> usize {
        self.events().iter().filter(|e| **e == event).count()
    }
}

//=============================================================================
// Ledger Mock
//=============================================================================

pub struct MockConnection {
    log: EventLog,
    pub balance: AtomicU64,
    pub fail_balance: AtomicBool,
    pub stall_balance: AtomicBool,
    pub fail_airdrop: AtomicBool,
    pub fail_blockhash: AtomicBool,
    pub fail_send: AtomicBool,
    pub fail_confirm: AtomicBool,
    pub blockhash: Hash,
    sent: Mutex<Vec<Transaction>>,
}

impl MockConnection {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            balance: AtomicU64::new(LAMPORTS_PER_SOL),
            fail_balance: AtomicBool::new(false),
            stall_balance: AtomicBool::new(false),
            fail_airdrop: AtomicBool::new(false),
            fail_blockhash: AtomicBool::new(false),
            fail_send: AtomicBool::new(false),
            fail_confirm: AtomicBool::new(false),
            blockhash: Hash::new_unique(),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn set_balance(&self, lamports: u64) {
        self.balance.store(lamports, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Transaction> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl SolConnection for MockConnection {
    async fn get_balance(&self, _pubkey: &Pubkey) -> Result<u64, Box<dyn Error + Send + Sync>> {
        self.log.push("get_balance");
        if self.stall_balance.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail_balance.load(Ordering::SeqCst) {
            return Err("429 Too Many Requests".into());
        }
        Ok(self.balance.load(Ordering::SeqCst))
    }

    async fn get_latest_blockhash(&self) -> Result<Hash, Box<dyn Error + Send + Sync>> {
        self.log.push("get_latest_blockhash");
        if self.fail_blockhash.load(Ordering::SeqCst) {
            return Err("connection refused".into());
        }
        Ok(self.blockhash)
    }

    async fn request_airdrop(
        &self,
        _pubkey: &Pubkey,
        _lamports: u64,
    ) -> Result<Signature, Box<dyn Error + Send + Sync>> {
        self.log.push("request_airdrop");
        if self.fail_airdrop.load(Ordering::SeqCst) {
            return Err("airdrop limit reached".into());
        }
        Ok(random_signature())
    }

    async fn send_transaction(
        &self,
        tx: &Transaction,
    ) -> Result<Signature, Box<dyn Error + Send + Sync>> {
        self.log.push("send_transaction");
        if self.fail_send.load(Ordering::SeqCst) {
            return Err("Transaction simulation failed: insufficient funds".into());
        }
        let signature = *tx.signatures.first().ok_or("No signature")?;
        self.sent.lock().unwrap().push(tx.clone());
        Ok(signature)
    }

    async fn confirm_transaction(
        &self,
        _signature: &Signature,
    ) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.log.push("confirm_transaction");
        if self.fail_confirm.load(Ordering::SeqCst) {
            return Err("blockhash expired".into());
        }
        Ok(())
    }
}

//=============================================================================
// Passkey Mock
//=============================================================================

pub struct MockAuthenticator {
    log: EventLog,
    pub fail: AtomicBool,
    /// Registration prompt never returns
    pub stall: AtomicBool,
}

impl MockAuthenticator {
    pub fn new(log: EventLog) -> Self {
        Self {
            log,
            fail: AtomicBool::new(false),
            stall: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl PasskeyAuthenticator for MockAuthenticator {
    async fn create(
        &self,
        _challenge: &[u8; 32],
        _rp: &RelyingParty,
        _user: &UserInfo,
        _timeout_ms: u64,
    ) -> Result<Credential, CeremonyError> {
        self.log.push("ceremony_create");
        if self.stall.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(CeremonyError::Cancelled);
        }
        Ok(Credential::default())
    }

    async fn get(
        &self,
        _challenge: &[u8; 32],
        _timeout_ms: u64,
    ) -> Result<Credential, CeremonyError> {
        self.log.push("ceremony_get");
        if self.fail.load(Ordering::SeqCst) {
            return Err(CeremonyError::Cancelled);
        }
        Ok(Credential::default())
    }
}

//=============================================================================
// Storage Mock
//=============================================================================

/// Store whose reads and writes can be made to fail
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    pub fail_get: AtomicBool,
    pub fail_set: AtomicBool,
}

impl FlakyStore {
    fn io_error(op: &str) -> StorageError {
        StorageError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            format!("{} denied", op),
        ))
    }
}

impl KeyValueStore for FlakyStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.fail_get.load(Ordering::SeqCst) {
            return Err(Self::io_error("read"));
        }
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.fail_set.load(Ordering::SeqCst) {
            return Err(Self::io_error("write"));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.inner.remove(key)
    }
}

//=============================================================================
// Test Context
//=============================================================================

pub struct TestContext {
    pub wallet: LazorWallet,
    pub connection: Arc<MockConnection>,
    pub authenticator: Arc<MockAuthenticator>,
    pub store: Arc<MemoryStore>,
    pub log: EventLog,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        Self::with_config(store, test_config())
    }

    pub fn with_config(store: Arc<MemoryStore>, config: WalletConfig) -> Self {
        let log = EventLog::default();
        let connection = Arc::new(MockConnection::new(log.clone()));
        let authenticator = Arc::new(MockAuthenticator::new(log.clone()));

        let wallet = LazorWallet::builder()
            .with_config(config)
            .with_connection(connection.clone())
            .with_authenticator(authenticator.clone())
            .with_store(store.clone())
            .build()
            .expect("build wallet");

        Self {
            wallet,
            connection,
            authenticator,
            store,
            log,
        }
    }

    /// Same storage, fresh process
    pub fn restart(&self) -> Self {
        Self::with_store(self.store.clone())
    }

    pub fn stored_secret(&self) -> Option<String> {
        self.store.get(SESSION_KEY).unwrap()
    }
}

pub fn test_config() -> WalletConfig {
    WalletConfig {
        simulated_delay_ms: SIMULATED_DELAY_MS,
        funding_timeout_ms: 200,
        ..WalletConfig::default()
    }
}

/// Wallet over mock collaborators and an arbitrary store
pub fn wallet_with_store(store: Arc<dyn KeyValueStore>) -> LazorWallet {
    let log = EventLog::default();
    LazorWallet::builder()
        .with_config(test_config())
        .with_connection(Arc::new(MockConnection::new(log.clone())))
        .with_authenticator(Arc::new(MockAuthenticator::new(log)))
        .with_store(store)
        .build()
        .expect("build wallet")
}

/// Resolves once a transaction occupies the approval slot
pub async fn wait_for_pending(wallet: &LazorWallet) -> PendingTransaction {
    let mut pending = wallet.subscribe_pending();
    let snapshot = pending
        .wait_for(Option::is_some)
        .await
        .expect("approval gate dropped");
    snapshot.clone().expect("pending transaction")
}
