use solana_sdk::native_token::LAMPORTS_PER_SOL;

// Default RPC endpoint (Devnet)
pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";

/// Storage key holding the session keypair bytes
pub const SESSION_SECRET_KEY: &str = "lazor_secret";

/// Relying party shown in the passkey prompt
pub const RELYING_PARTY_NAME: &str = "Lazorkit";

pub const CEREMONY_TIMEOUT_MS: u64 = 60_000;

/// Balances below this trigger a faucet request on connect
pub const TOP_UP_THRESHOLD_LAMPORTS: u64 = LAMPORTS_PER_SOL / 20;

pub const AIRDROP_LAMPORTS: u64 = LAMPORTS_PER_SOL;

pub const FUNDING_TIMEOUT_MS: u64 = 10_000;

/// Delay before a simulated signature is handed back
pub const SIMULATED_DELAY_MS: u64 = 1_500;
