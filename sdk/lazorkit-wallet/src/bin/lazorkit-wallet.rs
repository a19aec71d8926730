//! Lazorkit wallet CLI
//!
//! Terminal front-end for the passkey wallet. The person at the keyboard is
//! both the passkey holder and the transaction approver.

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use lazorkit_wallet::core::authenticator::{
    Credential, PasskeyAuthenticator, RelyingParty, UserInfo,
};
use lazorkit_wallet::error::CeremonyError;
use lazorkit_wallet::logging::init_logging;
use lazorkit_wallet::utils::lamports_to_sol;
use lazorkit_wallet::{
    FileStore, LazorWallet, PendingTransaction, Provenance, SubmissionResult, SubmitOptions,
    WalletConfig,
};
use solana_sdk::pubkey::Pubkey;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

#[derive(Parser)]
#[command(name = "lazorkit-wallet")]
#[command(about = "Passkey-gated Solana wallet")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// File holding the wallet session
    #[arg(long, global = true, default_value = "lazorkit-wallet.json")]
    store: PathBuf,

    /// Ask for passkey presence on the terminal instead of skipping the ceremony
    #[arg(long, global = true)]
    passkey_prompt: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in, creating a wallet key on first use
    Connect,

    /// Log out and erase the stored key
    Disconnect,

    /// Show connection state, address and balance
    Status,

    /// Transfer SOL once approved
    Send {
        /// Recipient address
        #[arg(long)]
        to: String,

        /// Amount in SOL
        #[arg(long)]
        sol: f64,

        /// Token to pay fees with (informational)
        #[arg(long)]
        fee_token: Option<String>,

        /// Request paymaster sponsorship (informational)
        #[arg(long)]
        sponsored: bool,

        /// Approve without prompting
        #[arg(short, long)]
        yes: bool,
    },
}

/// Shared line reader so prompts never lose buffered input
#[derive(Clone)]
struct Terminal {
    lines: Arc<Mutex<Lines<BufReader<Stdin>>>>,
}

impl Terminal {
    fn new() -> Self {
        Self {
            lines: Arc::new(Mutex::new(BufReader::new(tokio::io::stdin()).lines())),
        }
    }

    async fn ask(&self, prompt: &str) -> std::io::Result<bool> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        let answer = self.lines.lock().await.next_line().await?;
        Ok(matches!(
            answer.as_deref().map(|a| a.trim().to_ascii_lowercase()).as_deref(),
            Some("y") | Some("yes")
        ))
    }
}

struct TerminalAuthenticator {
    terminal: Terminal,
}

impl TerminalAuthenticator {
    async fn presence(&self, prompt: &str, timeout_ms: u64) -> Result<Credential, CeremonyError> {
        match tokio::time::timeout(Duration::from_millis(timeout_ms), self.terminal.ask(prompt))
            .await
        {
            Ok(Ok(true)) => Ok(Credential::default()),
            Ok(Ok(false)) => Err(CeremonyError::Cancelled),
            Ok(Err(e)) => Err(CeremonyError::Platform(e.to_string())),
            Err(_) => Err(CeremonyError::Timeout),
        }
    }
}

#[async_trait]
impl PasskeyAuthenticator for TerminalAuthenticator {
    async fn create(
        &self,
        _challenge: &[u8; 32],
        rp: &RelyingParty,
        user: &UserInfo,
        timeout_ms: u64,
    ) -> Result<Credential, CeremonyError> {
        let prompt = format!(
            "Create a {} passkey for {}? [y/N] ",
            rp.name, user.display_name
        );
        self.presence(&prompt, timeout_ms).await
    }

    async fn get(
        &self,
        _challenge: &[u8; 32],
        timeout_ms: u64,
    ) -> Result<Credential, CeremonyError> {
        self.presence("Verify with your passkey? [y/N] ", timeout_ms)
            .await
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (ignore if not found)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_logging(if cli.verbose { "debug" } else { "info" });

    let config = match &cli.config {
        Some(path) => WalletConfig::from_file(path)?,
        None => WalletConfig::from_env()?,
    };

    let store = FileStore::open(&cli.store)
        .with_context(|| format!("Failed to open wallet store {}", cli.store.display()))?;
    let terminal = Terminal::new();

    let mut builder = LazorWallet::builder()
        .with_config(config)
        .with_store(Arc::new(store));
    if cli.passkey_prompt {
        builder = builder.with_authenticator(Arc::new(TerminalAuthenticator {
            terminal: terminal.clone(),
        }));
    }
    let wallet = Arc::new(builder.build()?);

    match cli.command {
        Commands::Connect => {
            let address = wallet.connect().await?;
            println!("Connected: {}", address);
        },
        Commands::Disconnect => {
            wallet.disconnect().await;
            println!("Disconnected");
        },
        Commands::Status => print_status(&wallet).await,
        Commands::Send {
            to,
            sol,
            fee_token,
            sponsored,
            yes,
        } => {
            let to = Pubkey::from_str(&to).with_context(|| format!("Invalid recipient {}", to))?;
            let options = SubmitOptions {
                fee_token,
                sponsored,
            };
            send(wallet, &terminal, to, sol, options, yes).await?;
        },
    }

    Ok(())
}

async fn print_status(wallet: &LazorWallet) {
    let Some(address) = wallet.address() else {
        println!("Not connected");
        return;
    };

    println!("Address: {}", address);
    match wallet.balance().await {
        Ok(lamports) => println!("Balance: {} SOL", lamports_to_sol(lamports)),
        Err(e) => println!("Balance: unavailable ({})", e),
    }
}

async fn send(
    wallet: Arc<LazorWallet>,
    terminal: &Terminal,
    to: Pubkey,
    sol: f64,
    options: SubmitOptions,
    auto_approve: bool,
) -> Result<()> {
    let instruction = wallet.transfer(&to, sol)?;
    let mut pending = wallet.subscribe_pending();

    let mut submission = tokio::spawn({
        let wallet = wallet.clone();
        async move { wallet.submit(vec![instruction], options).await }
    });

    let request = tokio::select! {
        changed = pending.wait_for(Option::is_some) => changed?.clone(),
        finished = &mut submission => return report(finished?),
    };

    if let Some(request) = &request {
        describe(request, &to, sol, wallet.config().paymaster_url.as_deref());
    }

    let approved = auto_approve || terminal.ask("Approve this transaction? [y/N] ").await?;
    if approved {
        wallet.confirm();
    } else {
        wallet.reject();
    }

    report(submission.await?)
}

fn describe(request: &PendingTransaction, to: &Pubkey, sol: f64, paymaster: Option<&str>) {
    println!("Transaction #{} awaiting approval", request.id);
    println!("  Transfer: {} SOL -> {}", sol, to);
    println!("  Instructions: {}", request.instructions.len());
    if let Some(token) = &request.options.fee_token {
        println!("  Fee token: {}", token);
    }
    if request.options.sponsored {
        match paymaster {
            Some(url) => println!("  Fees: sponsored by {}", url),
            None => println!("  Fees: sponsored"),
        }
    }
}

fn report(result: lazorkit_wallet::Result<SubmissionResult>) -> Result<()> {
    let result = result?;
    match result.provenance {
        Provenance::Real => println!("Confirmed: {}", result.signature),
        Provenance::Simulated => {
            println!("Simulated (not on-chain): {}", result.signature)
        },
    }
    Ok(())
}
