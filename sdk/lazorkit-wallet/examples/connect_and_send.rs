// Example: Connecting a session wallet and sending an approved transfer
//
// This example demonstrates how to:
// 1. Build a wallet against devnet with in-memory storage
// 2. Connect, creating a session key and requesting devnet funds
// 3. Submit a transfer and approve it from a second task
//
// Without a reachable devnet the submission falls back to a simulated signature.

use lazorkit_wallet::{LazorWallet, Provenance, SubmitOptions, WalletConfig};
use solana_sdk::pubkey::Pubkey;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    lazorkit_wallet::logging::init_logging("info");

    // 1. Build the wallet
    let wallet = Arc::new(
        LazorWallet::builder()
            .with_config(WalletConfig::from_env()?)
            .build()?,
    );

    // 2. Connect
    let address = wallet.connect().await?;
    println!("Connected: {}", address);

    // 3. Approve whatever lands in the approval slot
    let approver = tokio::spawn({
        let wallet = wallet.clone();
        async move {
            let mut pending = wallet.subscribe_pending();
            if let Ok(request) = pending.wait_for(Option::is_some).await {
                if let Some(request) = request.as_ref() {
                    println!("Approving transaction #{}", request.id);
                }
            }
            wallet.confirm();
        }
    });

    let transfer = wallet.transfer(&Pubkey::new_unique(), 0.05)?;
    let result = wallet
        .submit(vec![transfer], SubmitOptions::default().with_fee_token("USDC"))
        .await?;
    approver.await?;

    match result.provenance {
        Provenance::Real => println!("Confirmed: {}", result.signature),
        Provenance::Simulated => println!("Simulated: {}", result.signature),
    }

    Ok(())
}
