use rand::Rng;
use solana_sdk::instruction::Instruction;
use solana_sdk::native_token::LAMPORTS_PER_SOL;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_sdk::system_instruction;

//=============================================================================
// Amount Helpers
//=============================================================================

/// Convert a SOL amount to lamports, rounding to the nearest lamport
pub fn sol_to_lamports(sol: f64) -> u64 {
    (sol * LAMPORTS_PER_SOL as f64).round() as u64
}

pub fn lamports_to_sol(lamports: u64) -> f64 {
    lamports as f64 / LAMPORTS_PER_SOL as f64
}

//=============================================================================
// Instruction Helpers
//=============================================================================

/// System transfer of `sol` from `from` to `to`
pub fn transfer_sol(from: &Pubkey, to: &Pubkey, sol: f64) -> Instruction {
    system_instruction::transfer(from, to, sol_to_lamports(sol))
}

//=============================================================================
// Signatures
//=============================================================================

/// Random 64-byte signature. Well-formed, verifies against nothing.
pub fn random_signature() -> Signature {
    let mut bytes = [0u8; 64];
    rand::thread_rng().fill(&mut bytes[..]);
    Signature::from(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_sol_to_lamports() {
        assert_eq!(sol_to_lamports(0.05), 50_000_000);
        assert_eq!(sol_to_lamports(1.0), LAMPORTS_PER_SOL);
        assert_eq!(lamports_to_sol(25_000_000), 0.025);
    }

    #[test]
    fn test_random_signature_is_base58_of_64_bytes() {
        let sig = random_signature();
        let encoded = sig.to_string();
        assert_eq!(Signature::from_str(&encoded).unwrap(), sig);
        assert_ne!(random_signature(), sig);
    }
}
