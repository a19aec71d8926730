use crate::error::CeremonyError;
use async_trait::async_trait;

/// Relying party shown in the passkey prompt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelyingParty {
    pub name: String,
}

/// User entity passed to passkey registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    pub id: [u8; 16],
    pub name: String,
    pub display_name: String,
}

impl Default for UserInfo {
    fn default() -> Self {
        Self {
            id: [0u8; 16],
            name: "user".to_string(),
            display_name: "User".to_string(),
        }
    }
}

/// Proof that the platform prompt completed. Carries nothing the wallet reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct Credential;

/// Platform biometric / passkey prompt.
///
/// Implementations wrap whatever the host offers (WebAuthn, OS keychain,
/// hardware key). The wallet treats every call as best-effort.
#[async_trait]
pub trait PasskeyAuthenticator: Send + Sync {
    async fn create(
        &self,
        challenge: &[u8; 32],
        rp: &RelyingParty,
        user: &UserInfo,
        timeout_ms: u64,
    ) -> Result<Credential, CeremonyError>;

    async fn get(&self, challenge: &[u8; 32], timeout_ms: u64)
        -> Result<Credential, CeremonyError>;
}

/// Authenticator for hosts without a passkey platform. Every ceremony is skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedAuthenticator;

#[async_trait]
impl PasskeyAuthenticator for UnsupportedAuthenticator {
    async fn create(
        &self,
        _challenge: &[u8; 32],
        _rp: &RelyingParty,
        _user: &UserInfo,
        _timeout_ms: u64,
    ) -> Result<Credential, CeremonyError> {
        Err(CeremonyError::Unsupported)
    }

    async fn get(
        &self,
        _challenge: &[u8; 32],
        _timeout_ms: u64,
    ) -> Result<Credential, CeremonyError> {
        Err(CeremonyError::Unsupported)
    }
}
