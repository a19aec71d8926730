use crate::core::authenticator::{PasskeyAuthenticator, RelyingParty, UserInfo};
use crate::types::{CeremonyMode, CeremonyOutcome};
use std::sync::Arc;
use tracing::{debug, warn};

/// Best-effort passkey prompt.
///
/// The outcome is a UX signal only: it is not bound to the signing key and a
/// skipped ceremony never stops the flow that triggered it.
pub struct CredentialCeremony {
    authenticator: Arc<dyn PasskeyAuthenticator>,
    relying_party: RelyingParty,
    user: UserInfo,
    timeout_ms: u64,
}

impl CredentialCeremony {
    pub fn new(
        authenticator: Arc<dyn PasskeyAuthenticator>,
        relying_party: impl Into<String>,
        timeout_ms: u64,
    ) -> Self {
        Self {
            authenticator,
            relying_party: RelyingParty {
                name: relying_party.into(),
            },
            user: UserInfo::default(),
            timeout_ms,
        }
    }

    /// Run the prompt with a fresh random challenge.
    pub async fn trigger(&self, mode: CeremonyMode) -> CeremonyOutcome {
        let challenge = rand::random::<[u8; 32]>();

        let result = match mode {
            CeremonyMode::Create => {
                self.authenticator
                    .create(&challenge, &self.relying_party, &self.user, self.timeout_ms)
                    .await
            },
            CeremonyMode::Get => self.authenticator.get(&challenge, self.timeout_ms).await,
        };

        match result {
            Ok(_credential) => {
                debug!(mode = mode.as_str(), "Passkey ceremony completed");
                CeremonyOutcome::Completed
            },
            Err(e) => {
                warn!(mode = mode.as_str(), error = %e, "Passkey ceremony skipped");
                CeremonyOutcome::Skipped(e.to_string())
            },
        }
    }
}
