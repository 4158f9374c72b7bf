#[cfg(test)]
#[path = "credentials_test.rs"]
mod tests;

use super::GenerationClient;
use super::ResilientStore;
use crate::domain::models::Credential;
use crate::domain::models::ProviderRef;
use crate::domain::models::WallpaperError;
use crate::domain::models::CREDENTIAL_KEY;

const PROBE_PROMPT: &str = "Reply with the single word: ok";

/// Owns the API credential for the session and keeps the generation client
/// armed with it.
pub struct CredentialManager {
    store: ResilientStore,
    provider: ProviderRef,
    current: Option<Credential>,
}

impl CredentialManager {
    pub fn new(store: ResilientStore, provider: ProviderRef) -> CredentialManager {
        return CredentialManager {
            store,
            provider,
            current: None,
        };
    }

    /// Loads a previously saved credential. Returns `false` when onboarding is
    /// needed. Touches storage, so it must not run while state is still being
    /// constructed.
    pub fn initialize(&mut self, client: &mut GenerationClient) -> bool {
        let stored = self
            .store
            .get(CREDENTIAL_KEY)
            .and_then(|text| return Credential::parse(&text));

        match stored {
            Some(credential) => {
                tracing::debug!(credential = ?credential, "loaded stored credential");
                client.arm(credential.clone());
                self.current = Some(credential);
                return true;
            }
            None => {
                tracing::debug!("no stored credential, onboarding required");
                return false;
            }
        }
    }

    /// Probes the provider with `candidate`. Any failure counts as a rejection.
    pub async fn validate(&self, candidate: &str) -> bool {
        let Some(credential) = Credential::parse(candidate) else {
            return false;
        };

        match self.provider.generate_text(&credential, PROBE_PROMPT).await {
            Ok(_) => {
                tracing::info!(credential = ?credential, "credential accepted");
                return true;
            }
            Err(err) => {
                tracing::warn!(credential = ?credential, error = %err, "credential rejected");
                return false;
            }
        }
    }

    /// Arms the client and writes through to storage. Only call after a
    /// successful `validate`.
    pub fn save(
        &mut self,
        candidate: &str,
        client: &mut GenerationClient,
    ) -> Result<(), WallpaperError> {
        let Some(credential) = Credential::parse(candidate) else {
            return Err(WallpaperError::InvalidCredential);
        };

        client.arm(credential.clone());
        self.store.set(CREDENTIAL_KEY, credential.expose());
        self.current = Some(credential);

        return Ok(());
    }

    pub fn clear(&mut self, client: &mut GenerationClient) {
        client.disarm();
        self.store.remove(CREDENTIAL_KEY);
        self.current = None;
    }

    pub fn is_present(&self) -> bool {
        return self.current.is_some();
    }

    pub fn current(&self) -> Option<&Credential> {
        return self.current.as_ref();
    }

    pub fn is_persistent(&self) -> bool {
        return self.store.is_persistent();
    }
}
