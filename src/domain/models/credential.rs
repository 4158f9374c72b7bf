#[cfg(test)]
#[path = "credential_test.rs"]
mod tests;

use std::fmt;

/// Key the credential is stored under in the resilient store.
pub const CREDENTIAL_KEY: &str = "gemini-api-key";

/// An opaque API token. Never printed in full, including through `Debug`, so
/// it can travel through `tracing` fields safely.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for blank input.
    pub fn parse(text: &str) -> Option<Credential> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }

        return Some(Credential(trimmed.to_string()));
    }

    pub fn expose(&self) -> &str {
        return &self.0;
    }

    pub fn redacted(&self) -> String {
        let count = self.0.chars().count();
        if count <= 8 {
            return "****".to_string();
        }

        let suffix = self.0.chars().skip(count - 4).collect::<String>();
        return format!("****{suffix}");
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return write!(f, "Credential({})", self.redacted());
    }
}
