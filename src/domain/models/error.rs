#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

use thiserror::Error;

/// Failures the application state coordinator reconciles into visible state.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum WallpaperError {
    /// No credential is armed, or the provider refused the one that is. Always
    /// routed to onboarding rather than the error banner.
    #[error("No Gemini API key is configured. Add one to continue.")]
    MissingCredential,

    /// Raised only while validating a candidate key during onboarding.
    #[error("That API key was rejected by Gemini. Double check it and try again.")]
    InvalidCredential,

    #[error("Gemini failed to generate wallpapers: {0}")]
    ProviderFailure(String),

    #[error("Gemini responded without any image data.")]
    NoImageProduced,

    /// Absorbed by the resilient store, only ever logged.
    #[error("Persistent storage is unavailable: {0}")]
    StorageUnavailable(String),
}

impl WallpaperError {
    /// The banner text shown for failures that are not redirected to
    /// onboarding. `NoImageProduced` displays like any other provider failure.
    pub fn banner(&self) -> String {
        match self {
            WallpaperError::NoImageProduced => {
                return WallpaperError::ProviderFailure(self.to_string()).to_string();
            }
            _ => return self.to_string(),
        }
    }
}

/// Provider errors carry no type information past the adapter boundary, so
/// credential problems are recognised by what the message talks about.
pub fn mentions_credential(err: &anyhow::Error) -> bool {
    let text = format!("{err:#}").to_lowercase();

    return [
        "api key",
        "api_key",
        "unauthorized",
        "unauthenticated",
        "permission denied",
        "permission_denied",
        "no credential",
    ]
    .iter()
    .any(|needle| return text.contains(needle));
}
