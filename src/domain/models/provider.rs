use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

use super::Credential;
use super::ImagePayload;

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, EnumVariantNames, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum ProviderName {
    Gemini,
}

impl ProviderName {
    pub fn parse(text: String) -> Option<ProviderName> {
        return ProviderName::iter().find(|e| return e.to_string() == text);
    }
}

#[async_trait]
pub trait Provider {
    fn name(&self) -> ProviderName;

    /// Sends a single text prompt and returns the generated text. Also used as
    /// the cheap round trip that probes whether a credential is accepted.
    async fn generate_text(&self, credential: &Credential, prompt: &str) -> Result<String>;

    /// Requests an image for `instruction`, optionally passing `source` as a
    /// visual reference. Resolves to the first inline image of the response,
    /// or `None` when the provider answered without one.
    async fn generate_image(
        &self,
        credential: &Credential,
        instruction: &str,
        source: Option<&ImagePayload>,
        aspect_ratio: &str,
    ) -> Result<Option<ImagePayload>>;
}

pub type ProviderRef = Arc<dyn Provider + Send + Sync>;
