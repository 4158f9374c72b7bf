#[cfg(test)]
#[path = "gemini_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Credential;
use crate::domain::models::ImagePayload;
use crate::domain::models::Provider;
use crate::domain::models::ProviderName;

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContentPartsBlob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
enum ContentParts {
    Text(String),
    InlineData(ContentPartsBlob),
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Content {
    role: String,
    parts: Vec<ContentParts>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageConfig {
    aspect_ratio: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_modalities: Vec<String>,
    image_config: ImageConfig,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompletionRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

// Response parts are read leniently, image models attach extra fields such as
// thought signatures next to the payload.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<ContentPartsBlob>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        return self
            .candidates
            .iter()
            .filter_map(|candidate| return candidate.content.as_ref())
            .flat_map(|content| return content.parts.iter());
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorDetails {
    code: u16,
    message: String,
    status: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ErrorResponse {
    error: ErrorDetails,
}

pub struct Gemini {
    url: String,
    model: String,
    image_model: String,
}

impl Default for Gemini {
    fn default() -> Gemini {
        return Gemini {
            url: Config::get(ConfigKey::ProviderURL),
            model: Config::get(ConfigKey::Model),
            image_model: Config::get(ConfigKey::ImageModel),
        };
    }
}

impl Gemini {
    async fn generate_content(
        &self,
        credential: &Credential,
        model: &str,
        req: &CompletionRequest,
    ) -> Result<GenerateContentResponse> {
        // The key travels in the query string, so the URL is stripped from errors
        // and never logged.
        let res = reqwest::Client::new()
            .post(format!(
                "{url}/v1beta/models/{model}:generateContent?key={key}",
                url = self.url,
                model = model,
                key = credential.expose(),
            ))
            .json(req)
            .send()
            .await
            .map_err(|err| return err.without_url())?;

        if !res.status().is_success() {
            let status = res.status().as_u16();
            let body = res.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ErrorResponse>(&body) {
                Ok(err_res) => err_res.error.message,
                Err(_) => body,
            };

            tracing::error!(
                status = status,
                model = model,
                message = message,
                "Failed to make generateContent request to Gemini"
            );
            bail!(format!(
                "Gemini request failed with status {status}: {message}"
            ));
        }

        return Ok(res
            .json::<GenerateContentResponse>()
            .await
            .map_err(|err| return err.without_url())?);
    }
}

#[async_trait]
impl Provider for Gemini {
    fn name(&self) -> ProviderName {
        return ProviderName::Gemini;
    }

    #[allow(clippy::implicit_return)]
    async fn generate_text(&self, credential: &Credential, prompt: &str) -> Result<String> {
        let req = CompletionRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![ContentParts::Text(prompt.to_string())],
            }],
            generation_config: None,
        };

        let res = self.generate_content(credential, &self.model, &req).await?;
        let text = res
            .parts()
            .filter_map(|part| return part.text.as_deref())
            .collect::<Vec<&str>>()
            .join("");

        if text.trim().is_empty() {
            bail!("Gemini returned an empty text response");
        }

        return Ok(text.trim().to_string());
    }

    #[allow(clippy::implicit_return)]
    async fn generate_image(
        &self,
        credential: &Credential,
        instruction: &str,
        source: Option<&ImagePayload>,
        aspect_ratio: &str,
    ) -> Result<Option<ImagePayload>> {
        let mut parts: Vec<ContentParts> = vec![];
        if let Some(image) = source {
            parts.push(ContentParts::InlineData(ContentPartsBlob {
                mime_type: image.mime_type.to_string(),
                data: image.data.to_string(),
            }));
        }
        parts.push(ContentParts::Text(instruction.to_string()));

        let req = CompletionRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
                image_config: ImageConfig {
                    aspect_ratio: aspect_ratio.to_string(),
                },
            }),
        };

        let res = self
            .generate_content(credential, &self.image_model, &req)
            .await?;

        let image = res
            .parts()
            .filter_map(|part| return part.inline_data.as_ref())
            .find(|blob| return !blob.data.is_empty())
            .map(|blob| return ImagePayload::new(&blob.mime_type, &blob.data));

        if image.is_none() {
            tracing::warn!(
                model = self.image_model,
                "Gemini image response did not include inline data"
            );
        }

        return Ok(image);
    }
}
