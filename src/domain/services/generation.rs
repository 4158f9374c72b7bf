#[cfg(test)]
#[path = "generation_test.rs"]
mod tests;

use tokio::task::JoinSet;

use crate::domain::models::mentions_credential;
use crate::domain::models::Credential;
use crate::domain::models::GeneratedImage;
use crate::domain::models::ImagePayload;
use crate::domain::models::ProviderRef;
use crate::domain::models::WallpaperError;

pub const TOPIC_COUNT: usize = 5;
pub const VARIANT_COUNT: usize = 4;

/// Shown whenever the provider cannot suggest themes.
pub const FALLBACK_TOPICS: [&str; TOPIC_COUNT] = [
    "Cyberpunk Neon City",
    "Ethereal Misty Forest",
    "Minimalist Geometric Shapes",
    "Retro Vaporwave Sunset",
    "Cosmic Nebula Dreams",
];

fn topics_prompt() -> String {
    return format!("Suggest {TOPIC_COUNT} distinct, creative and visually striking aesthetic themes for phone wallpapers, each two to four words long. Reply with only a comma separated list, without numbering or any other text.");
}

fn craft_prompt_instruction(theme: &str) -> String {
    return format!("Write a single descriptive prompt for an AI image generator to create a phone wallpaper with the theme \"{theme}\". Describe the visual elements, lighting, artistic style and mood in under 40 words. Reply with only the prompt.");
}

fn render_instruction(prompt: &str, is_remix: bool) -> String {
    if is_remix {
        return format!("Remix the provided image into a new phone wallpaper. Keep its overall feel recognisable while following these instructions: {prompt}");
    }

    return format!("Create a striking phone wallpaper with a tall portrait composition that fills the whole frame, without any text or borders. {prompt}");
}

fn strip_list_marker(text: &str) -> &str {
    let trimmed = text
        .trim()
        .trim_start_matches(|c: char| return c == '-' || c == '*' || c == '•')
        .trim_start();

    let digits = trimmed.chars().take_while(|c| return c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &trimmed[digits..];
        if let Some(stripped) = rest.strip_prefix('.').or_else(|| return rest.strip_prefix(')')) {
            return stripped.trim_start();
        }
    }

    return trimmed;
}

fn strip_quotes(text: &str) -> &str {
    return text
        .trim()
        .trim_matches(|c: char| return c == '"' || c == '\'' || c == '*' || c == '`')
        .trim();
}

/// Splits a comma delimited reply into at most `TOPIC_COUNT` clean themes.
pub fn parse_topics(text: &str) -> Vec<String> {
    return text
        .split(|c: char| return c == ',' || c == '\n')
        .map(|topic| return strip_quotes(strip_list_marker(topic)))
        .filter(|topic| return !topic.is_empty())
        .take(TOPIC_COUNT)
        .map(|topic| return topic.to_string())
        .collect();
}

/// Tops a short list up to `TOPIC_COUNT` with fallback themes it does not
/// already contain.
fn fill_topics(mut topics: Vec<String>) -> Vec<String> {
    for fallback in FALLBACK_TOPICS {
        if topics.len() >= TOPIC_COUNT {
            break;
        }

        if !topics
            .iter()
            .any(|topic| return topic.eq_ignore_ascii_case(fallback))
        {
            topics.push(fallback.to_string());
        }
    }

    return topics;
}

fn classify(err: anyhow::Error) -> WallpaperError {
    if mentions_credential(&err) {
        return WallpaperError::MissingCredential;
    }

    return WallpaperError::ProviderFailure(format!("{err:#}"));
}

async fn render(
    provider: ProviderRef,
    credential: Credential,
    prompt: String,
    source: Option<ImagePayload>,
    aspect_ratio: String,
) -> Result<ImagePayload, WallpaperError> {
    let instruction = render_instruction(&prompt, source.is_some());
    let res = provider
        .generate_image(&credential, &instruction, source.as_ref(), &aspect_ratio)
        .await;

    match res {
        Ok(Some(image)) => return Ok(image),
        Ok(None) => return Err(WallpaperError::NoImageProduced),
        Err(err) => return Err(classify(err)),
    }
}

/// Talks to the provider on behalf of the coordinator. Every request needs the
/// client to be armed with a credential first.
pub struct GenerationClient {
    provider: ProviderRef,
    credential: Option<Credential>,
    aspect_ratio: String,
}

impl GenerationClient {
    pub fn new(provider: ProviderRef, aspect_ratio: &str) -> GenerationClient {
        return GenerationClient {
            provider,
            credential: None,
            aspect_ratio: aspect_ratio.to_string(),
        };
    }

    pub fn arm(&mut self, credential: Credential) {
        self.credential = Some(credential);
    }

    pub fn disarm(&mut self) {
        self.credential = None;
    }

    pub fn is_armed(&self) -> bool {
        return self.credential.is_some();
    }

    fn credential(&self) -> Result<&Credential, WallpaperError> {
        return self
            .credential
            .as_ref()
            .ok_or(WallpaperError::MissingCredential);
    }

    /// Always yields `TOPIC_COUNT` themes. Provider failures and short replies
    /// are filled from a built-in list.
    pub async fn suggest_topics(&self) -> Result<Vec<String>, WallpaperError> {
        let credential = self.credential()?;

        let topics = match self
            .provider
            .generate_text(credential, &topics_prompt())
            .await
        {
            Ok(text) => parse_topics(&text),
            Err(err) => {
                tracing::warn!(error = %err, "Failed to suggest topics, using fallback");
                vec![]
            }
        };

        return Ok(fill_topics(topics));
    }

    /// Falls back to the theme itself unless the credential was the problem.
    pub async fn craft_prompt(&self, theme: &str) -> Result<String, WallpaperError> {
        let credential = self.credential()?;

        let res = self
            .provider
            .generate_text(credential, &craft_prompt_instruction(theme))
            .await;

        match res {
            Ok(text) => {
                let prompt = strip_quotes(&text);
                if prompt.is_empty() {
                    return Ok(theme.to_string());
                }

                return Ok(prompt.to_string());
            }
            Err(err) => {
                if mentions_credential(&err) {
                    return Err(WallpaperError::MissingCredential);
                }

                tracing::warn!(error = %err, theme = theme, "Failed to craft prompt, using theme");
                return Ok(theme.to_string());
            }
        }
    }

    pub async fn render_image(
        &self,
        prompt: &str,
        source: Option<&ImagePayload>,
    ) -> Result<ImagePayload, WallpaperError> {
        let credential = self.credential()?;

        return render(
            self.provider.clone(),
            credential.clone(),
            prompt.to_string(),
            source.cloned(),
            self.aspect_ratio.to_string(),
        )
        .await;
    }

    /// Renders `VARIANT_COUNT` variants concurrently. Every request is allowed
    /// to settle; the set only succeeds when all of them did.
    pub async fn render_wallpaper_set(
        &self,
        prompt: &str,
        source: Option<&ImagePayload>,
    ) -> Result<Vec<GeneratedImage>, WallpaperError> {
        let credential = self.credential()?;

        let mut tasks = JoinSet::new();
        for idx in 0..VARIANT_COUNT {
            let task = render(
                self.provider.clone(),
                credential.clone(),
                prompt.to_string(),
                source.cloned(),
                self.aspect_ratio.to_string(),
            );
            tasks.spawn(async move {
                return (idx, task.await);
            });
        }

        let mut results: Vec<Option<Result<ImagePayload, WallpaperError>>> =
            vec![None; VARIANT_COUNT];
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, res)) => results[idx] = Some(res),
                Err(err) => {
                    tracing::error!(error = %err, "Wallpaper task did not complete");
                }
            }
        }

        let mut images: Vec<GeneratedImage> = vec![];
        let mut failures: Vec<WallpaperError> = vec![];
        for res in results {
            match res {
                Some(Ok(payload)) => images.push(GeneratedImage::new(&payload, prompt)),
                Some(Err(err)) => failures.push(err),
                None => failures.push(WallpaperError::ProviderFailure(
                    "A wallpaper request was interrupted".to_string(),
                )),
            }
        }

        if failures.contains(&WallpaperError::MissingCredential) {
            return Err(WallpaperError::MissingCredential);
        }

        if let Some(err) = failures.into_iter().next() {
            tracing::warn!(error = %err, "Wallpaper set failed, discarding {} rendered variants", images.len());
            match err {
                WallpaperError::ProviderFailure(msg) => {
                    return Err(WallpaperError::ProviderFailure(msg));
                }
                _ => return Err(WallpaperError::ProviderFailure(err.to_string())),
            }
        }

        tracing::info!(count = images.len(), remix = source.is_some(), "rendered wallpaper set");
        return Ok(images);
    }
}
