#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

use std::path;

use anyhow::anyhow;
use anyhow::Result;

use super::CredentialManager;
use super::GenerationClient;
use crate::domain::models::GeneratedImage;
use crate::domain::models::ImagePayload;
use crate::domain::models::WallpaperError;

/// Inputs captured when a generation starts, so the result can be reconciled
/// against what was actually requested.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub source: Option<ImagePayload>,
}

impl GenerationRequest {
    pub fn is_remix(&self) -> bool {
        return self.source.is_some();
    }
}

/// Everything the surface renders, and the only place user actions are
/// sequenced against the provider.
pub struct AppState {
    pub credentials: CredentialManager,
    pub client: GenerationClient,
    pub topics: Vec<String>,
    pub active_theme: Option<String>,
    pub prompt: String,
    pub images: Vec<GeneratedImage>,
    pub remix_source: Option<GeneratedImage>,
    pub preview_id: Option<String>,
    pub error: Option<String>,
    pub show_onboarding: bool,
    pub onboarding_error: Option<String>,
    pub validating_credential: bool,
    pub loading_topics: bool,
    pub crafting_prompt: bool,
    pub generating: bool,
}

impl AppState {
    /// Builds the initial state without touching storage. Call `startup` once
    /// the surface has rendered.
    pub fn new(credentials: CredentialManager, client: GenerationClient) -> AppState {
        return AppState {
            credentials,
            client,
            topics: vec![],
            active_theme: None,
            prompt: "".to_string(),
            images: vec![],
            remix_source: None,
            preview_id: None,
            error: None,
            show_onboarding: false,
            onboarding_error: None,
            validating_credential: false,
            loading_topics: false,
            crafting_prompt: false,
            generating: false,
        };
    }

    pub async fn startup(&mut self) {
        if self.credentials.initialize(&mut self.client) {
            self.refresh_topics().await;
        } else {
            self.open_onboarding();
        }
    }

    pub fn open_onboarding(&mut self) {
        self.show_onboarding = true;
        self.onboarding_error = None;
    }

    /// Closes onboarding without a new key. Only possible when one is stored.
    pub fn close_onboarding(&mut self) -> bool {
        if !self.credentials.is_present() {
            return false;
        }

        self.show_onboarding = false;
        self.onboarding_error = None;
        return true;
    }

    fn redirect_to_onboarding(&mut self) {
        tracing::info!("credential missing or rejected, redirecting to onboarding");
        self.open_onboarding();
    }

    pub async fn submit_credential(&mut self, candidate: &str) -> bool {
        self.onboarding_error = None;
        if candidate.trim().is_empty() {
            self.onboarding_error = Some("Please enter an API key.".to_string());
            return false;
        }

        self.validating_credential = true;
        let accepted = self.credentials.validate(candidate).await;
        self.validating_credential = false;

        if !accepted {
            self.onboarding_error = Some(WallpaperError::InvalidCredential.to_string());
            return false;
        }

        if let Err(err) = self.credentials.save(candidate, &mut self.client) {
            self.onboarding_error = Some(err.to_string());
            return false;
        }

        self.show_onboarding = false;
        if self.topics.is_empty() {
            self.refresh_topics().await;
        }

        return true;
    }

    /// Forgets the stored key and returns to onboarding.
    pub fn reset_credential(&mut self) {
        self.credentials.clear(&mut self.client);
        self.open_onboarding();
    }

    pub async fn refresh_topics(&mut self) {
        if !self.credentials.is_present() {
            self.redirect_to_onboarding();
            return;
        }

        self.loading_topics = true;
        let res = self.client.suggest_topics().await;
        self.loading_topics = false;

        match res {
            Ok(topics) => {
                self.topics = topics;
                self.active_theme = None;
            }
            Err(WallpaperError::MissingCredential) => self.redirect_to_onboarding(),
            Err(err) => self.error = Some(err.banner()),
        }
    }

    pub async fn select_topic(&mut self, topic: &str) {
        if !self.credentials.is_present() {
            self.redirect_to_onboarding();
            return;
        }

        self.crafting_prompt = true;
        let res = self.client.craft_prompt(topic).await;
        self.crafting_prompt = false;

        match res {
            Ok(prompt) => {
                self.prompt = prompt;
                self.active_theme = Some(topic.to_string());
            }
            Err(WallpaperError::MissingCredential) => self.redirect_to_onboarding(),
            Err(err) => self.error = Some(err.banner()),
        }
    }

    pub async fn submit_custom_topic(&mut self, text: &str) {
        let topic = text.trim();
        if topic.is_empty() {
            return;
        }

        self.select_topic(topic).await;
    }

    pub async fn regenerate_prompt(&mut self) {
        if let Some(theme) = self.active_theme.clone() {
            self.select_topic(&theme).await;
        }
    }

    pub fn set_prompt(&mut self, text: &str) {
        self.prompt = text.trim().to_string();
    }

    /// Clears the previous results and returns the request to issue, or `None`
    /// when nothing should be sent.
    pub fn begin_generation(&mut self) -> Option<GenerationRequest> {
        if self.prompt.trim().is_empty() || self.generating {
            return None;
        }

        if !self.credentials.is_present() {
            self.redirect_to_onboarding();
            return None;
        }

        let source = match self.remix_source.as_ref().map(|image| return image.payload()) {
            Some(Ok(payload)) => Some(payload),
            Some(Err(err)) => {
                tracing::warn!(error = %err, "remix source is unreadable");
                self.remix_source = None;
                self.error = Some(format!("The remix source could not be read: {err}"));
                return None;
            }
            None => None,
        };

        self.images = vec![];
        self.preview_id = None;
        self.error = None;
        self.generating = true;

        return Some(GenerationRequest {
            prompt: self.prompt.to_string(),
            source,
        });
    }

    pub fn complete_generation(
        &mut self,
        request: &GenerationRequest,
        res: Result<Vec<GeneratedImage>, WallpaperError>,
    ) {
        self.generating = false;

        match res {
            Ok(images) => {
                self.images = images;
                if request.is_remix() {
                    self.remix_source = None;
                }
            }
            Err(WallpaperError::MissingCredential) => {
                self.images = vec![];
                self.redirect_to_onboarding();
            }
            Err(err) => {
                tracing::error!(error = %err, remix = request.is_remix(), "wallpaper generation failed");
                self.images = vec![];
                self.error = Some(err.banner());
            }
        }
    }

    pub async fn generate(&mut self) {
        let Some(request) = self.begin_generation() else {
            return;
        };

        let res = self
            .client
            .render_wallpaper_set(&request.prompt, request.source.as_ref())
            .await;

        self.complete_generation(&request, res);
    }

    pub fn find_image(&self, image_id: &str) -> Option<&GeneratedImage> {
        return self.images.iter().find(|image| return image.id == image_id);
    }

    pub fn open_preview(&mut self, image_id: &str) -> bool {
        if self.find_image(image_id).is_none() {
            return false;
        }

        self.preview_id = Some(image_id.to_string());
        return true;
    }

    pub fn close_preview(&mut self) {
        self.preview_id = None;
    }

    pub fn preview(&self) -> Option<&GeneratedImage> {
        return self
            .preview_id
            .as_ref()
            .and_then(|image_id| return self.find_image(image_id));
    }

    /// Marks an image from the current results as the seed for the next
    /// generation and closes the preview.
    pub fn start_remix(&mut self, image_id: &str) -> bool {
        let Some(image) = self.find_image(image_id).cloned() else {
            return false;
        };

        self.remix_source = Some(image);
        self.preview_id = None;
        return true;
    }

    /// Seeds the next generation with an image that was not generated in this
    /// session, such as a file passed on the command line.
    pub fn start_remix_from(&mut self, payload: &ImagePayload, label: &str) {
        self.remix_source = Some(GeneratedImage::new(payload, label));
    }

    pub fn clear_remix(&mut self) {
        self.remix_source = None;
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    /// Save-to-device: writes the decoded image into `dir`.
    pub async fn save_image(&self, image_id: &str, dir: &path::Path) -> Result<path::PathBuf> {
        let image = self
            .find_image(image_id)
            .ok_or_else(|| return anyhow!(format!("No wallpaper found for id {image_id}")))?;

        return image.save_to(dir).await;
    }

    /// Gallery save. A failure lands in the error banner and the results stay
    /// as they were.
    pub async fn save_to_device(
        &mut self,
        image_id: &str,
        dir: &path::Path,
    ) -> Option<path::PathBuf> {
        match self.save_image(image_id, dir).await {
            Ok(file_path) => return Some(file_path),
            Err(err) => {
                tracing::error!(error = ?err, id = image_id, "failed to save wallpaper");
                self.error = Some(format!("The wallpaper could not be saved: {err:#}"));
                return None;
            }
        }
    }

    /// Saves every result, stopping at the first failure. Returns what was
    /// written before that.
    pub async fn save_all_to_device(&mut self, dir: &path::Path) -> Vec<path::PathBuf> {
        let mut saved = vec![];
        let mut failure = None;
        for image in &self.images {
            match image.save_to(dir).await {
                Ok(file_path) => saved.push(file_path),
                Err(err) => {
                    failure = Some(err);
                    break;
                }
            }
        }

        if let Some(err) = failure {
            tracing::error!(error = ?err, saved = saved.len(), "failed to save wallpapers");
            self.error = Some(format!("The wallpapers could not be saved: {err:#}"));
        }

        return saved;
    }

    pub async fn save_all(&self, dir: &path::Path) -> Result<Vec<path::PathBuf>> {
        let mut saved = vec![];
        for image in &self.images {
            saved.push(image.save_to(dir).await?);
        }

        return Ok(saved);
    }
}
