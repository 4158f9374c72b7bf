#[cfg(test)]
#[path = "commands_test.rs"]
mod tests;

use std::path;

use anyhow::anyhow;
use anyhow::bail;
use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Password;
use yansi::Paint;

use super::cli::KeyTask;
use super::cli::Task;
use super::ui;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::ImagePayload;
use crate::domain::models::Provider;
use crate::domain::models::ProviderName;
use crate::domain::models::WallpaperError;
use crate::domain::services::AppState;
use crate::domain::services::CredentialManager;
use crate::domain::services::GenerationClient;
use crate::domain::services::ResilientStore;
use crate::infrastructure::providers::ProviderManager;

const KEY_HINT: &str = "Run `wallcraft key set` to add one.";

/// Wires the coordinator from the loaded config. Nothing is read from the
/// store until `startup` or `initialize` runs.
pub fn build_app_state() -> Result<AppState> {
    let provider_name = Config::get(ConfigKey::Provider);
    let provider = ProviderName::parse(provider_name.to_string())
        .ok_or_else(|| return anyhow!(format!("Unknown provider {provider_name}")))?;

    let provider = ProviderManager::get(provider)?;
    tracing::debug!(provider = %provider.name(), "building app state");
    let store = ResilientStore::from_path(&Config::get(ConfigKey::StoreFile));
    let credentials = CredentialManager::new(store, provider.clone());
    let client = GenerationClient::new(provider, &Config::get(ConfigKey::AspectRatio));

    return Ok(AppState::new(credentials, client));
}

fn require_credential(app_state: &mut AppState) -> Result<()> {
    if !app_state.credentials.initialize(&mut app_state.client) {
        bail!(format!("{} {KEY_HINT}", WallpaperError::MissingCredential));
    }

    return Ok(());
}

/// Turns coordinator state after an action into a command result.
fn settle(app_state: &AppState) -> Result<()> {
    if app_state.show_onboarding {
        bail!(format!(
            "Gemini did not accept the stored API key. {KEY_HINT}"
        ));
    }

    if let Some(err) = &app_state.error {
        bail!(err.to_string());
    }

    return Ok(());
}

pub fn key_status_text(app_state: &AppState) -> String {
    let Some(credential) = app_state.credentials.current() else {
        return format!("No Gemini API key is stored. {KEY_HINT}");
    };

    let mut res = format!("A Gemini API key is stored: {}", credential.redacted());
    if !app_state.credentials.is_persistent() {
        res = format!("{res} (memory only, the key store is unavailable)");
    }

    return res;
}

async fn key_set(app_state: &mut AppState, key: Option<String>) -> Result<()> {
    let candidate = match key {
        Some(key) => key,
        None => Password::with_theme(&ColorfulTheme::default())
            .with_prompt("Gemini API key")
            .interact()?,
    };

    if candidate.trim().is_empty() {
        bail!("Please enter an API key.");
    }

    if !app_state.credentials.validate(&candidate).await {
        bail!(WallpaperError::InvalidCredential.to_string());
    }

    app_state
        .credentials
        .save(&candidate, &mut app_state.client)?;

    println!("{}", Paint::green(key_status_text(app_state)));
    return Ok(());
}

fn key_clear(app_state: &mut AppState) {
    app_state.reset_credential();
    println!("Forgot the stored Gemini API key.");
}

fn key_status(app_state: &mut AppState) {
    app_state.credentials.initialize(&mut app_state.client);
    println!("{}", key_status_text(app_state));
}

async fn topics(app_state: &mut AppState) -> Result<()> {
    require_credential(app_state)?;
    app_state.refresh_topics().await;
    settle(app_state)?;

    for topic in &app_state.topics {
        println!("- {topic}");
    }

    return Ok(());
}

async fn prompt(app_state: &mut AppState, theme: &str) -> Result<()> {
    require_credential(app_state)?;
    app_state.submit_custom_topic(theme).await;
    settle(app_state)?;

    println!("{}", app_state.prompt);
    return Ok(());
}

async fn generate(
    app_state: &mut AppState,
    prompt: &str,
    remix: Option<path::PathBuf>,
) -> Result<()> {
    require_credential(app_state)?;

    if let Some(file_path) = remix {
        let payload = ImagePayload::from_file(&file_path).await?;
        let label = file_path
            .file_name()
            .map(|name| return name.to_string_lossy().to_string())
            .unwrap_or_default();
        app_state.start_remix_from(&payload, &label);
    }

    app_state.set_prompt(prompt);
    if app_state.prompt.is_empty() {
        bail!("A prompt is required to generate wallpapers.");
    }

    app_state.generate().await;
    settle(app_state)?;

    let output_dir = path::PathBuf::from(Config::get(ConfigKey::OutputDir));
    for file_path in app_state.save_all(&output_dir).await? {
        println!("{}", file_path.to_string_lossy());
    }

    return Ok(());
}

pub async fn run(task: Task) -> Result<()> {
    let mut app_state = build_app_state()?;

    match task {
        Task::Studio => return ui::start(&mut app_state).await,
        Task::Key(KeyTask::Set(key)) => return key_set(&mut app_state, key).await,
        Task::Key(KeyTask::Clear) => key_clear(&mut app_state),
        Task::Key(KeyTask::Status) => key_status(&mut app_state),
        Task::Topics => return topics(&mut app_state).await,
        Task::Prompt(theme) => return prompt(&mut app_state, &theme).await,
        Task::Generate { prompt, remix } => {
            return generate(&mut app_state, &prompt, remix).await;
        }
    }

    return Ok(());
}
