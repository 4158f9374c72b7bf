use std::path;

use anyhow::Result;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use dialoguer::Password;
use dialoguer::Select;
use yansi::Paint;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::GeneratedImage;
use crate::domain::services::AppState;
use crate::domain::services::VARIANT_COUNT;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MenuItem {
    PickTopic,
    CustomTopic,
    RefreshTopics,
    RegeneratePrompt,
    EditPrompt,
    Generate,
    ViewWallpaper,
    SaveAll,
    ClearRemix,
    ChangeKey,
    ForgetKey,
    Quit,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PreviewItem {
    Save,
    Remix,
    Back,
}

fn select(prompt: &str, items: &[String]) -> Result<Option<usize>> {
    let idx = Select::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(0)
        .items(items)
        .interact_opt()?;

    return Ok(idx);
}

fn output_dir() -> path::PathBuf {
    return path::PathBuf::from(Config::get(ConfigKey::OutputDir));
}

fn print_banner() {
    println!(
        "{}\n{}\n",
        Paint::magenta("Wallcraft").bold(),
        Paint::new("Phone wallpapers from a single theme, rendered by Gemini.").dimmed()
    );
}

fn print_status(app_state: &AppState) {
    let theme = app_state
        .active_theme
        .clone()
        .unwrap_or_else(|| return "none".to_string());
    let mut prompt = app_state.prompt.to_string();
    if prompt.is_empty() {
        prompt = "(empty)".to_string();
    }

    println!();
    println!("{} {}", Paint::cyan("Theme:").bold(), theme);
    println!("{} {}", Paint::cyan("Prompt:").bold(), prompt);
    if let Some(source) = &app_state.remix_source {
        println!(
            "{} {} ({})",
            Paint::cyan("Remixing:").bold(),
            source.id,
            source.prompt
        );
    }
    if !app_state.images.is_empty() {
        println!(
            "{} {}",
            Paint::cyan("Wallpapers:").bold(),
            app_state.images.len()
        );
    }
    println!();
}

fn print_error(app_state: &mut AppState) {
    if let Some(err) = app_state.error.clone() {
        eprintln!("{}", Paint::red(err));
        app_state.dismiss_error();
    }
}

fn describe_image(idx: usize, image: &GeneratedImage) -> String {
    return format!(
        "#{} {} ({})",
        idx + 1,
        image.id,
        image.created_at.format("%H:%M:%S")
    );
}

fn describe_format(image: &GeneratedImage) -> Result<String> {
    let payload = image.payload()?;
    return Ok(format!(
        "{}, {} bytes",
        payload.mime_type,
        payload.bytes()?.len()
    ));
}

fn menu_items(app_state: &AppState) -> Vec<(MenuItem, String)> {
    let mut items = vec![
        (MenuItem::PickTopic, "Pick a suggested theme".to_string()),
        (MenuItem::CustomTopic, "Type your own theme".to_string()),
        (MenuItem::RefreshTopics, "Suggest new themes".to_string()),
    ];

    if app_state.active_theme.is_some() {
        items.push((
            MenuItem::RegeneratePrompt,
            "Write a new prompt for this theme".to_string(),
        ));
    }

    items.push((MenuItem::EditPrompt, "Edit the prompt".to_string()));

    if !app_state.prompt.is_empty() {
        let mut label = format!("Generate {VARIANT_COUNT} wallpapers");
        if app_state.remix_source.is_some() {
            label = format!("Remix into {VARIANT_COUNT} wallpapers");
        }
        items.push((MenuItem::Generate, label));
    }

    if !app_state.images.is_empty() {
        items.push((MenuItem::ViewWallpaper, "Preview a wallpaper".to_string()));
        items.push((MenuItem::SaveAll, "Save all wallpapers".to_string()));
    }

    if app_state.remix_source.is_some() {
        items.push((MenuItem::ClearRemix, "Stop remixing".to_string()));
    }

    items.push((MenuItem::ChangeKey, "Change API key".to_string()));
    items.push((MenuItem::ForgetKey, "Forget API key".to_string()));
    items.push((MenuItem::Quit, "Quit".to_string()));

    return items;
}

/// Returns `false` when the user chose to quit instead of entering a key.
async fn onboarding(app_state: &mut AppState) -> Result<bool> {
    println!(
        "{}",
        Paint::yellow("Wallcraft needs a Gemini API key. Create one for free at https://aistudio.google.com/app/apikey")
    );
    if !app_state.credentials.is_persistent() {
        println!(
            "{}",
            Paint::new("The key store is unavailable, so the key will only be kept for this session.")
                .dimmed()
        );
    }

    loop {
        if let Some(err) = &app_state.onboarding_error {
            eprintln!("{}", Paint::red(err));
        }

        let mut options = vec!["Enter a Gemini API key".to_string()];
        if app_state.credentials.is_present() {
            options.push("Keep the current key".to_string());
        }
        options.push("Quit".to_string());

        let Some(idx) = select("Onboarding", &options)? else {
            return Ok(false);
        };

        match options[idx].as_str() {
            "Enter a Gemini API key" => {
                let candidate = Password::with_theme(&ColorfulTheme::default())
                    .with_prompt("Gemini API key")
                    .allow_empty_password(true)
                    .interact()?;

                println!("{}", Paint::new("Validating key...").dimmed());
                if app_state.submit_credential(&candidate).await {
                    println!("{}", Paint::green("Key saved."));
                    return Ok(true);
                }
            }
            "Keep the current key" => {
                if app_state.close_onboarding() {
                    return Ok(true);
                }
            }
            _ => return Ok(false),
        }
    }
}

async fn pick_topic(app_state: &mut AppState) -> Result<()> {
    if app_state.topics.is_empty() {
        println!("{}", Paint::new("Loading themes...").dimmed());
        app_state.refresh_topics().await;
    }

    let mut items = app_state.topics.clone();
    items.push("Back".to_string());

    let Some(idx) = select("Pick a theme", &items)? else {
        return Ok(());
    };
    if idx >= app_state.topics.len() {
        return Ok(());
    }

    let topic = items[idx].to_string();
    println!("{}", Paint::new("Crafting a prompt...").dimmed());
    app_state.select_topic(&topic).await;

    return Ok(());
}

async fn custom_topic(app_state: &mut AppState) -> Result<()> {
    let text: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Theme")
        .allow_empty(true)
        .interact_text()?;

    if text.trim().is_empty() {
        return Ok(());
    }

    println!("{}", Paint::new("Crafting a prompt...").dimmed());
    app_state.submit_custom_topic(&text).await;

    return Ok(());
}

fn edit_prompt(app_state: &mut AppState) -> Result<()> {
    let text: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Prompt")
        .with_initial_text(app_state.prompt.to_string())
        .allow_empty(true)
        .interact_text()?;

    app_state.set_prompt(&text);
    return Ok(());
}

async fn generate(app_state: &mut AppState) {
    println!(
        "{}",
        Paint::new(format!("Generating {VARIANT_COUNT} wallpapers...")).dimmed()
    );
    app_state.generate().await;

    if !app_state.images.is_empty() {
        println!(
            "{}",
            Paint::green(format!("{} wallpapers are ready.", app_state.images.len()))
        );
    }
}

async fn preview(app_state: &mut AppState) -> Result<()> {
    let mut items = app_state
        .images
        .iter()
        .enumerate()
        .map(|(idx, image)| return describe_image(idx, image))
        .collect::<Vec<String>>();
    items.push("Back".to_string());

    let Some(idx) = select("Preview a wallpaper", &items)? else {
        return Ok(());
    };
    let Some(image_id) = app_state.images.get(idx).map(|image| return image.id.to_string()) else {
        return Ok(());
    };

    if !app_state.open_preview(&image_id) {
        return Ok(());
    }

    while let Some(image) = app_state.preview().cloned() {
        let format = match describe_format(&image) {
            Ok(format) => format,
            Err(err) => {
                app_state.error = Some(format!("The wallpaper could not be read: {err:#}"));
                app_state.close_preview();
                continue;
            }
        };

        println!();
        println!("{} {}", Paint::cyan("Wallpaper:").bold(), image.id);
        println!("{} {}", Paint::cyan("Prompt:").bold(), image.prompt);
        println!("{} {}", Paint::cyan("Format:").bold(), format);
        println!();

        let actions = [
            (PreviewItem::Save, "Save to device"),
            (PreviewItem::Remix, "Remix this wallpaper"),
            (PreviewItem::Back, "Back"),
        ];
        let labels = actions
            .iter()
            .map(|(_, label)| return label.to_string())
            .collect::<Vec<String>>();

        let action = select("Wallpaper", &labels)?.map(|idx| return actions[idx].0);
        match action {
            Some(PreviewItem::Save) => {
                if let Some(file_path) = app_state.save_to_device(&image.id, &output_dir()).await {
                    println!(
                        "{}",
                        Paint::green(format!("Saved to {}", file_path.to_string_lossy()))
                    );
                }
                print_error(app_state);
            }
            Some(PreviewItem::Remix) => {
                app_state.start_remix(&image.id);
                println!("Edit the prompt to describe the variation, then generate.");
            }
            Some(PreviewItem::Back) | None => app_state.close_preview(),
        }
    }

    return Ok(());
}

async fn save_all(app_state: &mut AppState) {
    let saved = app_state.save_all_to_device(&output_dir()).await;
    for file_path in saved {
        println!(
            "{}",
            Paint::green(format!("Saved to {}", file_path.to_string_lossy()))
        );
    }
}

/// Runs the interactive studio until the user quits.
pub async fn start(app_state: &mut AppState) -> Result<()> {
    print_banner();
    app_state.startup().await;

    loop {
        if app_state.show_onboarding {
            if !onboarding(app_state).await? {
                return Ok(());
            }
            continue;
        }

        print_error(app_state);
        print_status(app_state);

        let items = menu_items(app_state);
        let labels = items
            .iter()
            .map(|(_, label)| return label.to_string())
            .collect::<Vec<String>>();

        let Some(idx) = select("What next?", &labels)? else {
            return Ok(());
        };

        match items[idx].0 {
            MenuItem::PickTopic => pick_topic(app_state).await?,
            MenuItem::CustomTopic => custom_topic(app_state).await?,
            MenuItem::RefreshTopics => {
                println!("{}", Paint::new("Loading themes...").dimmed());
                app_state.refresh_topics().await;
            }
            MenuItem::RegeneratePrompt => {
                println!("{}", Paint::new("Crafting a prompt...").dimmed());
                app_state.regenerate_prompt().await;
            }
            MenuItem::EditPrompt => edit_prompt(app_state)?,
            MenuItem::Generate => generate(app_state).await,
            MenuItem::ViewWallpaper => preview(app_state).await?,
            MenuItem::SaveAll => save_all(app_state).await,
            MenuItem::ClearRemix => app_state.clear_remix(),
            MenuItem::ChangeKey => app_state.open_onboarding(),
            MenuItem::ForgetKey => app_state.reset_credential(),
            MenuItem::Quit => return Ok(()),
        }
    }
}
