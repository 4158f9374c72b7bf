#[cfg(test)]
#[path = "image_test.rs"]
mod tests;

use std::path;

use anyhow::bail;
use anyhow::Result;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::DateTime;
use chrono::Local;
use tokio::fs;
use uuid::Uuid;

/// Inline image data as exchanged with the provider: a MIME type plus base64
/// encoded bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: String,
}

impl ImagePayload {
    pub fn new(mime_type: &str, data: &str) -> ImagePayload {
        return ImagePayload {
            mime_type: mime_type.to_string(),
            data: data.to_string(),
        };
    }

    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> ImagePayload {
        return ImagePayload::new(mime_type, &STANDARD.encode(bytes));
    }

    /// Reads an image from disk, guessing the MIME type from its extension.
    pub async fn from_file(file_path: &path::Path) -> Result<ImagePayload> {
        let extension = file_path
            .extension()
            .map(|ext| return ext.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let mime_type = match extension.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "webp" => "image/webp",
            _ => bail!(format!(
                "Unsupported image type for {}, use a png, jpeg or webp file",
                file_path.to_string_lossy()
            )),
        };

        let bytes = fs::read(file_path).await?;
        return Ok(ImagePayload::from_bytes(mime_type, &bytes));
    }

    pub fn from_data_url(url: &str) -> Result<ImagePayload> {
        let Some(rest) = url.strip_prefix("data:") else {
            bail!("Image URL is not a data URL");
        };
        let Some((mime_type, data)) = rest.split_once(";base64,") else {
            bail!("Image data URL is not base64 encoded");
        };

        return Ok(ImagePayload::new(mime_type, data));
    }

    pub fn to_data_url(&self) -> String {
        return format!("data:{};base64,{}", self.mime_type, self.data);
    }

    pub fn bytes(&self) -> Result<Vec<u8>> {
        return Ok(STANDARD.decode(&self.data)?);
    }

    pub fn extension(&self) -> &'static str {
        match self.mime_type.as_str() {
            "image/jpeg" | "image/jpg" => return "jpg",
            "image/webp" => return "webp",
            _ => return "png",
        }
    }
}

/// One wallpaper produced by a successful generation. Immutable once created.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedImage {
    pub id: String,
    pub url: String,
    pub prompt: String,
    pub created_at: DateTime<Local>,
}

impl GeneratedImage {
    pub fn new(payload: &ImagePayload, prompt: &str) -> GeneratedImage {
        return GeneratedImage {
            id: GeneratedImage::create_id(),
            url: payload.to_data_url(),
            prompt: prompt.to_string(),
            created_at: Local::now(),
        };
    }

    pub fn create_id() -> String {
        return Uuid::new_v4()
            .to_string()
            .split('-')
            .enumerate()
            .filter_map(|(idx, str)| {
                if idx > 1 {
                    return None;
                }
                return Some(str);
            })
            .collect::<Vec<&str>>()
            .join("-");
    }

    pub fn payload(&self) -> Result<ImagePayload> {
        return ImagePayload::from_data_url(&self.url);
    }

    pub fn file_name(&self) -> Result<String> {
        let payload = self.payload()?;
        return Ok(format!("wallcraft-{}.{}", self.id, payload.extension()));
    }

    /// Writes the decoded image into `dir`, creating it when missing.
    pub async fn save_to(&self, dir: &path::Path) -> Result<path::PathBuf> {
        let bytes = self.payload()?.bytes()?;
        if !dir.exists() {
            fs::create_dir_all(dir).await?;
        }

        let file_path = dir.join(self.file_name()?);
        fs::write(&file_path, bytes).await?;

        tracing::debug!(id = self.id, path = ?file_path, "saved wallpaper");
        return Ok(file_path);
    }
}
