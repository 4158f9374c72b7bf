use anyhow::anyhow;

use super::mentions_credential;
use super::WallpaperError;

#[test]
fn it_detects_api_key_errors() {
    let err = anyhow!("Gemini request failed with status 400: API key not valid. Please pass a valid API key.");
    assert!(mentions_credential(&err));
}

#[test]
fn it_detects_permission_errors_in_context() {
    let err = anyhow!("PERMISSION_DENIED").context("Gemini request failed");
    assert!(mentions_credential(&err));
}

#[test]
fn it_ignores_generic_errors() {
    let err = anyhow!("Gemini request failed with status 503: The model is overloaded.");
    assert!(!mentions_credential(&err));
}

#[test]
fn it_shows_no_image_as_provider_failure() {
    insta::assert_snapshot!(WallpaperError::NoImageProduced.banner(), @"Gemini failed to generate wallpapers: Gemini responded without any image data.");
}

#[test]
fn it_shows_provider_failures_verbatim() {
    let err = WallpaperError::ProviderFailure("quota exceeded".to_string());
    insta::assert_snapshot!(err.banner(), @"Gemini failed to generate wallpapers: quota exceeded");
}
