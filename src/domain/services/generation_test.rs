use std::collections::HashSet;
use std::sync::Arc;

use super::parse_topics;
use super::GenerationClient;
use super::FALLBACK_TOPICS;
use crate::domain::models::Credential;
use crate::domain::models::ImagePayload;
use crate::domain::models::ProviderRef;
use crate::domain::models::WallpaperError;
use crate::infrastructure::providers::stub::StubProvider;

fn armed(stub: StubProvider) -> (Arc<StubProvider>, GenerationClient) {
    let stub = Arc::new(stub);
    let provider: ProviderRef = stub.clone();
    let mut client = GenerationClient::new(provider, "9:16");
    client.arm(Credential::parse("abc123").unwrap());

    return (stub, client);
}

fn unarmed(stub: StubProvider) -> (Arc<StubProvider>, GenerationClient) {
    let stub = Arc::new(stub);
    let provider: ProviderRef = stub.clone();

    return (stub, GenerationClient::new(provider, "9:16"));
}

fn four_images(stub: StubProvider) -> StubProvider {
    return stub
        .with_image("image/png", "b25l")
        .with_image("image/png", "dHdv")
        .with_image("image/png", "dGhyZWU=")
        .with_image("image/png", "Zm91cg==");
}

mod parse {
    use super::*;

    #[test]
    fn it_splits_comma_lists() {
        let res = parse_topics("Neon Rain, Desert Mirage ,Arctic Aurora,, Paper Cranes, Lava Glass");
        assert_eq!(
            res,
            vec![
                "Neon Rain",
                "Desert Mirage",
                "Arctic Aurora",
                "Paper Cranes",
                "Lava Glass"
            ]
        );
    }

    #[test]
    fn it_strips_numbering_and_quotes() {
        let res = parse_topics("1. \"Neon Rain\"\n2) Desert Mirage\n- *1980s Arcade*");
        assert_eq!(res, vec!["Neon Rain", "Desert Mirage", "1980s Arcade"]);
    }

    #[test]
    fn it_keeps_at_most_five() {
        let res = parse_topics("a, b, c, d, e, f, g");
        assert_eq!(res.len(), 5);
        assert_eq!(res[4], "e");
    }
}

mod unarmed {
    use super::*;

    #[tokio::test]
    async fn it_refuses_every_operation() {
        let (stub, client) = unarmed(StubProvider::default().with_text("ok"));

        assert_eq!(
            client.suggest_topics().await,
            Err(WallpaperError::MissingCredential)
        );
        assert_eq!(
            client.craft_prompt("sunset").await,
            Err(WallpaperError::MissingCredential)
        );
        assert_eq!(
            client.render_image("sunset", None).await,
            Err(WallpaperError::MissingCredential)
        );
        assert_eq!(
            client.render_wallpaper_set("sunset", None).await,
            Err(WallpaperError::MissingCredential)
        );

        assert_eq!(stub.text_calls(), 0);
        assert_eq!(stub.image_calls(), 0);
    }

    #[tokio::test]
    async fn it_refuses_after_disarming() {
        let (_stub, mut client) = armed(StubProvider::default());
        client.disarm();

        assert!(!client.is_armed());
        assert_eq!(
            client.suggest_topics().await,
            Err(WallpaperError::MissingCredential)
        );
    }
}

mod suggest_topics {
    use super::*;

    #[tokio::test]
    async fn it_returns_provider_topics() {
        let (stub, client) = armed(StubProvider::default().with_text(
            "Neon Rain, Desert Mirage, Arctic Aurora, Paper Cranes, Lava Glass",
        ));

        let res = client.suggest_topics().await.unwrap();

        assert_eq!(res.len(), 5);
        assert_eq!(res[0], "Neon Rain");
        assert_eq!(stub.text_requests.lock().unwrap()[0].0, "abc123");
    }

    #[tokio::test]
    async fn it_falls_back_when_the_provider_fails() {
        let (_stub, client) = armed(StubProvider::default());

        let res = client.suggest_topics().await.unwrap();

        assert_eq!(res, FALLBACK_TOPICS.to_vec());
        assert_eq!(res.len(), 5);
        assert!(res.iter().all(|topic| return !topic.is_empty()));
    }

    #[tokio::test]
    async fn it_falls_back_even_when_the_key_is_rejected() {
        let (_stub, client) = armed(StubProvider::rejecting());

        let res = client.suggest_topics().await.unwrap();
        assert_eq!(res, FALLBACK_TOPICS.to_vec());
    }

    #[tokio::test]
    async fn it_fills_short_replies_up_to_five() {
        let (_stub, client) = armed(
            StubProvider::default().with_text("Neon Rain, cyberpunk neon city"),
        );

        let res = client.suggest_topics().await.unwrap();

        assert_eq!(
            res,
            vec![
                "Neon Rain",
                "cyberpunk neon city",
                "Ethereal Misty Forest",
                "Minimalist Geometric Shapes",
                "Retro Vaporwave Sunset",
            ]
        );
    }

    #[tokio::test]
    async fn it_falls_back_on_empty_replies() {
        let (_stub, client) = armed(StubProvider::default().with_text(" , ,\n"));

        let res = client.suggest_topics().await.unwrap();
        assert_eq!(res, FALLBACK_TOPICS.to_vec());
    }
}

mod craft_prompt {
    use super::*;

    #[tokio::test]
    async fn it_returns_the_crafted_prompt() {
        let (stub, client) = armed(
            StubProvider::default()
                .with_text("\"A glowing orange sun melting into a calm violet ocean.\""),
        );

        let res = client.craft_prompt("sunset").await.unwrap();

        assert_eq!(res, "A glowing orange sun melting into a calm violet ocean.");
        assert!(stub.text_requests.lock().unwrap()[0].1.contains("\"sunset\""));
    }

    #[tokio::test]
    async fn it_falls_back_to_the_theme() {
        let (_stub, client) = armed(StubProvider::default().with_text_error("Gemini request failed with status 500: Internal error"));

        let res = client.craft_prompt("sunset").await;
        assert_eq!(res, Ok("sunset".to_string()));
    }

    #[tokio::test]
    async fn it_propagates_credential_failures() {
        let (_stub, client) = armed(StubProvider::rejecting());

        let res = client.craft_prompt("sunset").await;
        assert_eq!(res, Err(WallpaperError::MissingCredential));
    }
}

mod render_image {
    use super::*;

    #[tokio::test]
    async fn it_frames_fresh_compositions() {
        let (stub, client) = armed(StubProvider::default().with_image("image/png", "aGVsbG8="));

        let res = client.render_image("sunset", None).await.unwrap();

        assert_eq!(res, ImagePayload::new("image/png", "aGVsbG8="));
        let requests = stub.image_requests.lock().unwrap();
        assert_eq!(requests[0].aspect_ratio, "9:16");
        assert_eq!(requests[0].source, None);
        assert!(requests[0].instruction.contains("portrait"));
        assert!(requests[0].instruction.ends_with("sunset"));
    }

    #[tokio::test]
    async fn it_frames_remixes() {
        let (stub, client) = armed(StubProvider::default().with_image("image/png", "cmVtaXg="));
        let source = ImagePayload::new("image/png", "c291cmNl");

        client.render_image("make it snowy", Some(&source)).await.unwrap();

        let requests = stub.image_requests.lock().unwrap();
        assert_eq!(requests[0].source, Some(source));
        assert!(requests[0].instruction.starts_with("Remix the provided image"));
    }

    #[tokio::test]
    async fn it_fails_without_image_data() {
        let (_stub, client) = armed(StubProvider::default().with_no_image());

        let res = client.render_image("sunset", None).await;
        assert_eq!(res, Err(WallpaperError::NoImageProduced));
    }
}

mod render_wallpaper_set {
    use super::*;

    #[tokio::test]
    async fn it_renders_four_distinct_variants() {
        let (stub, client) = armed(four_images(StubProvider::default()));

        let images = client.render_wallpaper_set("sunset", None).await.unwrap();

        assert_eq!(images.len(), 4);
        assert!(images.iter().all(|image| return image.prompt == "sunset"));

        let ids = images
            .iter()
            .map(|image| return image.id.to_string())
            .collect::<HashSet<String>>();
        assert_eq!(ids.len(), 4);

        let urls = images
            .iter()
            .map(|image| return image.url.to_string())
            .collect::<HashSet<String>>();
        assert_eq!(urls.len(), 4);

        assert_eq!(stub.image_calls(), 4);
    }

    #[tokio::test]
    async fn it_fails_the_whole_set_when_one_variant_fails() {
        let (stub, client) = armed(
            StubProvider::default()
                .with_image("image/png", "b25l")
                .with_image("image/png", "dHdv")
                .with_image_error("Gemini request failed with status 500: Internal error")
                .with_image("image/png", "Zm91cg=="),
        );

        let res = client.render_wallpaper_set("sunset", None).await;

        assert_eq!(
            res,
            Err(WallpaperError::ProviderFailure(
                "Gemini request failed with status 500: Internal error".to_string()
            ))
        );
        assert_eq!(stub.image_calls(), 4);
    }

    #[tokio::test]
    async fn it_reports_missing_images_as_provider_failures() {
        let (_stub, client) = armed(
            StubProvider::default()
                .with_image("image/png", "b25l")
                .with_no_image()
                .with_image("image/png", "dGhyZWU=")
                .with_image("image/png", "Zm91cg=="),
        );

        let res = client.render_wallpaper_set("sunset", None).await;
        assert_eq!(
            res,
            Err(WallpaperError::ProviderFailure(
                WallpaperError::NoImageProduced.to_string()
            ))
        );
    }

    #[tokio::test]
    async fn it_distinguishes_credential_failures() {
        let (_stub, client) = armed(
            StubProvider::default()
                .with_image_error("Gemini request failed with status 503: overloaded")
                .with_image_error("Gemini request failed with status 400: API key expired. Please renew the API key."),
        );

        let res = client.render_wallpaper_set("sunset", None).await;
        assert_eq!(res, Err(WallpaperError::MissingCredential));
    }

    #[tokio::test]
    async fn it_passes_the_remix_source_to_every_variant() {
        let (stub, client) = armed(four_images(StubProvider::default()));
        let source = ImagePayload::new("image/jpeg", "c291cmNl");

        let images = client
            .render_wallpaper_set("make it snowy", Some(&source))
            .await
            .unwrap();

        assert_eq!(images.len(), 4);
        let requests = stub.image_requests.lock().unwrap();
        assert!(requests
            .iter()
            .all(|req| return req.source == Some(source.clone()) && req.credential == "abc123"));
    }
}
