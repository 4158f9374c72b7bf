use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::Credential;
use crate::domain::models::ImagePayload;
use crate::domain::models::Provider;
use crate::domain::models::ProviderName;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageRequest {
    pub credential: String,
    pub instruction: String,
    pub source: Option<ImagePayload>,
    pub aspect_ratio: String,
}

/// Scripted provider for domain tests. Replies are consumed in order; once a
/// queue runs dry every call fails with `exhausted_error`.
pub struct StubProvider {
    text_replies: Mutex<VecDeque<Result<String, String>>>,
    image_replies: Mutex<VecDeque<Result<Option<ImagePayload>, String>>>,
    exhausted_error: String,
    pub text_requests: Mutex<Vec<(String, String)>>,
    pub image_requests: Mutex<Vec<ImageRequest>>,
}

impl Default for StubProvider {
    fn default() -> StubProvider {
        return StubProvider {
            text_replies: Mutex::new(VecDeque::new()),
            image_replies: Mutex::new(VecDeque::new()),
            exhausted_error: "Gemini request failed with status 503: The model is overloaded."
                .to_string(),
            text_requests: Mutex::new(vec![]),
            image_requests: Mutex::new(vec![]),
        };
    }
}

impl StubProvider {
    /// Every call is refused the way Gemini refuses a bad key.
    pub fn rejecting() -> StubProvider {
        return StubProvider {
            exhausted_error:
                "Gemini request failed with status 400: API key not valid. Please pass a valid API key."
                    .to_string(),
            ..StubProvider::default()
        };
    }

    pub fn with_text(self, reply: &str) -> StubProvider {
        self.text_replies
            .lock()
            .unwrap()
            .push_back(Ok(reply.to_string()));
        return self;
    }

    pub fn with_text_error(self, err: &str) -> StubProvider {
        self.text_replies
            .lock()
            .unwrap()
            .push_back(Err(err.to_string()));
        return self;
    }

    pub fn with_image(self, mime_type: &str, data: &str) -> StubProvider {
        self.image_replies
            .lock()
            .unwrap()
            .push_back(Ok(Some(ImagePayload::new(mime_type, data))));
        return self;
    }

    pub fn with_no_image(self) -> StubProvider {
        self.image_replies.lock().unwrap().push_back(Ok(None));
        return self;
    }

    pub fn with_image_error(self, err: &str) -> StubProvider {
        self.image_replies
            .lock()
            .unwrap()
            .push_back(Err(err.to_string()));
        return self;
    }

    pub fn text_calls(&self) -> usize {
        return self.text_requests.lock().unwrap().len();
    }

    pub fn image_calls(&self) -> usize {
        return self.image_requests.lock().unwrap().len();
    }
}

#[async_trait]
impl Provider for StubProvider {
    fn name(&self) -> ProviderName {
        return ProviderName::Gemini;
    }

    #[allow(clippy::implicit_return)]
    async fn generate_text(&self, credential: &Credential, prompt: &str) -> Result<String> {
        self.text_requests
            .lock()
            .unwrap()
            .push((credential.expose().to_string(), prompt.to_string()));

        let reply = self.text_replies.lock().unwrap().pop_front();
        match reply {
            Some(Ok(text)) => return Ok(text),
            Some(Err(err)) => bail!(err),
            None => bail!(self.exhausted_error.to_string()),
        }
    }

    #[allow(clippy::implicit_return)]
    async fn generate_image(
        &self,
        credential: &Credential,
        instruction: &str,
        source: Option<&ImagePayload>,
        aspect_ratio: &str,
    ) -> Result<Option<ImagePayload>> {
        self.image_requests.lock().unwrap().push(ImageRequest {
            credential: credential.expose().to_string(),
            instruction: instruction.to_string(),
            source: source.cloned(),
            aspect_ratio: aspect_ratio.to_string(),
        });

        let reply = self.image_replies.lock().unwrap().pop_front();
        match reply {
            Some(Ok(image)) => return Ok(image),
            Some(Err(err)) => bail!(err),
            None => bail!(self.exhausted_error.to_string()),
        }
    }
}
