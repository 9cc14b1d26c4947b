// src/services/image_generator.rs
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use tracing::debug;

use super::genai::{GenerationError, fetch_with_retry};

/// File name the image tool writes inside the working directory it is given.
pub const IMAGE_FILE_NAME: &str = "pollinations-image.jpeg";

/// Fixed rendering parameters for avatar images.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageSettings {
    pub model: String,
    pub width: u32,
    pub height: u32,
    pub seed: u64,
}

impl Default for ImageSettings {
    fn default() -> Self {
        Self {
            model: "flux".to_string(),
            width: 1024,
            height: 1024,
            seed: 42,
        }
    }
}

/// An image backend that renders one image for a prompt and saves it as
/// `IMAGE_FILE_NAME` inside `work_dir`.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, work_dir: &Path) -> Result<(), GenerationError>;
}

#[derive(Clone)]
pub struct PollinationsClient {
    http: Client,
    base_url: Url,
    settings: ImageSettings,
    timeout: Duration,
}

impl PollinationsClient {
    pub fn new(http: Client, base_url: Url, settings: ImageSettings, timeout: Duration) -> Self {
        Self {
            http,
            base_url,
            settings,
            timeout,
        }
    }

    pub(crate) fn image_url(&self, prompt: &str) -> Result<Url, GenerationError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                GenerationError::Malformed(format!("{} cannot be a base URL", self.base_url))
            })?
            .pop_if_empty()
            .push("prompt")
            .push(prompt);
        url.query_pairs_mut()
            .append_pair("model", &self.settings.model)
            .append_pair("width", &self.settings.width.to_string())
            .append_pair("height", &self.settings.height.to_string())
            .append_pair("seed", &self.settings.seed.to_string())
            .append_pair("nologo", "true");
        Ok(url)
    }
}

#[async_trait]
impl ImageGenerator for PollinationsClient {
    async fn generate(&self, prompt: &str, work_dir: &Path) -> Result<(), GenerationError> {
        let url = self.image_url(prompt)?;
        let bytes = fetch_with_retry(self.http.get(url), self.timeout).await?;
        if bytes.is_empty() {
            return Err(GenerationError::Malformed("image service returned no bytes".into()));
        }

        let target = work_dir.join(IMAGE_FILE_NAME);
        tokio::fs::write(&target, &bytes).await?;
        debug!(path = %target.display(), size = bytes.len(), "image saved");
        Ok(())
    }
}
