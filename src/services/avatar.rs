// src/services/avatar.rs
use std::fmt::Display;
use std::path::Path;
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use tracing::{info, instrument, warn};

use super::image_generator::{IMAGE_FILE_NAME, ImageGenerator};
use crate::error::AppError;

pub fn avatar_prompt(description: &str) -> String {
    format!("a face in board-game-noir mixed with a soft-animation art style: {description}")
}

fn image_failure(cause: impl Display) -> AppError {
    AppError::Generation(format!("could not generate the image: {cause}"))
}

/// Renders profile pictures. Every call works in its own temporary directory,
/// removed when the call returns.
#[derive(Clone)]
pub struct AvatarStudio {
    images: Arc<dyn ImageGenerator>,
}

impl AvatarStudio {
    pub fn new(images: Arc<dyn ImageGenerator>) -> Self {
        Self { images }
    }

    /// Returns the generated face as a `data:image/jpeg;base64,` URI.
    #[instrument(skip(self, description))]
    pub async fn generate(&self, description: &str) -> Result<String, AppError> {
        let work_dir = tempfile::Builder::new()
            .prefix("pfp_")
            .tempdir()
            .map_err(image_failure)?;

        let result = self.render_into(&avatar_prompt(description), work_dir.path()).await;

        let path = work_dir.path().to_path_buf();
        if let Err(e) = work_dir.close() {
            warn!(path = %path.display(), error = %e, "failed to remove avatar work dir");
        }
        result
    }

    async fn render_into(&self, prompt: &str, work_dir: &Path) -> Result<String, AppError> {
        self.images
            .generate(prompt, work_dir)
            .await
            .map_err(image_failure)?;

        let output = work_dir.join(IMAGE_FILE_NAME);
        if !tokio::fs::try_exists(&output).await.unwrap_or(false) {
            return Err(AppError::Generation(
                "the image was not generated correctly".to_string(),
            ));
        }
        let bytes = tokio::fs::read(&output).await.map_err(image_failure)?;

        info!(size = bytes.len(), "avatar generated");
        Ok(format!("data:image/jpeg;base64,{}", BASE64.encode(bytes)))
    }
}
