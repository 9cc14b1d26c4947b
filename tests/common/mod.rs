//! Shared fakes and helpers for the HTTP integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::NaiveDate;
use mystery_backend::routes::create_router;
use mystery_backend::services::{
    avatar::AvatarStudio,
    clock::FixedClock,
    game_master::{GameMaster, ModelSelection},
    genai::{GenerationError, TextGenerator},
    image_generator::{IMAGE_FILE_NAME, ImageGenerator},
    prompts::PromptTemplates,
};
use mystery_backend::state::AppState;
use serde_json::Value;
use tower::util::ServiceExt;

/// Text backend that plays back queued replies and records every prompt.
#[derive(Default)]
pub struct ScriptedText {
    replies: Mutex<VecDeque<String>>,
    pub prompts: Mutex<Vec<Vec<String>>>,
}

impl ScriptedText {
    pub fn with_replies(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for ScriptedText {
    async fn generate(&self, _model: &str, contents: &[String]) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(contents.to_vec());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| GenerationError::Status {
                status: 503,
                body: "no scripted reply left".into(),
            })
    }
}

/// Image backend that writes `description`-derived bytes after a short
/// delay, so concurrent calls overlap.
#[derive(Default)]
pub struct SlowEchoImages {
    pub work_dirs: Mutex<Vec<PathBuf>>,
}

#[async_trait]
impl ImageGenerator for SlowEchoImages {
    async fn generate(&self, prompt: &str, work_dir: &Path) -> Result<(), GenerationError> {
        self.work_dirs.lock().unwrap().push(work_dir.to_path_buf());
        let target = work_dir.join(IMAGE_FILE_NAME);
        tokio::fs::write(&target, prompt).await?;
        tokio::time::sleep(Duration::from_millis(30)).await;
        Ok(())
    }
}

pub fn test_templates() -> PromptTemplates {
    let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("prompts");
    PromptTemplates::load(&dir).unwrap()
}

pub fn build_test_app(text: Arc<ScriptedText>, images: Arc<SlowEchoImages>) -> Router {
    let clock = FixedClock(
        NaiveDate::from_ymd_opt(2026, 1, 15)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap(),
    );
    let game_master = GameMaster::new(
        text,
        Arc::new(test_templates()),
        Arc::from("A rainy night in a country manor."),
        Arc::new(clock),
        ModelSelection::default(),
    );
    let state = Arc::new(AppState::new(game_master, AvatarStudio::new(images)));
    create_router().with_state(state)
}

pub fn suspects() -> Value {
    serde_json::json!([
        {
            "name": "Ana",
            "personality": "sharp and impatient",
            "description": "tall, silver brooch",
            "alibi": "in the library all evening",
            "additional_details": "owed the victim money",
            "culpable": true
        },
        {
            "name": "Bob",
            "personality": "gentle gardener who mumbles",
            "description": "muddy boots",
            "alibi": "repotting orchids in the greenhouse",
            "additional_details": "saw a light in the study",
            "culpable": false
        }
    ])
}

pub async fn post_json(app: Router, uri: &str, body: &Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
    (status, json)
}
