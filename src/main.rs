use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use mystery_backend::{
    config::Config,
    routes,
    services::{
        avatar::AvatarStudio,
        clock::SystemClock,
        game_master::GameMaster,
        genai::GeminiClient,
        image_generator::PollinationsClient,
        prompts::{PromptTemplates, StyleSource, load_style_text},
    },
    state::AppState,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let style = load_style_text(&StyleSource {
        path: &config.style_path,
        max_pages: config.style_max_pages,
        max_chars: config.style_max_chars,
        pdfium_dir: config.pdfium_lib_path.as_deref(),
    })?;
    let prompts = PromptTemplates::load(&config.prompts_dir)?;
    tracing::info!(style_chars = style.chars().count(), "style reference loaded");

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .build()
        .context("failed to build HTTP client")?;

    let text = GeminiClient::new(
        http.clone(),
        config.gemini_base_url.clone(),
        config.gemini_api_key.clone(),
        config.upstream_timeout,
    );
    let images = PollinationsClient::new(
        http,
        config.image_base_url.clone(),
        config.image.clone(),
        config.upstream_timeout,
    );

    let game_master = GameMaster::new(
        Arc::new(text),
        Arc::new(prompts),
        Arc::from(style),
        Arc::new(SystemClock),
        config.models.clone(),
    );
    let state = Arc::new(AppState::new(game_master, AvatarStudio::new(Arc::new(images))));

    let app = routes::create_router()
        .with_state(state)
        .layer(routes::cors_layer(&config.allowed_origins)?);

    let listener = tokio::net::TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("failed to bind {}:{}", config.host, config.port))?;

    tracing::info!("murder-mystery backend listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
