// src/config.rs
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, anyhow};
use reqwest::Url;

use crate::services::{game_master::ModelSelection, image_generator::ImageSettings};

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    pub models: ModelSelection,
    pub image_base_url: Url,
    pub image: ImageSettings,
    pub style_path: PathBuf,
    pub style_max_pages: usize,
    pub style_max_chars: usize,
    pub pdfium_lib_path: Option<PathBuf>,
    pub prompts_dir: PathBuf,
    pub allowed_origins: Vec<String>,
    pub upstream_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| anyhow!("{key} environment variable must be set"))
        };
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let defaults = ImageSettings::default();
        let models = ModelSelection::default();

        let image_base_url = or("IMAGE_BASE_URL", "https://image.pollinations.ai");
        let image_base_url = Url::parse(&image_base_url)
            .with_context(|| format!("IMAGE_BASE_URL is not a valid URL: {image_base_url}"))?;

        Ok(Self {
            host: or("HOST", "0.0.0.0"),
            port: parse_or(get("PORT"), "PORT", 3000)?,
            gemini_api_key: required("GEMINI_API_KEY")?,
            gemini_base_url: or("GEMINI_BASE_URL", "https://generativelanguage.googleapis.com"),
            models: ModelSelection {
                scenario: or("SCENARIO_MODEL", &models.scenario),
                dialogue: or("DIALOGUE_MODEL", &models.dialogue),
            },
            image_base_url,
            image: ImageSettings {
                model: or("IMAGE_MODEL", &defaults.model),
                width: parse_or(get("IMAGE_WIDTH"), "IMAGE_WIDTH", defaults.width)?,
                height: parse_or(get("IMAGE_HEIGHT"), "IMAGE_HEIGHT", defaults.height)?,
                seed: parse_or(get("IMAGE_SEED"), "IMAGE_SEED", defaults.seed)?,
            },
            style_path: PathBuf::from(required("STYLE_PATH")?),
            style_max_pages: parse_or(get("STYLE_MAX_PAGES"), "STYLE_MAX_PAGES", 50)?,
            style_max_chars: parse_or(get("STYLE_MAX_CHARS"), "STYLE_MAX_CHARS", 200_000)?,
            pdfium_lib_path: get("PDFIUM_LIB_PATH").map(PathBuf::from),
            prompts_dir: PathBuf::from(or("PROMPTS_DIR", "prompts")),
            allowed_origins: get("ALLOWED_ORIGINS")
                .map(|raw| split_origins(&raw))
                .unwrap_or_default(),
            upstream_timeout: Duration::from_secs(parse_or(
                get("UPSTREAM_TIMEOUT_SECS"),
                "UPSTREAM_TIMEOUT_SECS",
                60,
            )?),
        })
    }
}

fn parse_or<T>(raw: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match raw {
        Some(value) => value
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value: {value}")),
        None => Ok(default),
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/').to_string())
        .filter(|o| !o.is_empty())
        .collect()
}
