// src/services/mod.rs
pub mod avatar;
pub mod clock;
pub mod clues;
pub mod game_master;
pub mod genai;
pub mod image_generator;
pub mod prompts;
