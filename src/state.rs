// src/state.rs
use std::sync::Arc;

use crate::services::{avatar::AvatarStudio, game_master::GameMaster};

pub type SharedState = Arc<AppState>;

/// Read-only service handles injected into every handler.
pub struct AppState {
    pub game_master: GameMaster,
    pub avatars: AvatarStudio,
}

impl AppState {
    pub fn new(game_master: GameMaster, avatars: AvatarStudio) -> Self {
        Self {
            game_master,
            avatars,
        }
    }
}
