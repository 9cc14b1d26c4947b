// src/message.rs
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A suspect as produced by the scenario generator and echoed back by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suspect {
    pub name: String,
    pub personality: String,
    #[serde(alias = "descripcion")]
    pub description: String,
    #[serde(alias = "coartada")]
    pub alibi: String,
    #[serde(alias = "detalles_adicionales")]
    pub additional_details: String,
    pub culpable: bool,
}

/// Case facts (weapon, location, time, culprit, ...) keyed by caller-chosen names.
pub type MurderDetails = IndexMap<String, String>;

#[derive(Debug, Serialize, Deserialize)]
pub struct GameResponse {
    pub data: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AskSuspectRequest {
    pub question: String,
    pub start_time: String,
    pub current_time: String,
    #[serde(default)]
    pub history: Option<Vec<String>>,
    #[serde(default)]
    pub suspect_index: i64,
    pub suspects: Vec<Suspect>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AskSuspectResponse {
    pub answer: String,
}

fn default_detectives() -> i64 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct NarratorRequest {
    pub question: String,
    pub start_time: String,
    pub current_time: String,
    #[serde(default)]
    pub history: Option<Vec<String>>,
    pub attempts_remaining: i64,
    #[serde(default = "default_detectives")]
    pub detectives_count: i64,
    pub scenario: String,
    pub suspects: Vec<Suspect>,
    pub murder_details: MurderDetails,
    #[serde(default)]
    pub humor_character: Option<String>,
    #[serde(default)]
    pub intro_narrator: Option<String>,
}

/// Structured narrator reply. The shape is produced by the model and only
/// validated here, never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarratorResponse {
    pub answer: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub feedback: Option<IndexMap<String, bool>>,
    #[serde(default)]
    pub warning: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AvatarRequest {
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AvatarResponse {
    pub image: String,
}
