// src/services/game_master.rs
use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{info, instrument};

use super::{
    clock::Clock,
    clues::{DisclosureTier, attempts_warning, elapsed_minutes, strip_code_fence},
    genai::TextGenerator,
    prompts::{PromptTemplates, render},
};
use crate::{
    error::AppError,
    message::{AskSuspectRequest, NarratorRequest, NarratorResponse, Suspect},
};

const NO_HISTORY: &str = "No previous history.";
const SILENT_SUSPECT: &str = "I have nothing to say.";

/// Which model serves which kind of call.
#[derive(Debug, Clone)]
pub struct ModelSelection {
    pub scenario: String,
    pub dialogue: String,
}

impl Default for ModelSelection {
    fn default() -> Self {
        Self {
            scenario: "gemini-1.5-flash".to_string(),
            dialogue: "gemini-2.0-flash".to_string(),
        }
    }
}

/// Builds prompts for the scenario, suspect and narrator calls and validates
/// what the model sends back.
#[derive(Clone)]
pub struct GameMaster {
    text: Arc<dyn TextGenerator>,
    prompts: Arc<PromptTemplates>,
    style: Arc<str>,
    clock: Arc<dyn Clock>,
    models: ModelSelection,
}

impl GameMaster {
    pub fn new(
        text: Arc<dyn TextGenerator>,
        prompts: Arc<PromptTemplates>,
        style: Arc<str>,
        clock: Arc<dyn Clock>,
        models: ModelSelection,
    ) -> Self {
        Self {
            text,
            prompts,
            style,
            clock,
            models,
        }
    }

    /// Generates a fresh scenario object and stamps it with `start_time`.
    #[instrument(skip(self))]
    pub async fn start_game(&self) -> Result<Map<String, Value>, AppError> {
        let contents = [self.style.to_string(), self.prompts.start_game.clone()];
        let raw = self.text.generate(&self.models.scenario, &contents).await?;

        let clean = strip_code_fence(&raw);
        if clean.is_empty() {
            return Err(AppError::Generation(
                "failed to generate the game JSON: empty response".to_string(),
            ));
        }
        let parsed: Value = serde_json::from_str(&clean)
            .map_err(|e| AppError::Generation(format!("failed to parse game JSON: {e}")))?;
        let Value::Object(mut game) = parsed else {
            return Err(AppError::Generation(
                "failed to parse game JSON: expected an object".to_string(),
            ));
        };

        let start_time = self.clock.now().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
        info!(%start_time, fields = game.len(), "scenario generated");
        game.insert("start_time".to_string(), Value::String(start_time));
        Ok(game)
    }

    /// Answers `req.question` in the voice of the selected suspect.
    #[instrument(skip(self, req), fields(suspect_index = req.suspect_index))]
    pub async fn interrogate(&self, req: &AskSuspectRequest) -> Result<String, AppError> {
        let elapsed = elapsed_minutes(&req.start_time, &req.current_time)?;
        let tier = DisclosureTier::from_elapsed_minutes(elapsed);
        let suspect = select_suspect(&req.suspects, req.suspect_index)?;

        let history = req.history.as_deref();
        let prompt = self.suspect_prompt(suspect, tier, history, &req.question)?;
        let reply = self.text.generate(&self.models.dialogue, &[prompt]).await?;

        info!(elapsed, %tier, suspect = %suspect.name, "suspect answered");
        let answer = reply.trim();
        Ok(if answer.is_empty() {
            SILENT_SUSPECT.to_string()
        } else {
            answer.to_string()
        })
    }

    pub(crate) fn suspect_prompt(
        &self,
        suspect: &Suspect,
        tier: DisclosureTier,
        history: Option<&[String]>,
        question: &str,
    ) -> Result<String, AppError> {
        let culpable = if suspect.culpable { "True" } else { "False" };
        let history = join_history(history);
        Ok(render(
            &self.prompts.ask,
            &[
                ("name", suspect.name.as_str()),
                ("personality", suspect.personality.as_str()),
                ("description", suspect.description.as_str()),
                ("alibi", suspect.alibi.as_str()),
                ("culpable", culpable),
                ("additional_details", suspect.additional_details.as_str()),
                ("tier", tier.as_str()),
                ("history", history.as_str()),
                ("question", question),
            ],
        )?)
    }

    /// Answers a meta-question or judges a guess as the narrator.
    #[instrument(skip(self, req), fields(attempts_remaining = req.attempts_remaining))]
    pub async fn narrate(&self, req: &NarratorRequest) -> Result<NarratorResponse, AppError> {
        elapsed_minutes(&req.start_time, &req.current_time)?;
        let warning = attempts_warning(req.attempts_remaining);

        let prompt = self.narrator_prompt(req, warning.as_deref())?;
        let raw = self.text.generate(&self.models.dialogue, &[prompt]).await?;

        let clean = strip_code_fence(&raw);
        let mut response: NarratorResponse = serde_json::from_str(&clean).map_err(|e| {
            AppError::Generation(format!("invalid model response: {e}\nContent:\n{raw}"))
        })?;
        if response.warning.is_none() {
            response.warning = warning;
        }

        info!(kind = %response.kind, warned = response.warning.is_some(), "narrator answered");
        Ok(response)
    }

    pub(crate) fn narrator_prompt(
        &self,
        req: &NarratorRequest,
        warning: Option<&str>,
    ) -> Result<String, AppError> {
        let suspects = req
            .suspects
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let keys = req
            .murder_details
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        let detectives = req.detectives_count.to_string();
        let attempts = req.attempts_remaining.to_string();
        let humor = req
            .humor_character
            .as_deref()
            .map(|h| format!("- Humor character: {h}"))
            .unwrap_or_default();
        let intro = req
            .intro_narrator
            .as_deref()
            .map(|i| format!("- Narrator intro: {i}"))
            .unwrap_or_default();
        let history = join_history(req.history.as_deref());
        let murder_details = serde_json::to_string(&req.murder_details)
            .map_err(|e| AppError::Internal(format!("failed to serialize murder details: {e}")))?;

        Ok(render(
            &self.prompts.narrator,
            &[
                ("scenario", req.scenario.as_str()),
                ("suspects", suspects.as_str()),
                ("items", keys.as_str()),
                ("detectives", detectives.as_str()),
                ("attempts", attempts.as_str()),
                ("humor", humor.as_str()),
                ("intro", intro.as_str()),
                ("history", history.as_str()),
                ("question", req.question.as_str()),
                ("keys", keys.as_str()),
                ("murder_details", murder_details.as_str()),
                ("warning", warning.unwrap_or_default()),
            ],
        )?)
    }
}

fn join_history(history: Option<&[String]>) -> String {
    match history {
        Some(lines) if !lines.is_empty() => lines.join("\n"),
        _ => NO_HISTORY.to_string(),
    }
}

/// Picks the suspect at `index`, rejecting anything outside `[0, len)`.
pub fn select_suspect(suspects: &[Suspect], index: i64) -> Result<&Suspect, AppError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| suspects.get(i))
        .ok_or_else(|| AppError::BadRequest(format!("There are only {} suspects.", suspects.len())))
}
