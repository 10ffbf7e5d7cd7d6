use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use chrono_tz::Tz;
use tracing::{error, info};

use crate::error::InterpretError;
use crate::models::interpretation::Interpretation;
use crate::service::model_service::ModelClient;
use crate::service::prompt;

#[async_trait]
pub trait Interpreter: Send + Sync {
    async fn interpret(&self, note: &str) -> Result<Interpretation, InterpretError>;

    /// Re-reads `original` with the user's correction taking precedence.
    async fn reinterpret(
        &self,
        original: &str,
        correction: &str,
    ) -> Result<Interpretation, InterpretError>;
}

/// Removes markdown code-fence markers the model sometimes wraps JSON in.
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();
    let without_open = match trimmed.strip_prefix("```") {
        // Drop the language tag, e.g. "json".
        Some(rest) => rest.trim_start_matches(|c: char| c.is_ascii_alphabetic()),
        None => trimmed,
    };
    let without_close = without_open
        .trim_end()
        .strip_suffix("```")
        .unwrap_or(without_open);
    without_close.trim().to_string()
}

pub fn decode_reply(text: &str) -> Result<Interpretation, InterpretError> {
    let cleaned = strip_code_fences(text);
    let value: serde_json::Value = serde_json::from_str(&cleaned)?;
    Ok(Interpretation::from_value(value))
}

pub struct NoteInterpreter {
    model: Arc<dyn ModelClient>,
    timezone: Tz,
}

impl NoteInterpreter {
    pub fn new(model: Arc<dyn ModelClient>, timezone: Tz) -> Self {
        Self { model, timezone }
    }

    async fn run(&self, prompt: String) -> Result<Interpretation, InterpretError> {
        let reply = self.model.complete(&prompt).await.inspect_err(|err| {
            error!(error = %err, "model call failed");
        })?;
        let interpretation = decode_reply(&reply).inspect_err(|err| {
            error!(error = %err, reply = %reply, "model reply could not be decoded");
        })?;
        info!(variant = interpretation.variant_name(), "note interpreted");
        Ok(interpretation)
    }
}

#[async_trait]
impl Interpreter for NoteInterpreter {
    async fn interpret(&self, note: &str) -> Result<Interpretation, InterpretError> {
        let today = Utc::now().with_timezone(&self.timezone);
        self.run(prompt::build_prompt(note, today)).await
    }

    async fn reinterpret(
        &self,
        original: &str,
        correction: &str,
    ) -> Result<Interpretation, InterpretError> {
        let today = Utc::now().with_timezone(&self.timezone);
        self.run(prompt::build_correction_prompt(original, correction, today))
            .await
    }
}
