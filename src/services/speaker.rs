use crate::error::{AppError, Result};
use crate::services::output_slot::OutputSlot;
use std::sync::Arc;
use tracing::info;

pub struct SpeechController {
    slot: Arc<OutputSlot>,
}

impl SpeechController {
    pub fn new(slot: Arc<OutputSlot>) -> Self {
        Self { slot }
    }

    /// Speak `text` over the shared output, returning once it has been heard.
    pub async fn speak(&self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Err(AppError::InvalidInput("No text provided".to_string()));
        }

        let _guard = self.slot.acquire().await;
        info!("Speaking {} chars", text.len());
        self.slot.speech().say(text).await?;

        Ok(text.to_string())
    }
}
