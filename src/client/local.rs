// Local text model client.
//
// Talks to a small model behind an OpenAI-compatible endpoint on the same
// box. Cheap and fast, but small models are verbose and drift from
// instructions, so the prompt is the token-compressed variant with an
// explicit JSON-only reminder bolted on, and the response goes through the
// fence-stripping parser.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::parse::{self, truncate_chars};
use super::wire::{self, ChatMessage};
use super::{AnalysisResult, AnalysisSource, ContentType, TextAnalyzer};
use crate::prompt::{self, CompressionStrategy};
use crate::registry::{ModelConfig, ModelRegistry, ModelRole};

/// Appended after the system prompt. Small local models ignore schema
/// instructions buried mid-prompt, so this goes last where they weight it.
const JSON_ONLY_INSTRUCTION: &str =
    "Respond with a single JSON object only. No Markdown, no code fences, no commentary.";

pub struct LocalTextClient {
    client: reqwest::Client,
    registry: Arc<ModelRegistry>,
}

impl LocalTextClient {
    pub fn new(registry: Arc<ModelRegistry>) -> Self {
        Self {
            client: reqwest::Client::new(),
            registry,
        }
    }

    async fn try_predict(
        &self,
        config: &ModelConfig,
        content: &str,
        content_type: ContentType,
    ) -> anyhow::Result<AnalysisResult> {
        // Compressed prompt: the local model's context window is the
        // bottleneck, and the moderate variant keeps the schema intact.
        let system = format!(
            "{}\n\n{}",
            prompt::compressed(content_type, CompressionStrategy::Moderate),
            JSON_ONLY_INSTRUCTION
        );
        let messages = vec![
            ChatMessage {
                role: "system",
                content: system,
            },
            ChatMessage {
                role: "user",
                content: content.to_string(),
            },
        ];

        let raw = wire::post_chat(&self.client, config, messages).await?;
        let result = parse::parse_analysis(&raw, AnalysisSource::Local, &config.name)?;

        debug!(
            score = result.score,
            confidence = ?result.confidence,
            content_type = %content_type,
            content_preview = %truncate_chars(content, 50),
            "Local model scored content"
        );
        Ok(result)
    }
}

#[async_trait]
impl TextAnalyzer for LocalTextClient {
    async fn predict(&self, content: &str, content_type: ContentType) -> Option<AnalysisResult> {
        let config = self.registry.get_model(ModelRole::LocalText)?;
        if !config.enabled {
            debug!("Local text backend disabled");
            return None;
        }

        match self.try_predict(&config, content, content_type).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(
                    model = %config.name,
                    error = %e,
                    content_preview = %truncate_chars(content, 50),
                    "Local analysis failed, deferring to fallback"
                );
                None
            }
        }
    }
}
