// Cloud text model client.
//
// The escalation target: hosted models follow schema instructions reliably,
// so they get the full prompt with its few-shot examples intact. Same
// None-on-failure contract as the local client: by the time the engine is
// here there may be no fallback left, and that is the caller's problem to
// report, not an exception to throw.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::parse::{self, truncate_chars};
use super::wire::{self, ChatMessage};
use super::{AnalysisResult, AnalysisSource, ContentType, TextAnalyzer};
use crate::prompt;
use crate::registry::{ModelConfig, ModelRegistry, ModelRole};

pub struct CloudTextClient {
    client: reqwest::Client,
    registry: Arc<ModelRegistry>,
}

impl CloudTextClient {
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
        let messages = vec![
            ChatMessage {
                role: "system",
                content: prompt::prompt(content_type).to_string(),
            },
            ChatMessage {
                role: "user",
                content: content.to_string(),
            },
        ];

        let raw = wire::post_chat(&self.client, config, messages).await?;
        let result = parse::parse_analysis(&raw, AnalysisSource::Cloud, &config.name)?;

        debug!(
            score = result.score,
            confidence = ?result.confidence,
            content_type = %content_type,
            "Cloud model scored content"
        );
        Ok(result)
    }
}

#[async_trait]
impl TextAnalyzer for CloudTextClient {
    async fn predict(&self, content: &str, content_type: ContentType) -> Option<AnalysisResult> {
        let config = self.registry.get_model(ModelRole::CloudText)?;
        if !config.enabled {
            debug!("Cloud text backend disabled");
            return None;
        }

        match self.try_predict(&config, content, content_type).await {
            Ok(result) => Some(result),
            Err(e) => {
                warn!(
                    model = %config.name,
                    error = %e,
                    content_preview = %truncate_chars(content, 50),
                    "Cloud analysis failed"
                );
                None
            }
        }
    }
}
