// OpenAI-style chat-completions wire types, shared by the text clients.
//
// Both the local endpoint (Ollama and friends) and the hosted providers
// speak the same request shape, so the transport lives here and the
// clients only differ in prompt selection and result tagging.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::parse::truncate_chars;
use crate::registry::ModelConfig;

#[derive(Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub temperature: f64,
    pub stream: bool,
}

#[derive(Serialize)]
pub(crate) struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Deserialize)]
pub(crate) struct ChatResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoiceMessage {
    #[serde(default)]
    pub content: String,
}

/// POST a chat completion and return the first choice's content.
///
/// The per-request timeout comes from the backend's ModelConfig, so a
/// registry reload changes it for the next call without rebuilding clients.
pub(crate) async fn post_chat(
    client: &reqwest::Client,
    config: &ModelConfig,
    messages: Vec<ChatMessage>,
) -> Result<String> {
    let request = ChatRequest {
        model: config.name.clone(),
        messages,
        // Near-deterministic output; moderation wants repeatability, not flair
        temperature: 0.1,
        stream: false,
    };

    let mut builder = client
        .post(&config.endpoint)
        .timeout(config.timeout)
        .json(&request);
    if !config.credential.is_empty() {
        builder = builder.bearer_auth(&config.credential);
    }

    let response = builder
        .send()
        .await
        .with_context(|| format!("request to {} failed", config.endpoint))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("backend returned {}: {}", status, truncate_chars(&body, 200));
    }

    let parsed: ChatResponse = response
        .json()
        .await
        .context("failed to parse chat response envelope")?;

    Ok(parsed
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .unwrap_or_default())
}
