use std::env;
use std::time::Duration;

use anyhow::Result;

use crate::registry::{EscalationPolicy, ModelConfig};
use crate::review::status::ReviewThresholds;

/// Routing policy for a model family (text or vision).
///
/// Parsed from the `LLM_MODE` / `VISION_MODE` environment variables.
/// Unknown values fall back to `Hybrid` with a warning so a typo in a
/// deployment env file degrades gracefully instead of disabling moderation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingMode {
    /// Moderation disabled for this family
    Off,
    /// Cloud backend only
    CloudOnly,
    /// Local backend only (text family; vision has no local backend)
    LocalOnly,
    /// Local first, cloud as low-confidence fallback
    Hybrid,
}

impl RoutingMode {
    /// Parse a routing mode from an environment variable.
    pub fn from_env(var: &str) -> Self {
        match env::var(var).as_deref() {
            Ok("off") => RoutingMode::Off,
            Ok("cloud_only") => RoutingMode::CloudOnly,
            Ok("local_only") => RoutingMode::LocalOnly,
            Ok("hybrid") | Err(_) => RoutingMode::Hybrid,
            Ok(other) => {
                tracing::warn!(var, value = other, "Unknown routing mode, using hybrid");
                RoutingMode::Hybrid
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoutingMode::Off => "off",
            RoutingMode::CloudOnly => "cloud_only",
            RoutingMode::LocalOnly => "local_only",
            RoutingMode::Hybrid => "hybrid",
        }
    }
}

impl std::fmt::Display for RoutingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Hardware profile for the machine hosting the local model.
///
/// Sizes the local inference concurrency cap: a small-VRAM GPU can only
/// hold one request in flight without thrashing, a standard one takes two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HardwareProfile {
    SmallVram,
    Standard,
}

impl HardwareProfile {
    pub fn from_env() -> Self {
        match env::var("HARDWARE_PROFILE").as_deref() {
            Ok("small-vram") => HardwareProfile::SmallVram,
            _ => HardwareProfile::Standard,
        }
    }

    /// Default concurrent local inference calls for this profile.
    pub fn local_concurrency(&self) -> usize {
        match self {
            HardwareProfile::SmallVram => 1,
            HardwareProfile::Standard => 2,
        }
    }
}

/// Central configuration loaded from environment variables.
///
/// All credentials come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
#[derive(Debug, Clone)]
pub struct Config {
    /// Routing policy for comment/danmaku/subtitle text moderation
    pub llm_mode: RoutingMode,
    /// Routing policy for frame moderation
    pub vision_mode: RoutingMode,
    pub hardware_profile: HardwareProfile,
    pub local_text: ModelConfig,
    pub cloud_text: ModelConfig,
    pub cloud_vision: ModelConfig,
    pub escalation: EscalationPolicy,
    pub thresholds: ReviewThresholds,
    /// Frame grid layout for batched vision calls
    pub grid_rows: u32,
    pub grid_cols: u32,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// The cloud backends are enabled only when their API key is present;
    /// the local backend has a default endpoint and is enabled unless
    /// `LOCAL_LLM_ENABLED=false`.
    pub fn load() -> Result<Self> {
        // Absent .env is fine; deployments set real environment variables
        dotenvy::dotenv().ok();

        let hardware_profile = HardwareProfile::from_env();

        let local_text = ModelConfig {
            name: env::var("LOCAL_LLM_MODEL").unwrap_or_else(|_| "qwen2.5:3b".to_string()),
            credential: String::new(),
            endpoint: env::var("LOCAL_LLM_ENDPOINT")
                .unwrap_or_else(|_| "http://127.0.0.1:11434/v1/chat/completions".to_string()),
            timeout: Duration::from_secs(env_u64("LOCAL_LLM_TIMEOUT_SECS", 30)),
            max_concurrency: env_usize(
                "LOCAL_LLM_CONCURRENCY",
                hardware_profile.local_concurrency(),
            ),
            enabled: env::var("LOCAL_LLM_ENABLED").as_deref() != Ok("false"),
        };

        let cloud_text_key = env::var("CLOUD_LLM_API_KEY").unwrap_or_default();
        let cloud_text = ModelConfig {
            name: env::var("CLOUD_LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            enabled: !cloud_text_key.is_empty(),
            credential: cloud_text_key,
            endpoint: env::var("CLOUD_LLM_ENDPOINT")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string()),
            timeout: Duration::from_secs(env_u64("CLOUD_LLM_TIMEOUT_SECS", 60)),
            max_concurrency: env_usize("CLOUD_LLM_CONCURRENCY", 4),
        };

        // The vision key falls back to the text key so a single-provider
        // deployment only has to set one variable.
        let cloud_vision_key =
            env::var("CLOUD_VISION_API_KEY").unwrap_or_else(|_| cloud_text.credential.clone());
        let cloud_vision = ModelConfig {
            name: env::var("CLOUD_VISION_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            enabled: !cloud_vision_key.is_empty(),
            credential: cloud_vision_key,
            endpoint: env::var("CLOUD_VISION_ENDPOINT")
                .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".to_string()),
            timeout: Duration::from_secs(env_u64("CLOUD_VISION_TIMEOUT_SECS", 60)),
            max_concurrency: env_usize("CLOUD_VISION_CONCURRENCY", 2),
        };

        Ok(Self {
            llm_mode: RoutingMode::from_env("LLM_MODE"),
            vision_mode: RoutingMode::from_env("VISION_MODE"),
            hardware_profile,
            local_text,
            cloud_text,
            cloud_vision,
            escalation: EscalationPolicy {
                enabled: env::var("ESCALATION_ENABLED").as_deref() != Ok("false"),
                confidence_threshold: env_f64("ESCALATION_CONFIDENCE_THRESHOLD", 0.55),
            },
            thresholds: ReviewThresholds {
                violation_reject_ratio: env_f64("REVIEW_VIOLATION_REJECT_RATIO", 10.0),
                violation_review_ratio: env_f64("REVIEW_VIOLATION_REVIEW_RATIO", 5.0),
                suspicious_review_ratio: env_f64("REVIEW_SUSPICIOUS_REVIEW_RATIO", 20.0),
                score_review_gate: env_f64("REVIEW_SCORE_GATE", 60.0),
            },
            grid_rows: env_u64("FRAME_GRID_ROWS", 3) as u32,
            grid_cols: env_u64("FRAME_GRID_COLS", 3) as u32,
        })
    }

    /// Check that the cloud text backend is usable.
    /// Call this before forcing `cloud_only` mode in a deployment.
    pub fn require_cloud_text(&self) -> Result<()> {
        if self.cloud_text.credential.is_empty() {
            anyhow::bail!(
                "CLOUD_LLM_API_KEY not set. Add it to your .env file, or use \
                 LLM_MODE=local_only to run without a cloud backend."
            );
        }
        Ok(())
    }

    /// Check that frame moderation can run at all.
    pub fn require_vision(&self) -> Result<()> {
        if self.vision_mode != RoutingMode::Off && self.cloud_vision.credential.is_empty() {
            anyhow::bail!(
                "CLOUD_VISION_API_KEY (or CLOUD_LLM_API_KEY) not set. Frame review \
                 needs a cloud vision backend, or set VISION_MODE=off."
            );
        }
        Ok(())
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}
