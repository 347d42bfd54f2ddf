// Model registry: which backend handles which role, and when to escalate.
//
// The registry owns the role→backend map and all routing policy: priority
// order per mode, availability checks, and the low-confidence escalation
// decision. It is read on every moderation call and rebuilt only on an
// explicit reload, so the whole policy state lives behind one Arc that a
// reload replaces in a single swap. Readers clone the Arc and keep working
// against the snapshot they started with.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{Config, RoutingMode};

/// The three backend roles the engine can route to.
///
/// There is deliberately no local vision role: the deployments this engine
/// targets have no GPU budget for a local vision model, so frame review is
/// cloud-only in every mode that allows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelRole {
    LocalText,
    CloudText,
    CloudVision,
}

impl ModelRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelRole::LocalText => "local_text",
            ModelRole::CloudText => "cloud_text",
            ModelRole::CloudVision => "cloud_vision",
        }
    }
}

impl std::fmt::Display for ModelRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One configured model backend.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Model identifier sent to the endpoint (e.g. "qwen2.5:3b")
    pub name: String,
    /// API key; empty for local backends that need none
    pub credential: String,
    /// Chat-completions endpoint URL
    pub endpoint: String,
    pub timeout: Duration,
    /// Concurrent in-flight calls allowed against this backend
    pub max_concurrency: usize,
    pub enabled: bool,
}

/// When to re-run a local result through the cloud backend.
#[derive(Debug, Clone, Copy)]
pub struct EscalationPolicy {
    pub enabled: bool,
    /// Local results with confidence below this go to the cloud
    pub confidence_threshold: f64,
}

impl Default for EscalationPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            confidence_threshold: 0.55,
        }
    }
}

/// Everything a reload replaces, as one unit.
struct RegistryState {
    backends: HashMap<ModelRole, ModelConfig>,
    llm_mode: RoutingMode,
    vision_mode: RoutingMode,
    escalation: EscalationPolicy,
}

/// Shared, reloadable view of the configured backends.
pub struct ModelRegistry {
    state: RwLock<Arc<RegistryState>>,
}

impl ModelRegistry {
    pub fn from_config(config: &Config) -> Self {
        Self {
            state: RwLock::new(Arc::new(Self::build_state(config))),
        }
    }

    fn build_state(config: &Config) -> RegistryState {
        let mut backends = HashMap::new();
        for (role, model) in [
            (ModelRole::LocalText, &config.local_text),
            (ModelRole::CloudText, &config.cloud_text),
            (ModelRole::CloudVision, &config.cloud_vision),
        ] {
            let mut model = model.clone();
            if model.enabled && model.max_concurrency == 0 {
                warn!(role = %role, "max_concurrency 0 on an enabled backend, clamping to 1");
                model.max_concurrency = 1;
            }
            backends.insert(role, model);
        }
        RegistryState {
            backends,
            llm_mode: config.llm_mode,
            vision_mode: config.vision_mode,
            escalation: config.escalation,
        }
    }

    /// Rebuild the backend map from configuration and publish it.
    ///
    /// The new state is built off to the side and swapped in as one
    /// assignment, so a concurrent reader either sees the old map or the
    /// new one, never a half-built mix.
    pub fn reload(&self, config: &Config) {
        let fresh = Arc::new(Self::build_state(config));
        *write_lock(&self.state) = fresh;
        info!(
            llm_mode = %config.llm_mode,
            vision_mode = %config.vision_mode,
            "Model registry reloaded"
        );
    }

    fn snapshot(&self) -> Arc<RegistryState> {
        read_lock(&self.state).clone()
    }

    /// The configured backend for a role, if any.
    pub fn get_model(&self, role: ModelRole) -> Option<ModelConfig> {
        self.snapshot().backends.get(&role).cloned()
    }

    /// Whether a role has an enabled backend behind it.
    pub fn is_available(&self, role: ModelRole) -> bool {
        self.snapshot()
            .backends
            .get(&role)
            .map(|m| m.enabled)
            .unwrap_or(false)
    }

    /// Current text routing mode.
    pub fn llm_mode(&self) -> RoutingMode {
        self.snapshot().llm_mode
    }

    /// Current vision routing mode.
    pub fn vision_mode(&self) -> RoutingMode {
        self.snapshot().vision_mode
    }

    /// Text backends to try, in order, under the current mode. Mode and
    /// availability come from one snapshot, so a concurrent reload never
    /// produces a mixed old/new ordering.
    pub fn text_priority(&self) -> Vec<ModelRole> {
        let state = self.snapshot();
        text_priority_in(&state, state.llm_mode)
    }

    /// Text backends to try, in order, under an explicit mode.
    ///
    /// Hybrid puts local first: it answers most content at zero marginal
    /// cost and the cloud backend only sees the low-confidence remainder.
    pub fn text_model_priority(&self, mode: RoutingMode) -> Vec<ModelRole> {
        text_priority_in(&self.snapshot(), mode)
    }

    /// Vision backends to try, in order, under the current mode.
    pub fn vision_priority(&self) -> Vec<ModelRole> {
        let state = self.snapshot();
        vision_priority_in(&state, state.vision_mode)
    }

    /// Vision backends under an explicit mode. With no local vision
    /// backend, hybrid and cloud_only resolve identically and local_only
    /// resolves to nothing.
    pub fn vision_model_priority(&self, mode: RoutingMode) -> Vec<ModelRole> {
        vision_priority_in(&self.snapshot(), mode)
    }

    /// Whether a local result with this confidence should be re-run
    /// through the cloud backend.
    pub fn should_escalate_to_cloud(&self, confidence: f64) -> bool {
        let state = self.snapshot();
        state.escalation.enabled
            && available_in(&state, ModelRole::CloudText)
            && confidence < state.escalation.confidence_threshold
    }
}

fn available_in(state: &RegistryState, role: ModelRole) -> bool {
    state.backends.get(&role).map(|m| m.enabled).unwrap_or(false)
}

fn text_priority_in(state: &RegistryState, mode: RoutingMode) -> Vec<ModelRole> {
    let candidates: &[ModelRole] = match mode {
        RoutingMode::Off => &[],
        RoutingMode::CloudOnly => &[ModelRole::CloudText],
        RoutingMode::LocalOnly => &[ModelRole::LocalText],
        RoutingMode::Hybrid => &[ModelRole::LocalText, ModelRole::CloudText],
    };
    candidates
        .iter()
        .copied()
        .filter(|role| available_in(state, *role))
        .collect()
}

fn vision_priority_in(state: &RegistryState, mode: RoutingMode) -> Vec<ModelRole> {
    let candidates: &[ModelRole] = match mode {
        RoutingMode::Off | RoutingMode::LocalOnly => &[],
        RoutingMode::CloudOnly | RoutingMode::Hybrid => &[ModelRole::CloudVision],
    };
    candidates
        .iter()
        .copied()
        .filter(|role| available_in(state, *role))
        .collect()
}

// A poisoned lock here means a writer panicked mid-swap of a single Arc
// assignment; the map inside is still the last fully published one, so
// recover the guard instead of propagating the panic to every reader.
fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HardwareProfile;
    use crate::review::status::ReviewThresholds;

    fn backend(enabled: bool) -> ModelConfig {
        ModelConfig {
            name: "test-model".to_string(),
            credential: if enabled { "key".to_string() } else { String::new() },
            endpoint: "http://127.0.0.1:9/v1/chat/completions".to_string(),
            timeout: Duration::from_secs(5),
            max_concurrency: 2,
            enabled,
        }
    }

    fn config(local: bool, cloud_text: bool, cloud_vision: bool) -> Config {
        Config {
            llm_mode: RoutingMode::Hybrid,
            vision_mode: RoutingMode::Hybrid,
            hardware_profile: HardwareProfile::Standard,
            local_text: backend(local),
            cloud_text: backend(cloud_text),
            cloud_vision: backend(cloud_vision),
            escalation: EscalationPolicy::default(),
            thresholds: ReviewThresholds::default(),
            grid_rows: 3,
            grid_cols: 3,
        }
    }

    #[test]
    fn hybrid_prefers_local_then_cloud() {
        let registry = ModelRegistry::from_config(&config(true, true, true));
        assert_eq!(
            registry.text_model_priority(RoutingMode::Hybrid),
            vec![ModelRole::LocalText, ModelRole::CloudText]
        );
    }

    #[test]
    fn hybrid_with_only_cloud_degrades() {
        let registry = ModelRegistry::from_config(&config(false, true, true));
        assert_eq!(
            registry.text_model_priority(RoutingMode::Hybrid),
            vec![ModelRole::CloudText]
        );
    }

    #[test]
    fn off_mode_yields_nothing() {
        let registry = ModelRegistry::from_config(&config(true, true, true));
        assert!(registry.text_model_priority(RoutingMode::Off).is_empty());
        assert!(registry.vision_model_priority(RoutingMode::Off).is_empty());
    }

    #[test]
    fn vision_never_routes_local() {
        let registry = ModelRegistry::from_config(&config(true, true, true));
        assert_eq!(
            registry.vision_model_priority(RoutingMode::Hybrid),
            vec![ModelRole::CloudVision]
        );
        assert_eq!(
            registry.vision_model_priority(RoutingMode::CloudOnly),
            vec![ModelRole::CloudVision]
        );
        assert!(registry
            .vision_model_priority(RoutingMode::LocalOnly)
            .is_empty());
    }

    #[test]
    fn escalation_respects_threshold() {
        let registry = ModelRegistry::from_config(&config(true, true, true));
        assert!(registry.should_escalate_to_cloud(0.40));
        assert!(!registry.should_escalate_to_cloud(0.60));
        // Exactly at the threshold is confident enough
        assert!(!registry.should_escalate_to_cloud(0.55));
    }

    #[test]
    fn escalation_needs_cloud_backend() {
        let registry = ModelRegistry::from_config(&config(true, false, false));
        assert!(!registry.should_escalate_to_cloud(0.10));
    }

    #[test]
    fn escalation_can_be_disabled() {
        let mut cfg = config(true, true, true);
        cfg.escalation.enabled = false;
        let registry = ModelRegistry::from_config(&cfg);
        assert!(!registry.should_escalate_to_cloud(0.10));
    }

    #[test]
    fn zero_concurrency_clamped_when_enabled() {
        let mut cfg = config(true, true, true);
        cfg.local_text.max_concurrency = 0;
        let registry = ModelRegistry::from_config(&cfg);
        let model = registry.get_model(ModelRole::LocalText).unwrap();
        assert_eq!(model.max_concurrency, 1);
    }

    #[test]
    fn reload_swaps_whole_map() {
        let registry = ModelRegistry::from_config(&config(true, true, true));
        assert!(registry.is_available(ModelRole::CloudText));

        let mut cfg = config(true, false, false);
        cfg.llm_mode = RoutingMode::LocalOnly;
        registry.reload(&cfg);

        assert!(!registry.is_available(ModelRole::CloudText));
        assert_eq!(registry.llm_mode(), RoutingMode::LocalOnly);
        assert_eq!(registry.text_priority(), vec![ModelRole::LocalText]);
    }
}
