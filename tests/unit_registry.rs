// Unit tests for the model registry: priority ordering per mode,
// escalation policy, and atomic reload under concurrent readers.

use std::sync::Arc;
use std::time::Duration;

use palisade::config::{Config, HardwareProfile, RoutingMode};
use palisade::registry::{EscalationPolicy, ModelConfig, ModelRegistry, ModelRole};
use palisade::review::status::ReviewThresholds;

fn backend(name: &str, enabled: bool) -> ModelConfig {
    ModelConfig {
        name: name.to_string(),
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
        local_text: backend("local", local),
        cloud_text: backend("cloud-text", cloud_text),
        cloud_vision: backend("cloud-vision", cloud_vision),
        escalation: EscalationPolicy::default(),
        thresholds: ReviewThresholds::default(),
        grid_rows: 3,
        grid_cols: 3,
    }
}

#[test]
fn hybrid_with_both_backends_is_local_then_cloud() {
    let registry = ModelRegistry::from_config(&config(true, true, true));
    assert_eq!(
        registry.text_model_priority(RoutingMode::Hybrid),
        vec![ModelRole::LocalText, ModelRole::CloudText]
    );
}

#[test]
fn hybrid_with_only_cloud_is_cloud_alone() {
    let registry = ModelRegistry::from_config(&config(false, true, true));
    assert_eq!(
        registry.text_model_priority(RoutingMode::Hybrid),
        vec![ModelRole::CloudText]
    );
}

#[test]
fn mode_specific_priorities() {
    let registry = ModelRegistry::from_config(&config(true, true, true));
    assert!(registry.text_model_priority(RoutingMode::Off).is_empty());
    assert_eq!(
        registry.text_model_priority(RoutingMode::CloudOnly),
        vec![ModelRole::CloudText]
    );
    assert_eq!(
        registry.text_model_priority(RoutingMode::LocalOnly),
        vec![ModelRole::LocalText]
    );
}

#[test]
fn vision_hybrid_and_cloud_only_agree() {
    let registry = ModelRegistry::from_config(&config(true, true, true));
    assert_eq!(
        registry.vision_model_priority(RoutingMode::Hybrid),
        registry.vision_model_priority(RoutingMode::CloudOnly),
    );
    assert!(registry
        .vision_model_priority(RoutingMode::LocalOnly)
        .is_empty());
}

#[test]
fn escalation_threshold_boundaries() {
    let registry = ModelRegistry::from_config(&config(true, true, true));
    assert!(registry.should_escalate_to_cloud(0.40));
    assert!(!registry.should_escalate_to_cloud(0.60));
}

#[test]
fn absent_confidence_reads_as_zero_and_escalates() {
    let registry = ModelRegistry::from_config(&config(true, true, true));
    // The engine maps a missing confidence field to 0.0
    assert!(registry.should_escalate_to_cloud(0.0));
}

#[test]
fn no_cloud_backend_means_no_escalation() {
    let registry = ModelRegistry::from_config(&config(true, false, true));
    assert!(!registry.should_escalate_to_cloud(0.01));
}

#[test]
fn unconfigured_role_is_unavailable_not_an_error() {
    let registry = ModelRegistry::from_config(&config(true, false, false));
    assert!(!registry.is_available(ModelRole::CloudText));
    assert!(registry.get_model(ModelRole::CloudText).is_some());
    assert!(!registry.get_model(ModelRole::CloudText).unwrap().enabled);
}

// ============================================================
// Reload atomicity: readers never see a half-built map
// ============================================================

#[test]
fn concurrent_readers_see_whole_states_only() {
    // Config A: everything enabled, hybrid. Config B: local only.
    // A reader snapshot must always match one of the two configurations
    // exactly; a mixed view (e.g. cloud-only ordering out of config B)
    // would mean the swap was observed half-done.
    let registry = Arc::new(ModelRegistry::from_config(&config(true, true, true)));

    let mut config_b = config(true, false, false);
    config_b.llm_mode = RoutingMode::LocalOnly;

    let reader = {
        let registry = Arc::clone(&registry);
        std::thread::spawn(move || {
            for _ in 0..2000 {
                let priority = registry.text_priority();
                assert!(
                    priority == vec![ModelRole::LocalText, ModelRole::CloudText]
                        || priority == vec![ModelRole::LocalText],
                    "observed mixed registry state: {priority:?}"
                );
            }
        })
    };

    let writer = {
        let registry = Arc::clone(&registry);
        let config_a = config(true, true, true);
        std::thread::spawn(move || {
            for i in 0..500 {
                if i % 2 == 0 {
                    registry.reload(&config_b);
                } else {
                    registry.reload(&config_a);
                }
            }
        })
    };

    reader.join().unwrap();
    writer.join().unwrap();
}
