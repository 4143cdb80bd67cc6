//! Component health and readiness
//!
//! Tracks the analysis loop, notifier and metric source so the daemon can
//! answer liveness and readiness probes. Readiness additionally requires
//! the daemon to have finished startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Health status of a component, ordered from best to worst
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Healthy,
    /// Still processing snapshots, with reduced function
    Degraded,
    Unhealthy,
}

impl ComponentStatus {
    pub fn is_operational(&self) -> bool {
        *self != ComponentStatus::Unhealthy
    }
}

/// Last reported state of one component
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Unix seconds of the report
    pub last_check_timestamp: i64,
}

impl ComponentHealth {
    fn with_status(status: ComponentStatus, message: Option<String>) -> Self {
        Self {
            status,
            message,
            last_check_timestamp: chrono::Utc::now().timestamp(),
        }
    }

    pub fn healthy() -> Self {
        Self::with_status(ComponentStatus::Healthy, None)
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self::with_status(ComponentStatus::Degraded, Some(message.into()))
    }

    pub fn unhealthy(message: impl Into<String>) -> Self {
        Self::with_status(ComponentStatus::Unhealthy, Some(message.into()))
    }
}

/// Body of `/healthz`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub components: HashMap<String, ComponentHealth>,
}

impl HealthResponse {
    /// The worst status among `components`, healthy when there are none
    pub fn compute_status(components: &HashMap<String, ComponentHealth>) -> ComponentStatus {
        components
            .values()
            .map(|health| health.status)
            .max()
            .unwrap_or(ComponentStatus::Healthy)
    }
}

/// Body of `/readyz`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Component names for health tracking
pub mod components {
    pub const ANALYSIS_LOOP: &str = "analysis_loop";
    pub const NOTIFIER: &str = "notifier";
    pub const METRIC_SOURCE: &str = "metric_source";
}

#[derive(Debug, Default)]
struct RegistryState {
    components: HashMap<String, ComponentHealth>,
    started: bool,
}

/// Shared registry of component health
#[derive(Debug, Clone, Default)]
pub struct HealthRegistry {
    state: Arc<RwLock<RegistryState>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a component as healthy, replacing any earlier report
    pub async fn register(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    pub async fn update(&self, name: &str, health: ComponentHealth) {
        self.state
            .write()
            .await
            .components
            .insert(name.to_string(), health);
    }

    pub async fn set_healthy(&self, name: &str) {
        self.update(name, ComponentHealth::healthy()).await;
    }

    pub async fn set_degraded(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::degraded(message)).await;
    }

    pub async fn set_unhealthy(&self, name: &str, message: impl Into<String>) {
        self.update(name, ComponentHealth::unhealthy(message)).await;
    }

    /// Mark startup as finished (or the daemon as draining, with `false`)
    pub async fn set_ready(&self, ready: bool) {
        self.state.write().await.started = ready;
    }

    /// Last report for one component
    pub async fn component(&self, name: &str) -> Option<ComponentHealth> {
        self.state.read().await.components.get(name).cloned()
    }

    pub async fn health(&self) -> HealthResponse {
        let components = self.state.read().await.components.clone();
        let status = HealthResponse::compute_status(&components);
        HealthResponse { status, components }
    }

    /// Ready once started and while no component is unhealthy
    ///
    /// The reason names every unhealthy component, sorted by name.
    pub async fn readiness(&self) -> ReadinessResponse {
        let state = self.state.read().await;

        if !state.started {
            return ReadinessResponse {
                ready: false,
                reason: Some("Monitor not yet initialized".to_string()),
            };
        }

        let mut failing: Vec<String> = state
            .components
            .iter()
            .filter(|(_, health)| !health.status.is_operational())
            .map(|(name, health)| match &health.message {
                Some(message) => format!("{name}: {message}"),
                None => name.clone(),
            })
            .collect();

        if failing.is_empty() {
            return ReadinessResponse {
                ready: true,
                reason: None,
            };
        }

        failing.sort();
        ReadinessResponse {
            ready: false,
            reason: Some(format!("Unhealthy components: {}", failing.join(", "))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_registry_initial_state() {
        let registry = HealthRegistry::new();
        let health = registry.health().await;

        assert_eq!(health.status, ComponentStatus::Healthy);
        assert!(health.components.is_empty());
        assert!(registry.component(components::NOTIFIER).await.is_none());
    }

    #[tokio::test]
    async fn test_component_registration() {
        let registry = HealthRegistry::new();
        registry.register(components::ANALYSIS_LOOP).await;

        let loop_health = registry.component(components::ANALYSIS_LOOP).await.unwrap();
        assert_eq!(loop_health.status, ComponentStatus::Healthy);
        assert!(loop_health.message.is_none());
    }

    #[tokio::test]
    async fn test_degraded_source_degrades_overall() {
        let registry = HealthRegistry::new();
        registry.register(components::ANALYSIS_LOOP).await;
        registry.register(components::METRIC_SOURCE).await;

        registry
            .set_degraded(components::METRIC_SOURCE, "poll failed")
            .await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Degraded);
        assert!(health.status.is_operational());
    }

    #[tokio::test]
    async fn test_unhealthy_wins() {
        let registry = HealthRegistry::new();
        registry.register(components::NOTIFIER).await;
        registry.set_degraded(components::ANALYSIS_LOOP, "stopped").await;
        registry.set_unhealthy(components::METRIC_SOURCE, "source closed").await;

        let health = registry.health().await;
        assert_eq!(health.status, ComponentStatus::Unhealthy);
    }

    #[tokio::test]
    async fn test_readiness_transitions() {
        let registry = HealthRegistry::new();
        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert_eq!(readiness.reason.as_deref(), Some("Monitor not yet initialized"));

        registry.register(components::METRIC_SOURCE).await;
        registry.set_ready(true).await;
        assert!(registry.readiness().await.ready);

        // degraded components keep the daemon ready
        registry.set_degraded(components::NOTIFIER, "sink offline").await;
        assert!(registry.readiness().await.ready);

        registry.set_unhealthy(components::METRIC_SOURCE, "closed").await;
        let readiness = registry.readiness().await;
        assert!(!readiness.ready);
        assert_eq!(
            readiness.reason.as_deref(),
            Some("Unhealthy components: metric_source: closed")
        );
    }
}
