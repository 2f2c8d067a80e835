//! Per-kind service provisioning
//!
//! Each infra kind gets one provisioner sharing the same strictly ordered
//! policy: honor a user-supplied connection override unconditionally, then
//! provision through whichever engine the probe selected, falling back from
//! the platform-native engine to Docker exactly once. No local state is
//! written; idempotency is fully delegated to the engine's named-container
//! semantics.

use super::{Connection, InfraKind};
use crate::engine::{wait_for_healthy, ContainerEngine, ContainerEngineKind, RuntimeProbe};
use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Host value reported for user-supplied connections
pub const USER_PROVIDED_HOST: &str = "user-provided";

/// Health-poll knobs, sourced from `DevstackConfig`
#[derive(Debug, Clone, Copy)]
pub struct HealthSettings {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for HealthSettings {
    fn default() -> Self {
        Self {
            max_attempts: 30,
            interval: Duration::from_millis(1000),
        }
    }
}

/// One backing service's provisioning strategy
#[async_trait]
pub trait ServiceProvisioner: Send + Sync {
    fn kind(&self) -> InfraKind;

    /// Ensures the service is reachable. `Ok(None)` means no engine was
    /// available and no override was set; errors carry the reason a
    /// provisioning attempt failed.
    async fn ensure(&self, probe: &dyn RuntimeProbe) -> Result<Option<Connection>>;
}

/// Returns the user-supplied connection for a kind, if its well-known env
/// var is set. Trusted unconditionally; no engine is touched.
pub fn override_connection(kind: InfraKind) -> Option<Connection> {
    let config = kind.config();
    let url = std::env::var(config.env_var).ok()?;
    info!(kind = %kind, env_var = config.env_var, "using user-provided connection");
    Some(Connection {
        url,
        host: USER_PROVIDED_HOST.to_string(),
        port: config.port,
        runtime: None,
    })
}

/// Shared container path for the implemented kinds
pub(crate) async fn ensure_containerized(
    kind: InfraKind,
    probe: &dyn RuntimeProbe,
    health: HealthSettings,
) -> Result<Option<Connection>> {
    if let Some(conn) = override_connection(kind) {
        return Ok(Some(conn));
    }

    let detected = probe.detect().await;
    if detected == ContainerEngineKind::None {
        debug!(kind = %kind, "no container engine and no override, skipping");
        return Ok(None);
    }
    let Some(engine) = probe.engine(detected).await else {
        debug!(kind = %kind, engine = %detected, "detected engine not usable, skipping");
        return Ok(None);
    };

    if detected == ContainerEngineKind::PlatformNative {
        match provision_on(kind, engine.as_ref(), health).await {
            Ok(conn) => Ok(Some(conn)),
            Err(native_err) => {
                warn!(
                    kind = %kind,
                    error = %native_err,
                    "platform-native provisioning failed, falling back to docker"
                );
                match probe.engine(ContainerEngineKind::CrossPlatform).await {
                    Some(fallback) => provision_on(kind, fallback.as_ref(), health)
                        .await
                        .map(Some),
                    None => Err(native_err
                        .context("platform-native provisioning failed and docker is unavailable")),
                }
            }
        }
    } else {
        provision_on(kind, engine.as_ref(), health).await.map(Some)
    }
}

/// Runs the named container on one engine and waits for it to come healthy
async fn provision_on(
    kind: InfraKind,
    engine: &dyn ContainerEngine,
    health: HealthSettings,
) -> Result<Connection> {
    let config = kind.config();
    let env: Vec<(String, String)> = config
        .container_env
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
    let ports = [(config.port, config.port)];

    let host = engine
        .run(config.container_name, config.image, &env, Some(&ports))
        .await?;

    wait_for_healthy(
        engine,
        config.container_name,
        config.health_cmd,
        health.max_attempts,
        health.interval,
    )
    .await?;

    info!(kind = %kind, host, engine = %engine.kind(), "service is healthy");
    Ok(Connection {
        url: kind.connection_url(&host),
        host,
        port: config.port,
        runtime: Some(engine.kind()),
    })
}
