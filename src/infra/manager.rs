//! Infrastructure manager: parallel multi-service orchestration
//!
//! Deduplicates requested kinds, probes the runtime once, fans out one
//! provisioning task per kind, and aggregates env vars, service descriptors
//! and errors. A failing kind never aborts its siblings; the only
//! short-circuit is the pre-flight check when no engine exists and some
//! requested kind has no connection override.

use super::mongo::MongoProvisioner;
use super::postgres::PostgresProvisioner;
use super::provisioner::{HealthSettings, ServiceProvisioner};
use super::redis::RedisProvisioner;
use super::{InfraKind, ProvisionResult, ServiceDescriptor};
use crate::config::DevstackConfig;
use crate::engine::{ContainerEngineKind, DefaultProbe, RuntimeProbe};
use futures_util::future::join_all;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

pub struct InfraManager {
    probe: Arc<dyn RuntimeProbe>,
    provisioners: Vec<Arc<dyn ServiceProvisioner>>,
    // Accumulated across repeated provision() calls within one process
    services: Mutex<BTreeMap<InfraKind, ServiceDescriptor>>,
    errors: Mutex<Vec<String>>,
}

impl InfraManager {
    /// Manager over the real probe and the default provisioner set
    pub fn new(config: &DevstackConfig) -> Self {
        let health = HealthSettings {
            max_attempts: config.health_attempts,
            interval: config.health_interval,
        };
        Self::with_parts(
            Arc::new(DefaultProbe::new()),
            vec![
                Arc::new(PostgresProvisioner::new(health)),
                Arc::new(RedisProvisioner::new(health)),
                Arc::new(MongoProvisioner),
            ],
        )
    }

    /// Fully injected constructor (tests swap in mock probes/provisioners)
    pub fn with_parts(
        probe: Arc<dyn RuntimeProbe>,
        provisioners: Vec<Arc<dyn ServiceProvisioner>>,
    ) -> Self {
        Self {
            probe,
            provisioners,
            services: Mutex::new(BTreeMap::new()),
            errors: Mutex::new(Vec::new()),
        }
    }

    /// Provisions every requested kind, isolating per-kind failures
    pub async fn provision(&self, requested: &[InfraKind]) -> ProvisionResult {
        let mut kinds: Vec<InfraKind> = Vec::new();
        for kind in requested {
            if !kinds.contains(kind) {
                kinds.push(*kind);
            }
        }

        if kinds.is_empty() {
            debug!("nothing requested, skipping runtime probe");
            return ProvisionResult::default();
        }

        let detected = self.probe.detect().await;
        info!(engine = %detected, kinds = ?kinds, "provisioning requested services");

        if detected == ContainerEngineKind::None {
            let unsatisfiable: Vec<&str> = kinds
                .iter()
                .filter(|kind| std::env::var(kind.config().env_var).is_err())
                .map(|kind| kind.name())
                .collect();
            if !unsatisfiable.is_empty() {
                let message = format!(
                    "no container engine available and no connection override set for: {}",
                    unsatisfiable.join(", ")
                );
                warn!("{message}");
                self.errors.lock().unwrap().push(message.clone());
                return ProvisionResult {
                    errors: vec![message],
                    ..Default::default()
                };
            }
        }

        let tasks = kinds.iter().map(|kind| {
            let kind = *kind;
            let provisioner = self.provisioner_for(kind);
            let probe = Arc::clone(&self.probe);
            async move {
                let outcome = match provisioner {
                    Some(provisioner) => provisioner.ensure(probe.as_ref()).await,
                    None => Err(anyhow::anyhow!("no provisioner registered")),
                };
                (kind, outcome)
            }
        });

        let mut result = ProvisionResult::default();
        for (kind, outcome) in join_all(tasks).await {
            match outcome {
                Ok(Some(conn)) => {
                    let descriptor = ServiceDescriptor::from_connection(kind, &conn);
                    result
                        .env
                        .insert(kind.config().env_var.to_string(), conn.url);
                    result.services.push(descriptor);
                }
                Ok(None) => {
                    debug!(kind = %kind, "not provisioned (no engine, no override)");
                }
                Err(err) => {
                    warn!(kind = %kind, error = %err, "provisioning failed");
                    result.errors.push(format!("{kind}: {err:#}"));
                }
            }
        }

        {
            let mut services = self.services.lock().unwrap();
            for descriptor in &result.services {
                services.insert(descriptor.kind, descriptor.clone());
            }
        }
        self.errors.lock().unwrap().extend(result.errors.clone());

        result
    }

    /// Kind-keyed lookup over everything provisioned so far
    pub fn service(&self, kind: InfraKind) -> Option<ServiceDescriptor> {
        self.services.lock().unwrap().get(&kind).cloned()
    }

    /// Every error accumulated across provision() calls
    pub fn accumulated_errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    fn provisioner_for(&self, kind: InfraKind) -> Option<Arc<dyn ServiceProvisioner>> {
        self.provisioners
            .iter()
            .find(|provisioner| provisioner.kind() == kind)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ContainerEngine;
    use async_trait::async_trait;

    struct NoRuntimeProbe;

    #[async_trait]
    impl RuntimeProbe for NoRuntimeProbe {
        async fn detect(&self) -> ContainerEngineKind {
            ContainerEngineKind::None
        }

        async fn engine(
            &self,
            _kind: ContainerEngineKind,
        ) -> Option<Arc<dyn ContainerEngine>> {
            None
        }
    }

    #[tokio::test]
    async fn test_empty_request_skips_probe() {
        // A probe that panics on use proves provision([]) never touches it
        struct PanickingProbe;

        #[async_trait]
        impl RuntimeProbe for PanickingProbe {
            async fn detect(&self) -> ContainerEngineKind {
                panic!("probe must not run for an empty request");
            }

            async fn engine(
                &self,
                _kind: ContainerEngineKind,
            ) -> Option<Arc<dyn ContainerEngine>> {
                panic!("probe must not run for an empty request");
            }
        }

        let manager = InfraManager::with_parts(Arc::new(PanickingProbe), vec![]);
        let result = manager.provision(&[]).await;
        assert!(result.env.is_empty());
        assert!(result.services.is_empty());
        assert!(result.errors.is_empty());
    }

    #[tokio::test]
    async fn test_preflight_error_without_engine_or_override() {
        let manager = InfraManager::with_parts(Arc::new(NoRuntimeProbe), vec![]);
        // Probe reports None and no override is set: pre-flight error
        std::env::remove_var("MONGO_URL");
        let result = manager.provision(&[InfraKind::Mongo]).await;
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("mongo"));
        assert!(result.services.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_kinds_are_deduplicated() {
        let manager = InfraManager::with_parts(Arc::new(NoRuntimeProbe), vec![]);
        std::env::remove_var("REDIS_URL");
        let result = manager
            .provision(&[InfraKind::Redis, InfraKind::Redis])
            .await;
        // One aggregated pre-flight error, not one per duplicate
        assert_eq!(result.errors.len(), 1);
    }
}
