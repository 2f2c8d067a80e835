//! Cache provisioner (Redis)

use super::provisioner::{ensure_containerized, HealthSettings, ServiceProvisioner};
use super::{Connection, InfraKind};
use crate::engine::RuntimeProbe;
use anyhow::Result;
use async_trait::async_trait;

pub struct RedisProvisioner {
    health: HealthSettings,
}

impl RedisProvisioner {
    pub fn new(health: HealthSettings) -> Self {
        Self { health }
    }
}

#[async_trait]
impl ServiceProvisioner for RedisProvisioner {
    fn kind(&self) -> InfraKind {
        InfraKind::Redis
    }

    async fn ensure(&self, probe: &dyn RuntimeProbe) -> Result<Option<Connection>> {
        ensure_containerized(InfraKind::Redis, probe, self.health).await
    }
}
