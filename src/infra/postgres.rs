//! Relational store provisioner (Postgres)

use super::provisioner::{ensure_containerized, HealthSettings, ServiceProvisioner};
use super::{Connection, InfraKind};
use crate::engine::RuntimeProbe;
use anyhow::Result;
use async_trait::async_trait;

pub struct PostgresProvisioner {
    health: HealthSettings,
}

impl PostgresProvisioner {
    pub fn new(health: HealthSettings) -> Self {
        Self { health }
    }
}

#[async_trait]
impl ServiceProvisioner for PostgresProvisioner {
    fn kind(&self) -> InfraKind {
        InfraKind::Postgres
    }

    async fn ensure(&self, probe: &dyn RuntimeProbe) -> Result<Option<Connection>> {
        ensure_containerized(InfraKind::Postgres, probe, self.health).await
    }
}
