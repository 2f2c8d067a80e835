//! Document store provisioner (MongoDB) — declared, not yet implemented
//!
//! The kind exists in the catalog and config table so discovery can report
//! it, and a user-supplied MONGO_URL override works, but container
//! provisioning for it is still a stub.

use super::provisioner::{override_connection, ServiceProvisioner};
use super::{Connection, InfraKind};
use crate::engine::RuntimeProbe;
use anyhow::{anyhow, Result};
use async_trait::async_trait;

pub struct MongoProvisioner;

#[async_trait]
impl ServiceProvisioner for MongoProvisioner {
    fn kind(&self) -> InfraKind {
        InfraKind::Mongo
    }

    async fn ensure(&self, _probe: &dyn RuntimeProbe) -> Result<Option<Connection>> {
        if let Some(conn) = override_connection(InfraKind::Mongo) {
            return Ok(Some(conn));
        }
        Err(anyhow!("mongo provisioning is not yet implemented"))
    }
}
