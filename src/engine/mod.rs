//! Container engine capability layer
//!
//! Two divergent engines hide behind one interface: the platform-native
//! Apple `container` CLI (per-container IPs, macOS only) and the Docker
//! Engine API (host port mappings, loopback addresses). Provisioners only
//! ever see the trait; engine identity is decided once by the probe.

pub mod apple;
pub mod docker;
pub mod probe;

pub use probe::{DefaultProbe, RuntimeProbe};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Which container engine backs a connection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ContainerEngineKind {
    /// Apple `container` (macOS): per-container IP addresses
    PlatformNative,
    /// Docker: host port mappings on the loopback address
    CrossPlatform,
    /// No usable engine on this machine
    None,
}

impl std::fmt::Display for ContainerEngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ContainerEngineKind::PlatformNative => "container",
            ContainerEngineKind::CrossPlatform => "docker",
            ContainerEngineKind::None => "none",
        };
        f.write_str(name)
    }
}

/// Outcome of a command run inside a container
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub exit_code: i64,
    pub output: String,
}

impl ExecOutput {
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Observed state of a named container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerState {
    pub running: bool,
    /// Container address, when the engine assigns one
    pub address: Option<String>,
}

/// What `run` must do for a named container, given what already exists.
///
/// Pure decision, shared by both engines, so create-vs-reuse behavior
/// cannot drift between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunAction {
    /// No container of that name: create and start one
    Create,
    /// Exists but stopped: start it, never recreate
    Start,
    /// Already running: leave it alone
    Reuse,
}

impl RunAction {
    pub fn plan(existing: Option<&ContainerState>) -> Self {
        match existing {
            None => RunAction::Create,
            Some(state) if state.running => RunAction::Reuse,
            Some(_) => RunAction::Start,
        }
    }
}

/// Uniform capability interface over both container engines
#[async_trait]
pub trait ContainerEngine: Send + Sync {
    fn kind(&self) -> ContainerEngineKind;

    /// Create-or-reuse-and-start a named container. Idempotent by name:
    /// an existing container is started if stopped, never recreated.
    /// Returns the address the service is reachable at.
    async fn run(
        &self,
        name: &str,
        image: &str,
        env: &[(String, String)],
        ports: Option<&[(u16, u16)]>,
    ) -> Result<String>;

    /// Start an existing, stopped container
    async fn start(&self, name: &str) -> Result<()>;

    /// Observe a named container; `None` if it does not exist
    async fn inspect(&self, name: &str) -> Result<Option<ContainerState>>;

    /// Run a command inside a running container
    async fn exec(&self, name: &str, command: &[&str]) -> Result<ExecOutput>;
}

/// Polls `exec` until the health command exits 0 or attempts run out.
///
/// Fixed linear backoff; the only blocking retry loop in the crate. On
/// exhaustion the error names the container and the attempt count.
pub async fn wait_for_healthy(
    engine: &dyn ContainerEngine,
    name: &str,
    command: &[&str],
    max_attempts: u32,
    interval: Duration,
) -> Result<()> {
    for attempt in 1..=max_attempts {
        match engine.exec(name, command).await {
            Ok(output) if output.succeeded() => {
                debug!(container = name, attempt, "health check passed");
                return Ok(());
            }
            Ok(output) => {
                debug!(
                    container = name,
                    attempt,
                    exit_code = output.exit_code,
                    "health check not ready"
                );
            }
            Err(err) => {
                warn!(container = name, attempt, error = %err, "health check exec failed");
            }
        }
        if attempt < max_attempts {
            tokio::time::sleep(interval).await;
        }
    }
    Err(anyhow!(
        "container {name} did not become healthy after {max_attempts} attempts"
    ))
}
