//! Runtime probe: decides once which container engine this machine can use
//!
//! Policy: the platform-native Apple engine is preferred, but only on macOS
//! and only if its daemon answers (or can be started). A negative result is
//! not fatal; detection falls through to Docker, which counts as usable when
//! the binary is on PATH and the daemon answers a live ping. If neither is
//! usable, detection reports `None` and provisioning is left to env-var
//! overrides.

use super::apple::AppleContainerEngine;
use super::docker::DockerEngine;
use super::{ContainerEngine, ContainerEngineKind};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Capability seam over engine detection, injectable for tests
#[async_trait]
pub trait RuntimeProbe: Send + Sync {
    /// Which engine this machine can use. Bounded-time; cached per probe.
    async fn detect(&self) -> ContainerEngineKind;

    /// Hands out the engine for a detected kind, if it is usable
    async fn engine(&self, kind: ContainerEngineKind) -> Option<Arc<dyn ContainerEngine>>;
}

/// Probe backed by the real engines; detection runs at most once
#[derive(Default)]
pub struct DefaultProbe {
    detected: OnceCell<ContainerEngineKind>,
    docker: OnceCell<Option<Arc<DockerEngine>>>,
}

impl DefaultProbe {
    pub fn new() -> Self {
        Self::default()
    }

    async fn docker_engine(&self) -> Option<Arc<DockerEngine>> {
        self.docker
            .get_or_init(|| async {
                if !binary_on_path("docker") {
                    debug!("docker binary not on PATH");
                    return None;
                }
                DockerEngine::connect().await.map(Arc::new)
            })
            .await
            .clone()
    }

    async fn detect_uncached(&self) -> ContainerEngineKind {
        if AppleContainerEngine::available().await {
            info!("using platform-native container engine");
            return ContainerEngineKind::PlatformNative;
        }
        if self.docker_engine().await.is_some() {
            info!("using docker");
            return ContainerEngineKind::CrossPlatform;
        }
        debug!("no usable container engine found");
        ContainerEngineKind::None
    }
}

#[async_trait]
impl RuntimeProbe for DefaultProbe {
    async fn detect(&self) -> ContainerEngineKind {
        *self
            .detected
            .get_or_init(|| self.detect_uncached())
            .await
    }

    async fn engine(&self, kind: ContainerEngineKind) -> Option<Arc<dyn ContainerEngine>> {
        match kind {
            ContainerEngineKind::PlatformNative => {
                Some(Arc::new(AppleContainerEngine) as Arc<dyn ContainerEngine>)
            }
            ContainerEngineKind::CrossPlatform => self
                .docker_engine()
                .await
                .map(|engine| engine as Arc<dyn ContainerEngine>),
            ContainerEngineKind::None => None,
        }
    }
}

/// Checks the executable search path for a binary
fn binary_on_path(name: &str) -> bool {
    let Some(path) = std::env::var_os("PATH") else {
        return false;
    };
    std::env::split_paths(&path).any(|dir| {
        let candidate = dir.join(name);
        candidate.is_file() || Path::new(&format!("{}.exe", candidate.display())).is_file()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_on_path_finds_shell() {
        #[cfg(unix)]
        assert!(binary_on_path("sh"));
    }

    #[test]
    fn test_binary_on_path_misses_nonsense() {
        assert!(!binary_on_path("devstack-definitely-not-a-binary"));
    }

    #[tokio::test]
    async fn test_detect_is_cached() {
        let probe = DefaultProbe::new();
        let first = probe.detect().await;
        let second = probe.detect().await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_engine_for_none_kind() {
        let probe = DefaultProbe::new();
        assert!(probe.engine(ContainerEngineKind::None).await.is_none());
    }
}
