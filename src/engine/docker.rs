//! Cross-platform engine: Docker over the local socket (bollard)
//!
//! Docker maps container ports onto the loopback address, so `run` returns
//! `127.0.0.1` and callers connect through the host port. Unlike the CLI,
//! the Engine API does not pull images implicitly, so `run` pulls before the
//! first create.

use super::{ContainerEngine, ContainerEngineKind, ContainerState, ExecOutput, RunAction};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use bollard::container::{Config, CreateContainerOptions, StartContainerOptions};
use bollard::exec::{CreateExecOptions, StartExecResults};
use bollard::image::CreateImageOptions;
use bollard::models::{HostConfig, PortBinding};
use bollard::Docker;
use futures_util::StreamExt;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

const DOCKER_SOCKET_PATH: &str = "/var/run/docker.sock";
const LOOPBACK_HOST: &str = "127.0.0.1";

pub struct DockerEngine {
    docker: Docker,
}

impl DockerEngine {
    /// Connects to the local daemon and verifies it answers. A missing
    /// socket or dead daemon is reported as `None`, not an error.
    pub async fn connect() -> Option<Self> {
        if !Path::new(DOCKER_SOCKET_PATH).exists() && !cfg!(windows) {
            debug!("docker socket not found at {}", DOCKER_SOCKET_PATH);
            return None;
        }
        let docker = match Docker::connect_with_local_defaults() {
            Ok(docker) => docker,
            Err(err) => {
                debug!(error = %err, "failed to connect to docker");
                return None;
            }
        };
        match docker.version().await {
            Ok(version) => {
                debug!(api_version = ?version.api_version, "docker daemon is live");
                Some(Self { docker })
            }
            Err(err) => {
                debug!(error = %err, "docker daemon did not answer");
                None
            }
        }
    }

    async fn pull_image(&self, image: &str) -> Result<()> {
        info!(image, "pulling image");
        let options = CreateImageOptions {
            from_image: image,
            ..Default::default()
        };
        let mut stream = self.docker.create_image(Some(options), None, None);
        while let Some(progress) = stream.next().await {
            progress.with_context(|| format!("failed to pull image {image}"))?;
        }
        Ok(())
    }

    async fn create(
        &self,
        name: &str,
        image: &str,
        env: &[(String, String)],
        ports: Option<&[(u16, u16)]>,
    ) -> Result<()> {
        let env_pairs: Vec<String> = env
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect();

        let mut exposed_ports: HashMap<String, HashMap<(), ()>> = HashMap::new();
        let mut port_bindings: HashMap<String, Option<Vec<PortBinding>>> = HashMap::new();
        for (container_port, host_port) in ports.unwrap_or_default() {
            let key = format!("{container_port}/tcp");
            exposed_ports.insert(key.clone(), HashMap::new());
            port_bindings.insert(
                key,
                Some(vec![PortBinding {
                    host_ip: Some(LOOPBACK_HOST.to_string()),
                    host_port: Some(host_port.to_string()),
                }]),
            );
        }

        let config = Config {
            image: Some(image.to_string()),
            env: Some(env_pairs),
            exposed_ports: (!exposed_ports.is_empty()).then_some(exposed_ports),
            host_config: Some(HostConfig {
                port_bindings: (!port_bindings.is_empty()).then_some(port_bindings),
                ..Default::default()
            }),
            ..Default::default()
        };

        self.docker
            .create_container(
                Some(CreateContainerOptions {
                    name,
                    platform: None,
                }),
                config,
            )
            .await
            .with_context(|| format!("failed to create container {name}"))?;
        Ok(())
    }
}

#[async_trait]
impl ContainerEngine for DockerEngine {
    fn kind(&self) -> ContainerEngineKind {
        ContainerEngineKind::CrossPlatform
    }

    async fn run(
        &self,
        name: &str,
        image: &str,
        env: &[(String, String)],
        ports: Option<&[(u16, u16)]>,
    ) -> Result<String> {
        match RunAction::plan(self.inspect(name).await?.as_ref()) {
            RunAction::Reuse => {
                debug!(container = name, "already running, reusing");
            }
            RunAction::Start => {
                info!(container = name, "starting stopped container");
                self.start(name).await?;
            }
            RunAction::Create => {
                info!(container = name, image, "creating container");
                self.pull_image(image).await?;
                self.create(name, image, env, ports).await?;
                self.start(name).await?;
            }
        }
        Ok(LOOPBACK_HOST.to_string())
    }

    async fn start(&self, name: &str) -> Result<()> {
        self.docker
            .start_container(name, None::<StartContainerOptions<String>>)
            .await
            .with_context(|| format!("failed to start container {name}"))
    }

    async fn inspect(&self, name: &str) -> Result<Option<ContainerState>> {
        match self.docker.inspect_container(name, None).await {
            Ok(details) => {
                let running = details
                    .state
                    .and_then(|state| state.running)
                    .unwrap_or(false);
                Ok(Some(ContainerState {
                    running,
                    address: Some(LOOPBACK_HOST.to_string()),
                }))
            }
            Err(bollard::errors::Error::DockerResponseServerError {
                status_code: 404, ..
            }) => Ok(None),
            Err(err) => Err(err).with_context(|| format!("failed to inspect container {name}")),
        }
    }

    async fn exec(&self, name: &str, command: &[&str]) -> Result<ExecOutput> {
        let exec = self
            .docker
            .create_exec(
                name,
                CreateExecOptions {
                    cmd: Some(command.to_vec()),
                    attach_stdout: Some(true),
                    attach_stderr: Some(true),
                    ..Default::default()
                },
            )
            .await
            .with_context(|| format!("failed to create exec in {name}"))?;

        let mut collected = String::new();
        if let StartExecResults::Attached { mut output, .. } = self
            .docker
            .start_exec(&exec.id, None)
            .await
            .with_context(|| format!("failed to start exec in {name}"))?
        {
            while let Some(chunk) = output.next().await {
                if let Ok(log) = chunk {
                    collected.push_str(&log.to_string());
                }
            }
        }

        let details = self
            .docker
            .inspect_exec(&exec.id)
            .await
            .with_context(|| format!("failed to inspect exec in {name}"))?;
        let exit_code = details
            .exit_code
            .ok_or_else(|| anyhow!("exec in {name} reported no exit code"))?;

        Ok(ExecOutput {
            exit_code,
            output: collected,
        })
    }
}
