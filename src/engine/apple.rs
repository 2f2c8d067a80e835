//! Platform-native engine: the Apple `container` CLI (macOS)
//!
//! Every operation shells out to the `container` binary. Containers get
//! their own IP on the shared network, so no port mapping is needed; `run`
//! returns the address parsed from `container inspect`.

use super::{ContainerEngine, ContainerEngineKind, ContainerState, ExecOutput, RunAction};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, info};

const CONTAINER_BIN: &str = "container";

pub struct AppleContainerEngine;

impl AppleContainerEngine {
    /// Checks whether the engine is usable: a live `system status`, or a
    /// successful `system start` if the daemon is not yet running. Only
    /// meaningful on macOS; elsewhere this always reports false.
    pub async fn available() -> bool {
        if !cfg!(target_os = "macos") {
            return false;
        }
        if run_cli(&["system", "status"]).await.is_ok() {
            return true;
        }
        debug!("container daemon not running, attempting to start it");
        match run_cli(&["system", "start"]).await {
            Ok(_) => true,
            Err(err) => {
                debug!(error = %err, "container system start failed");
                false
            }
        }
    }

    async fn address_of(&self, name: &str) -> Result<String> {
        self.inspect(name)
            .await?
            .and_then(|state| state.address)
            .ok_or_else(|| anyhow!("container {name} has no address"))
    }
}

#[async_trait]
impl ContainerEngine for AppleContainerEngine {
    fn kind(&self) -> ContainerEngineKind {
        ContainerEngineKind::PlatformNative
    }

    async fn run(
        &self,
        name: &str,
        image: &str,
        env: &[(String, String)],
        _ports: Option<&[(u16, u16)]>,
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
                let mut args: Vec<String> =
                    vec!["run".into(), "-d".into(), "--name".into(), name.into()];
                for (key, value) in env {
                    args.push("-e".into());
                    args.push(format!("{key}={value}"));
                }
                args.push(image.into());
                let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
                run_cli(&arg_refs).await?;
            }
        }
        self.address_of(name).await
    }

    async fn start(&self, name: &str) -> Result<()> {
        run_cli(&["start", name]).await.map(|_| ())
    }

    async fn inspect(&self, name: &str) -> Result<Option<ContainerState>> {
        let raw = match run_cli(&["inspect", name]).await {
            Ok(raw) => raw,
            // inspect on an unknown name exits non-zero
            Err(_) => return Ok(None),
        };
        let parsed: Value =
            serde_json::from_str(&raw).context("unparseable `container inspect` output")?;
        let entry = parsed
            .as_array()
            .and_then(|entries| entries.first())
            .ok_or_else(|| anyhow!("empty `container inspect` output for {name}"))?;

        let running = entry
            .get("status")
            .and_then(Value::as_str)
            .map(|status| status.eq_ignore_ascii_case("running"))
            .unwrap_or(false);
        let address = entry
            .get("networks")
            .and_then(Value::as_array)
            .and_then(|networks| networks.first())
            .and_then(|network| network.get("address"))
            .and_then(Value::as_str)
            // addresses come back CIDR-formed, e.g. "192.168.64.3/24"
            .map(|cidr| cidr.split('/').next().unwrap_or(cidr).to_string());

        Ok(Some(ContainerState { running, address }))
    }

    async fn exec(&self, name: &str, command: &[&str]) -> Result<ExecOutput> {
        let mut args = vec!["exec", name];
        args.extend_from_slice(command);
        let output = Command::new(CONTAINER_BIN)
            .args(&args)
            .output()
            .await
            .context("failed to invoke `container exec`")?;
        Ok(ExecOutput {
            exit_code: output.status.code().unwrap_or(-1) as i64,
            output: String::from_utf8_lossy(&output.stdout).into_owned(),
        })
    }
}

async fn run_cli(args: &[&str]) -> Result<String> {
    let output = Command::new(CONTAINER_BIN)
        .args(args)
        .output()
        .await
        .with_context(|| format!("failed to invoke `container {}`", args.join(" ")))?;
    if !output.status.success() {
        return Err(anyhow!(
            "`container {}` exited with {}: {}",
            args.join(" "),
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
