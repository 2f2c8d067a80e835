//! Output formatting for scan and provisioning results

use crate::discovery::DiscoveryResult;
use crate::infra::ProvisionResult;
use anyhow::{Context, Result};

/// Output format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// JSON (machine-readable)
    Json,
    /// Human-readable formatted text
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_discovery(&self, result: &DiscoveryResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(result)
                .context("failed to serialize discovery result to JSON"),
            OutputFormat::Human => Ok(self.format_discovery_human(result)),
        }
    }

    pub fn format_provision(&self, result: &ProvisionResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(result)
                .context("failed to serialize provision result to JSON"),
            OutputFormat::Human => Ok(self.format_provision_human(result)),
        }
    }

    /// `KEY=value` lines only, for `.env` files or shell eval
    pub fn format_env_lines(&self, result: &ProvisionResult) -> String {
        result
            .env
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn format_discovery_human(&self, result: &DiscoveryResult) -> String {
        let mut out = String::new();
        out.push_str(&format!("Entrypoint: {}\n", result.entrypoint));
        out.push_str(&format!(
            "Analyzed {} file(s) in {}ms\n",
            result.analyzed_files.len(),
            result.elapsed_ms
        ));

        if result.primitives.is_empty() {
            out.push_str("\nNo SDK constructs found.\n");
        } else {
            out.push_str("\nConstructs:\n");
            for primitive in &result.primitives {
                out.push_str(&format!(
                    "  {} at {}:{}\n",
                    primitive.construct, primitive.file, primitive.line
                ));
            }
        }

        if result.infrastructure.is_empty() {
            out.push_str("\nNo backing services required.\n");
        } else {
            out.push_str("\nRequired services:\n");
            for req in &result.infrastructure {
                let requested_by: Vec<&str> =
                    req.requested_by.iter().map(String::as_str).collect();
                out.push_str(&format!(
                    "  {} (requested by: {})\n",
                    req.kind,
                    requested_by.join(", ")
                ));
                for reason in &req.reasons {
                    out.push_str(&format!("    - {reason}\n"));
                }
            }
        }
        out
    }

    fn format_provision_human(&self, result: &ProvisionResult) -> String {
        let mut out = String::new();

        if result.services.is_empty() {
            out.push_str("No services provisioned.\n");
        } else {
            out.push_str("Services:\n");
            for service in &result.services {
                let runtime = service
                    .runtime
                    .map(|kind| kind.to_string())
                    .unwrap_or_else(|| "external".to_string());
                out.push_str(&format!(
                    "  {} -> {} ({}, via {})\n",
                    service.kind, service.url, service.host, runtime
                ));
            }
        }

        if !result.env.is_empty() {
            out.push_str("\nEnvironment:\n");
            for (key, value) in &result.env {
                out.push_str(&format!("  {key}={value}\n"));
            }
        }

        if !result.errors.is_empty() {
            out.push_str("\nErrors:\n");
            for error in &result.errors {
                out.push_str(&format!("  {error}\n"));
            }
        }
        out
    }
}
