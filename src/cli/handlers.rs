//! Command handlers
//!
//! Thin orchestration over the library: resolve args, run the scan and (for
//! `up`) provisioning, render through the formatter, map failures to exit
//! codes. Provisioning errors degrade rather than abort: services that did
//! come up are still reported, and the exit code signals the partial
//! failure.

use super::commands::{ScanArgs, UpArgs};
use super::output::OutputFormatter;
use crate::config::DevstackConfig;
use crate::discovery::SourceScanner;
use crate::infra::InfraManager;
use tracing::{error, info};

pub async fn handle_scan(args: &ScanArgs) -> i32 {
    let formatter = OutputFormatter::new(args.format.into());

    let config = match DevstackConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return 2;
        }
    };

    let scanner = SourceScanner::with_max_depth(config.max_import_depth);
    match scanner.scan(&args.entrypoint) {
        Ok(result) => match formatter.format_discovery(&result) {
            Ok(rendered) => {
                println!("{rendered}");
                0
            }
            Err(err) => {
                error!("{err:#}");
                2
            }
        },
        Err(err) => {
            error!("{err}");
            1
        }
    }
}

pub async fn handle_up(args: &UpArgs) -> i32 {
    let formatter = OutputFormatter::new(args.format.into());

    let config = match DevstackConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            return 2;
        }
    };

    let scanner = SourceScanner::with_max_depth(config.max_import_depth);
    let discovery = match scanner.scan(&args.entrypoint) {
        Ok(result) => result,
        Err(err) => {
            error!("{err}");
            return 1;
        }
    };

    let kinds = discovery.required_kinds();
    info!(kinds = ?kinds, "provisioning discovered services");

    let manager = InfraManager::new(&config);
    let result = manager.provision(&kinds).await;

    if args.env_only {
        let lines = formatter.format_env_lines(&result);
        if !lines.is_empty() {
            println!("{lines}");
        }
    } else {
        match formatter.format_provision(&result) {
            Ok(rendered) => println!("{rendered}"),
            Err(err) => {
                error!("{err:#}");
                return 2;
            }
        }
    }

    if result.errors.is_empty() {
        0
    } else {
        1
    }
}
