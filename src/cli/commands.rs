use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Detects backing-service needs from source and provisions local containers
#[derive(Parser, Debug)]
#[command(
    name = "devstack",
    about = "Detects backing-service needs from source and provisions local containers",
    version,
    long_about = "devstack scans an application's entry file and its local import graph for \
                  SDK constructs, infers which backing services the app needs (Postgres, \
                  Redis), provisions them as named containers on whichever container engine \
                  is available, and emits the connection variables to inject into the app's \
                  environment."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(short = 'v', long, global = true, help = "Increase verbosity")]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Scan an entrypoint's import graph for infrastructure needs",
        long_about = "Walks the local import graph from the entry file, reporting every \
                      recognized SDK construct and the backing services they imply.\n\n\
                      Examples:\n  \
                      devstack scan src/index.ts\n  \
                      devstack scan src/index.ts --format json"
    )]
    Scan(ScanArgs),

    #[command(
        about = "Scan, then provision the discovered services as containers",
        long_about = "Runs discovery, then provisions each discovered service kind as a \
                      named local container (or honors an existing connection override), \
                      printing the env vars to inject into the application.\n\n\
                      Examples:\n  \
                      devstack up src/index.ts\n  \
                      devstack up src/index.ts --env-only >> .env"
    )]
    Up(UpArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct ScanArgs {
    #[arg(value_name = "ENTRYPOINT", help = "Entry source file the scan starts from")]
    pub entrypoint: PathBuf,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(Parser, Debug, Clone)]
pub struct UpArgs {
    #[arg(value_name = "ENTRYPOINT", help = "Entry source file the scan starts from")]
    pub entrypoint: PathBuf,

    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,

    #[arg(long, help = "Print only KEY=value lines (for .env files or eval)")]
    pub env_only: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Json,
    Human,
}

impl From<OutputFormatArg> for super::output::OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Json => super::output::OutputFormat::Json,
            OutputFormatArg::Human => super::output::OutputFormat::Human,
        }
    }
}
