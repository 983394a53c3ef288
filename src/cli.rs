use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(author, version = env!("APP_VERSION"), about, propagate_version = true)]
pub struct Args {
    /// YAML configuration file; missing file means defaults plus environment.
    /// Falls back to `SOLTARO_CONFIG` (which may come from the env file),
    /// then `soltaro.yaml`.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// Environment file loaded before the configuration. Its values win over
    /// variables already set in the process.
    #[clap(long = "env", default_value = "soltaro.env")]
    pub env_file: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the inverters visible to the account (title and key).
    #[clap(name = "list-inverters")]
    ListInverters,

    /// Fetch one snapshot and push it to Hubitat.
    #[clap(name = "poll-once")]
    PollOnce(PollOnceArgs),

    /// Poll and push forever at the configured interval.
    #[clap(name = "daemon")]
    Daemon,
}

#[derive(Parser)]
pub struct PollOnceArgs {
    /// Print the JSON snapshot instead of a summary line.
    #[clap(long)]
    pub json: bool,

    /// Fetch only; do not send commands to Hubitat.
    #[clap(long)]
    pub no_push: bool,
}

const DEFAULT_CONFIG_FILE: &str = "soltaro.yaml";

/// Pick the configuration file once the env file has been applied
pub fn resolve_config_path(flag: Option<PathBuf>, from_env: Option<OsString>) -> PathBuf {
    flag.or_else(|| from_env.filter(|v| !v.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}
