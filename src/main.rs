//! # ghm
//!
//! **ghm** is an operations CLI for a GitHub-like hosting service.
//!
//! Features:
//! - `ghm run <operation> -p key=value ...` runs one operation
//! - `ghm operations` lists the operations and their parameters
//! - `ghm config-path` prints where the optional config file is read from
//!
//! Token and target account come from `--token`/`GITHUB_TOKEN` and
//! `--account`/`TARGET_ACCOUNT`.

use anyhow::Result;
use clap::{Parser, Subcommand};
use ghm::{RunOptions, cmd_config_path, cmd_operations, cmd_run, parse_key_value};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "ghm",
    version,
    about = "ghm - repository operations and mirroring for GitHub-like hosts",
    arg_required_else_help = true
)]
struct Cli {
    /// Bearer token for the hosting service
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Account (user or organization) the operation acts on
    #[arg(long, env = "TARGET_ACCOUNT", global = true)]
    account: Option<String>,

    /// Config file (default: $XDG_CONFIG_HOME/.ghm/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print results and errors as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Run an operation
    Run {
        /// Operation name (see `ghm operations`)
        #[arg(env = "OPERATION")]
        operation: String,

        /// Operation parameter, repeatable
        #[arg(
            short = 'p',
            long = "param",
            value_name = "KEY=VALUE",
            value_parser = parse_key_value
        )]
        params: Vec<(String, String)>,
    },
    /// List supported operations
    Operations,
    /// Print the default config file path
    ConfigPath,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let Some(cmd) = cli.cmd else {
        return Ok(ExitCode::FAILURE);
    };

    match cmd {
        Cmd::Run { operation, params } => cmd_run(RunOptions {
            operation,
            params,
            token: cli.token,
            account: cli.account,
            config: cli.config,
            json: cli.json,
        }),
        Cmd::Operations => cmd_operations().map(|_| ExitCode::SUCCESS),
        Cmd::ConfigPath => cmd_config_path().map(|_| ExitCode::SUCCESS),
    }
}
