use anyhow::{Context, Result};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::config::load_settings;
use crate::dispatch::{Dispatcher, OPERATIONS, Outcome, Params};
use crate::error::{ErrorReport, OpsError};
use crate::git::SystemGit;
use crate::host::GithubHost;
use crate::paths::paths;
use crate::progress::{finish_err, finish_ok, operation_spinner};
use crate::report::{print_error, print_outcome};
use crate::token::Token;

/// Everything `ghm run` needs, already pulled from flags and environment.
#[derive(Debug, Default)]
pub struct RunOptions {
    pub operation: String,
    pub params: Vec<(String, String)>,
    pub token: Option<String>,
    pub account: Option<String>,
    pub config: Option<PathBuf>,
    pub json: bool,
}

/// CLI command: run one operation against the hosting service.
///
/// The host client and git transport are built once here and handed to the
/// dispatcher. The result goes to stdout (colored text or JSON); failures
/// are reported and turned into exit status 1.
///
/// # Errors
/// - The config file cannot be loaded or is invalid.
/// - The HTTP client cannot be built.
pub fn cmd_run(opts: RunOptions) -> Result<ExitCode> {
    let settings = load_settings(opts.config.as_deref())?;
    let params: Params = opts.params.into_iter().collect();

    let Some(raw_token) = opts.token.filter(|t| !t.trim().is_empty()) else {
        return Ok(report_failure(&OpsError::missing("token"), opts.json, None));
    };
    let token = Token::new(raw_token.trim());

    let host = GithubHost::new(&settings.api_url, &settings.user_agent, &token)
        .context("failed to build HTTP client")?;
    let git = SystemGit::default();
    let target = opts.account.unwrap_or_default();

    let pb = operation_spinner(&opts.operation, opts.json);
    let dispatcher =
        Dispatcher::new(&host, &git, &settings, &token, target).with_progress(pb.clone());

    match dispatcher.dispatch(&opts.operation, &params) {
        Ok(outcome) => {
            finish_ok(&pb, outcome.headline());
            report_success(&outcome, opts.json)?;
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            finish_err(&pb, format!("{} failed", opts.operation));
            Ok(report_failure(&e, opts.json, Some(&token)))
        }
    }
}

fn report_success(outcome: &Outcome, json: bool) -> Result<()> {
    if json {
        let txt = serde_json::to_string_pretty(outcome).context("failed to encode result")?;
        println!("{}", txt);
    } else {
        print_outcome(outcome);
    }
    Ok(())
}

/// Errors can quote remote responses and git output; the token is masked
/// before anything is printed.
fn report_failure(err: &OpsError, json: bool, token: Option<&Token>) -> ExitCode {
    let mut report = ErrorReport::from(err);
    if let Some(t) = token {
        report.message = t.redact(&report.message);
    }
    if json {
        println!("{}", serde_json::json!({ "error": report }));
    } else {
        print_error(&report);
    }
    ExitCode::FAILURE
}

/// CLI command: print the operation table.
///
/// Example output:
/// ```text
/// rename_repo              name new_name
///     Rename a repository
/// ```
pub fn cmd_operations() -> Result<()> {
    for op in OPERATIONS {
        let mut args: Vec<String> = op.required.iter().map(|p| p.to_string()).collect();
        args.extend(op.optional.iter().map(|p| format!("[{}]", p)));
        println!("{:<24} {}", op.name, args.join(" "));
        println!("    {}", op.about);
    }
    Ok(())
}

/// CLI command: print the default config file location.
pub fn cmd_config_path() -> Result<()> {
    println!("{}", paths().config.display());
    Ok(())
}
