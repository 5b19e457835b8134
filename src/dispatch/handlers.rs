//! Operation handlers. Each one parses its typed parameters first, so a
//! malformed value fails before the first remote call.

use sha2::{Digest, Sha256};

use super::outcome::{Outcome, UploadedAsset};
use super::{Context, Params};
use crate::error::{OpsError, Result};
use crate::host::ensure_can_create;
use crate::mirror::{MirrorPipeline, MirrorRequest, validate_repo_name};
use crate::model::{Account, Repo, RunStatus};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

fn target_account(ctx: &Context<'_>) -> Result<Account> {
    ctx.progress
        .set_message(format!("resolving account {}", ctx.target));
    ctx.host.find_account(ctx.target)
}

/// Existing repository `name` under the target account. The name is checked
/// before any remote call so it cannot address another owner's repository.
fn target_repo(ctx: &Context<'_>, name: &str) -> Result<Repo> {
    validate_repo_name("name", name)?;
    let account = target_account(ctx)?;
    ctx.progress
        .set_message(format!("fetching {}/{}", account.login, name));
    ctx.host.get_repository(&account, name)
}

pub(super) fn list_repos(ctx: &Context<'_>, _params: &Params) -> Result<Outcome> {
    let account = target_account(ctx)?;
    ctx.progress
        .set_message(format!("listing repositories of {}", account.login));
    let repos = ctx.host.list_repositories(&account)?;
    Ok(Outcome::Listed {
        account: account.login,
        repos,
    })
}

pub(super) fn create_repo(ctx: &Context<'_>, params: &Params) -> Result<Outcome> {
    let name = params.require("name")?;
    validate_repo_name("name", name)?;
    let visibility = params.visibility("visibility", ctx.settings.default_visibility)?;

    let account = target_account(ctx)?;
    ensure_can_create(ctx.host, &account)?;
    ctx.progress
        .set_message(format!("creating {}/{}", account.login, name));
    let repo = ctx
        .host
        .create_repository(&account, name, visibility, true)?;
    Ok(Outcome::Created { repo })
}

pub(super) fn delete_repo(ctx: &Context<'_>, params: &Params) -> Result<Outcome> {
    let repo = target_repo(ctx, params.require("name")?)?;
    ctx.progress
        .set_message(format!("deleting {}", repo.full_name()));
    ctx.host.delete_repository(&repo)?;
    Ok(Outcome::Deleted {
        repo: repo.full_name(),
    })
}

pub(super) fn toggle_visibility(ctx: &Context<'_>, params: &Params) -> Result<Outcome> {
    let repo = target_repo(ctx, params.require("name")?)?;
    let next = repo.visibility.toggled();
    ctx.progress
        .set_message(format!("making {} {}", repo.full_name(), next));
    let repo = ctx.host.set_visibility(&repo, next)?;
    Ok(Outcome::VisibilityToggled { repo })
}

pub(super) fn rename_repo(ctx: &Context<'_>, params: &Params) -> Result<Outcome> {
    let name = params.require("name")?;
    let new_name = params.require("new_name")?;
    validate_repo_name("new_name", new_name)?;

    let repo = target_repo(ctx, name)?;
    let from = repo.full_name();
    ctx.progress
        .set_message(format!("renaming {} to {}", from, new_name));
    let repo = ctx.host.rename_repository(&repo, new_name)?;
    Ok(Outcome::Renamed { from, repo })
}

pub(super) fn create_release(ctx: &Context<'_>, params: &Params) -> Result<Outcome> {
    let name = params.require("name")?;
    let tag = params.require("tag")?;
    let title = params.require("title")?;
    let body = params.get("body").unwrap_or("");
    let asset = match params.get("asset_url") {
        Some(url) => Some((url, asset_name(url)?)),
        None => None,
    };

    let repo = target_repo(ctx, name)?;
    ctx.progress
        .set_message(format!("creating release {} in {}", tag, repo.full_name()));
    let release = ctx.host.create_release(&repo, tag, title, body)?;

    let Some((url, asset_name)) = asset else {
        return Ok(Outcome::Released {
            release,
            asset: None,
        });
    };

    ctx.progress.set_message(format!("downloading {}", url));
    let download = ctx.host.fetch_asset(url)?;
    let content_type = download
        .content_type
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
    let sha256 = hex::encode(Sha256::digest(&download.bytes));

    ctx.progress
        .set_message(format!("uploading {} ({} bytes)", asset_name, download.bytes.len()));
    let uploaded =
        ctx.host
            .upload_release_asset(&release, download.bytes, &asset_name, &content_type)?;

    Ok(Outcome::Released {
        release,
        asset: Some(UploadedAsset {
            name: uploaded.name,
            size: uploaded.size,
            content_type,
            sha256,
            download_url: uploaded.download_url,
        }),
    })
}

/// Last non-empty path segment of an http(s) URL.
fn asset_name(url: &str) -> Result<String> {
    let invalid = |msg: &str| OpsError::validation("asset_url", format!("{}: {}", msg, url));
    let parsed = reqwest::Url::parse(url).map_err(|_| invalid("not a valid URL"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid("only http(s) URLs are supported"));
    }
    parsed
        .path_segments()
        .and_then(|mut segs| segs.rfind(|s| !s.is_empty()))
        .map(|s| s.to_string())
        .ok_or_else(|| invalid("URL has no file name"))
}

pub(super) fn set_actions_permissions(ctx: &Context<'_>, params: &Params) -> Result<Outcome> {
    let name = params.require("name")?;
    let enabled = params.flag("enabled")?;

    let repo = target_repo(ctx, name)?;
    ctx.progress.set_message(format!(
        "{} actions for {}",
        if enabled { "enabling" } else { "disabling" },
        repo.full_name()
    ));
    ctx.host.set_actions_enabled(&repo, enabled)?;
    Ok(Outcome::ActionsPermissions {
        repo: repo.full_name(),
        enabled,
    })
}

pub(super) fn run_workflow(ctx: &Context<'_>, params: &Params) -> Result<Outcome> {
    let repo = target_repo(ctx, params.require("name")?)?;
    let git_ref = match params.get("ref") {
        Some(r) => r.to_string(),
        None => repo.default_branch.clone().ok_or_else(|| {
            OpsError::validation("ref", "repository has no default branch; pass ref explicitly")
        })?,
    };

    ctx.progress
        .set_message(format!("listing workflows of {}", repo.full_name()));
    let workflows = ctx.host.list_workflows(&repo)?;
    let mut dispatched = Vec::with_capacity(workflows.len());
    for wf in &workflows {
        ctx.progress
            .set_message(format!("dispatching {} on {}", wf.name, git_ref));
        ctx.host.enable_workflow(wf)?;
        ctx.host.dispatch_workflow(wf, &git_ref)?;
        dispatched.push(wf.name.clone());
    }

    Ok(Outcome::WorkflowsDispatched {
        repo: repo.full_name(),
        git_ref,
        workflows: dispatched,
    })
}

pub(super) fn cancel_workflows(ctx: &Context<'_>, params: &Params) -> Result<Outcome> {
    let repo = target_repo(ctx, params.require("name")?)?;

    let mut runs = Vec::new();
    for status in [RunStatus::Queued, RunStatus::InProgress] {
        ctx.progress.set_message(format!(
            "listing {} runs of {}",
            status.as_str(),
            repo.full_name()
        ));
        runs.extend(ctx.host.list_workflow_runs(&repo, status)?);
    }

    let mut cancelled = Vec::new();
    let mut failures = Vec::new();
    for run in &runs {
        ctx.progress.set_message(format!("cancelling run {}", run.id));
        match ctx.host.cancel_run(run) {
            Ok(()) => cancelled.push(run.id),
            Err(e) => failures.push(format!("run {}: {}", run.id, e)),
        }
    }

    Ok(Outcome::RunsCancelled {
        repo: repo.full_name(),
        cancelled,
        failures,
    })
}

pub(super) fn clone_repo(ctx: &Context<'_>, params: &Params) -> Result<Outcome> {
    let req = MirrorRequest {
        source_url: params.require("source_url")?.to_string(),
        name: params.get("name").map(|n| n.to_string()),
        visibility: params.visibility("visibility", ctx.settings.default_visibility)?,
    };
    let pipeline = MirrorPipeline::new(
        ctx.host,
        ctx.git,
        &ctx.settings.mirror,
        ctx.token,
        ctx.sleeper,
        ctx.progress,
    );
    Ok(Outcome::Mirrored(pipeline.run(ctx.target, &req)?))
}
