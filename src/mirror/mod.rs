//! Repository mirroring (`clone_repo`).
//!
//! High-level flow:
//! 1. Resolve the target account and create an empty destination repository.
//! 2. `git clone --mirror` the source into a scratch directory.
//! 3. Strip hidden refs (pull-request refs) the host would refuse.
//! 4. Read the source's default branch from the mirror's HEAD.
//! 5. `git push --mirror` to the destination with the token in the URL.
//! 6. Wait for the branch to show up remotely, falling back to well-known
//!    branch names when it does not.
//! 7. Point the destination's default branch at it.
//!
//! Only steps 2 and 5 can fail the job. Everything else degrades into a
//! warning on the returned [`MirrorSummary`].

mod branch;
mod naming;
mod poll;
mod sanitize;

pub use branch::resolve_default_branch;
pub use naming::{PLACEHOLDER_NAME, derive_repo_name, validate_repo_name};
pub use poll::{RetryPolicy, Sleeper, ThreadSleeper, poll};
pub use sanitize::{Stripped, strip_hidden_refs};

#[cfg(test)]
pub(crate) use poll::tests::RecordingSleeper;

use indicatif::ProgressBar;
use serde::Serialize;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::config::MirrorSettings;
use crate::error::{OpsError, Result};
use crate::git::GitTransport;
use crate::host::{RepositoryHost, ensure_can_create};
use crate::model::{Account, Repo, Visibility};
use crate::token::Token;

/// What to mirror and where.
#[derive(Debug, Clone)]
pub struct MirrorRequest {
    pub source_url: String,
    /// Destination name; derived from `source_url` when `None`.
    pub name: Option<String>,
    pub visibility: Visibility,
}

/// Best-effort outcome of a mirror job that got its push through.
#[derive(Debug, Clone, Serialize)]
pub struct MirrorSummary {
    pub destination: String,
    pub destination_url: String,
    /// `None` only when neither the source HEAD nor any fallback branch
    /// could be determined.
    pub chosen_default_branch: Option<String>,
    pub visibility: Visibility,
    pub confirmed: bool,
    pub refs_removed: usize,
    pub warnings: Vec<String>,
}

/// State of one pipeline run. Dropping it removes the scratch directory.
struct MirrorJob {
    source_url: String,
    dest_repo: Repo,
    local_dir: TempDir,
    resolved_default_branch: Option<String>,
    branch_confirmed: bool,
}

impl MirrorJob {
    fn mirror_path(&self) -> PathBuf {
        self.local_dir.path().join("mirror.git")
    }
}

/// Sequences a mirror job against the two external capabilities.
pub struct MirrorPipeline<'a> {
    host: &'a dyn RepositoryHost,
    git: &'a dyn GitTransport,
    settings: &'a MirrorSettings,
    token: &'a Token,
    sleeper: &'a dyn Sleeper,
    progress: &'a ProgressBar,
}

impl<'a> MirrorPipeline<'a> {
    pub fn new(
        host: &'a dyn RepositoryHost,
        git: &'a dyn GitTransport,
        settings: &'a MirrorSettings,
        token: &'a Token,
        sleeper: &'a dyn Sleeper,
        progress: &'a ProgressBar,
    ) -> Self {
        MirrorPipeline {
            host,
            git,
            settings,
            token,
            sleeper,
            progress,
        }
    }

    /// Mirror `req.source_url` into a new repository owned by `target`.
    ///
    /// # Errors
    /// - [`OpsError::Validation`] for a malformed explicit name (no remote call made).
    /// - [`OpsError::Permission`] when `target` is another user's personal account.
    /// - [`OpsError::RemoteApi`] when the account lookup or repository creation fails.
    /// - [`OpsError::Transport`] when the mirror clone or push fails. A failed
    ///   clone leaves the freshly created destination in place, empty.
    pub fn run(&self, target: &str, req: &MirrorRequest) -> Result<MirrorSummary> {
        if let Some(name) = &req.name {
            validate_repo_name("name", name)?;
        }

        let (account, dest_repo) = self.provision(target, req)?;
        let local_dir = self.scratch_dir()?;
        let mut job = MirrorJob {
            source_url: req.source_url.clone(),
            dest_repo,
            local_dir,
            resolved_default_branch: None,
            branch_confirmed: false,
        };
        let mut warnings = Vec::new();
        let mirror = job.mirror_path();

        self.progress
            .set_message(format!("cloning {} (mirror)", job.source_url));
        self.git
            .mirror_clone(&job.source_url, &mirror)
            .map_err(|e| left_empty(e, &job.dest_repo))?;

        self.progress.set_message("removing hidden refs…");
        let refs_removed =
            match strip_hidden_refs(self.git, &mirror, &self.settings.hidden_ref_prefix) {
                Ok(stripped) => {
                    warnings.extend(
                        stripped
                            .failures
                            .iter()
                            .map(|f| format!("ref sanitization incomplete: {}", f)),
                    );
                    stripped.removed
                }
                Err(e) => {
                    warnings.push(format!("ref sanitization incomplete: {}", e));
                    0
                }
            };

        match resolve_default_branch(self.git, &mirror) {
            Ok(b) => job.resolved_default_branch = Some(b),
            Err(e) => warnings.push(e.to_string()),
        }

        self.progress
            .set_message(format!("pushing to {}", job.dest_repo.full_name()));
        let push_url = authenticated_url(&job.dest_repo.clone_url, self.token)?;
        self.git.mirror_push(&mirror, &push_url)?;

        let chosen = self.settle_and_verify(&account, &mut job, &mut warnings);
        let final_repo =
            self.apply_default_branch(&account, &job, chosen.as_deref(), &mut warnings);

        Ok(MirrorSummary {
            destination: final_repo.full_name(),
            destination_url: final_repo.html_url.clone(),
            chosen_default_branch: chosen,
            visibility: final_repo.visibility,
            confirmed: job.branch_confirmed,
            refs_removed,
            warnings,
        })
    }

    fn provision(&self, target: &str, req: &MirrorRequest) -> Result<(Account, Repo)> {
        self.progress
            .set_message(format!("resolving account {}", target));
        let account = self.host.find_account(target)?;
        ensure_can_create(self.host, &account)?;

        let name = match &req.name {
            Some(n) => n.clone(),
            None => derive_repo_name(&req.source_url),
        };
        self.progress
            .set_message(format!("creating {}/{}", account.login, name));
        let repo = self
            .host
            .create_repository(&account, &name, req.visibility, false)?;
        Ok((account, repo))
    }

    fn scratch_dir(&self) -> Result<TempDir> {
        let mut b = tempfile::Builder::new();
        b.prefix("ghm-mirror-");
        let dir = match &self.settings.work_dir {
            Some(parent) => b.tempdir_in(parent)?,
            None => b.tempdir()?,
        };
        Ok(dir)
    }

    /// Wait out the settle delay, then look for the resolved branch on the
    /// destination, falling back to the configured branch names.
    fn settle_and_verify(
        &self,
        account: &Account,
        job: &mut MirrorJob,
        warnings: &mut Vec<String>,
    ) -> Option<String> {
        self.progress.set_message("waiting for the host to settle…");
        self.sleeper.sleep(self.settings.settle_delay);

        match self.host.get_repository(account, &job.dest_repo.name) {
            Ok(r) => job.dest_repo = r,
            Err(e) => warnings.push(format!("could not re-fetch destination: {}", e)),
        }

        let resolved = job.resolved_default_branch.clone();
        if let Some(branch) = &resolved {
            let repo = &job.dest_repo;
            let policy = self.settings.poll;
            job.branch_confirmed = poll(
                |attempt| {
                    self.progress.set_message(format!(
                        "checking for {} ({}/{})",
                        branch, attempt, policy.max_attempts
                    ));
                    match self.host.branch_exists(repo, branch) {
                        Ok(found) => found,
                        Err(e) => {
                            warnings.push(format!("branch check for {} failed: {}", branch, e));
                            false
                        }
                    }
                },
                policy,
                self.sleeper,
            );
            if job.branch_confirmed {
                return resolved;
            }
        }

        for candidate in &self.settings.fallback_branches {
            if resolved.as_ref() == Some(candidate) {
                continue;
            }
            match self.host.branch_exists(&job.dest_repo, candidate) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    warnings.push(format!("branch check for {} failed: {}", candidate, e));
                    continue;
                }
            }
            match &resolved {
                Some(b) => warnings.push(format!(
                    "branch {} not visible on destination; using {}",
                    b, candidate
                )),
                None => warnings.push(format!("using fallback branch {}", candidate)),
            }
            job.branch_confirmed = true;
            return Some(candidate.clone());
        }

        match &resolved {
            Some(b) => warnings.push(format!(
                "could not confirm branch {} on destination; keeping it unconfirmed",
                b
            )),
            None => warnings.push("no default branch could be determined".to_string()),
        }
        resolved
    }

    /// Ask the host to switch the default branch and report what it actually
    /// did. Returns the freshest view of the destination.
    fn apply_default_branch(
        &self,
        account: &Account,
        job: &MirrorJob,
        branch: Option<&str>,
        warnings: &mut Vec<String>,
    ) -> Repo {
        let Some(branch) = branch else {
            return job.dest_repo.clone();
        };

        self.progress
            .set_message(format!("setting default branch to {}", branch));
        if let Err(e) = self.host.set_default_branch(&job.dest_repo, branch) {
            warnings.push(format!("could not set default branch to {}: {}", branch, e));
        }

        match self.host.get_repository(account, &job.dest_repo.name) {
            Ok(repo) => {
                if repo.default_branch.as_deref() != Some(branch) {
                    warnings.push(format!(
                        "host reports default branch {} instead of {}",
                        repo.default_branch.as_deref().unwrap_or("<none>"),
                        branch
                    ));
                }
                repo
            }
            Err(e) => {
                warnings.push(format!("could not verify default branch: {}", e));
                job.dest_repo.clone()
            }
        }
    }
}

/// `clone_url` with `x-access-token:<token>` as userinfo.
///
/// # Errors
/// [`OpsError::Transport`] when the URL is not http(s).
pub fn authenticated_url(clone_url: &str, token: &Token) -> Result<String> {
    let bad =
        |why: &str| OpsError::transport("git push --mirror", format!("{}: {}", why, clone_url));
    let mut url = reqwest::Url::parse(clone_url).map_err(|_| bad("invalid clone URL"))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(bad("unsupported clone URL scheme"));
    }
    url.set_username("x-access-token")
        .map_err(|_| bad("cannot embed credentials"))?;
    url.set_password(Some(token.expose()))
        .map_err(|_| bad("cannot embed credentials"))?;
    Ok(url.to_string())
}

fn left_empty(e: OpsError, dest: &Repo) -> OpsError {
    match e {
        OpsError::Transport { command, output } => OpsError::Transport {
            command,
            output: format!(
                "{}\ndestination {} was created and left empty",
                output,
                dest.full_name()
            ),
        },
        other => other,
    }
}
