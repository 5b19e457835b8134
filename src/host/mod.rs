//! Hosting-service integration layer.
//!
//! Everything that talks to the remote REST API goes through the
//! [`RepositoryHost`] trait so the dispatcher and the mirror pipeline can be
//! driven against a fake in tests. [`GithubHost`] is the real implementation.

mod github;

pub use github::GithubHost;

use crate::error::{OpsError, Result};
use crate::model::{
    Account, Download, Release, ReleaseAsset, Repo, RunStatus, Visibility, Workflow, WorkflowRun,
};

/// Remote repository-hosting capability.
///
/// Writes are fire-and-confirm: a successful response is authoritative, but
/// new branches and default-branch changes may take a while to show up on
/// subsequent reads.
pub trait RepositoryHost {
    /// Login of the identity the bearer token belongs to.
    fn authenticated_login(&self) -> Result<String>;

    /// Resolve an owner name, trying an organization first and a user second.
    fn find_account(&self, name: &str) -> Result<Account>;

    fn list_repositories(&self, account: &Account) -> Result<Vec<Repo>>;

    fn create_repository(
        &self,
        account: &Account,
        name: &str,
        visibility: Visibility,
        auto_init: bool,
    ) -> Result<Repo>;

    fn get_repository(&self, account: &Account, name: &str) -> Result<Repo>;

    fn delete_repository(&self, repo: &Repo) -> Result<()>;

    fn set_visibility(&self, repo: &Repo, visibility: Visibility) -> Result<Repo>;

    fn rename_repository(&self, repo: &Repo, new_name: &str) -> Result<Repo>;

    fn set_default_branch(&self, repo: &Repo, branch: &str) -> Result<Repo>;

    /// Whether `branch` is currently visible on the remote.
    fn branch_exists(&self, repo: &Repo, branch: &str) -> Result<bool>;

    fn create_release(&self, repo: &Repo, tag: &str, title: &str, body: &str) -> Result<Release>;

    fn upload_release_asset(
        &self,
        release: &Release,
        bytes: Vec<u8>,
        name: &str,
        content_type: &str,
    ) -> Result<ReleaseAsset>;

    /// Download an arbitrary URL (used for release assets).
    fn fetch_asset(&self, url: &str) -> Result<Download>;

    fn set_actions_enabled(&self, repo: &Repo, enabled: bool) -> Result<()>;

    fn list_workflows(&self, repo: &Repo) -> Result<Vec<Workflow>>;

    fn enable_workflow(&self, workflow: &Workflow) -> Result<()>;

    fn dispatch_workflow(&self, workflow: &Workflow, git_ref: &str) -> Result<()>;

    fn list_workflow_runs(&self, repo: &Repo, status: RunStatus) -> Result<Vec<WorkflowRun>>;

    fn cancel_run(&self, run: &WorkflowRun) -> Result<()>;
}

/// Repositories can only be created under an organization or under the
/// authenticated user's own account.
///
/// # Errors
/// [`OpsError::Permission`] when `account` is a different user.
pub fn ensure_can_create(host: &dyn RepositoryHost, account: &Account) -> Result<()> {
    if !account.is_user() {
        return Ok(());
    }
    let me = host.authenticated_login()?;
    if me.eq_ignore_ascii_case(&account.login) {
        Ok(())
    } else {
        Err(OpsError::Permission(format!(
            "cannot create repositories under user {} while authenticated as {}",
            account.login, me
        )))
    }
}
