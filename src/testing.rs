//! Recording fakes of the two external capabilities.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{OpsError, Result};
use crate::git::GitTransport;
use crate::host::RepositoryHost;
use crate::model::{
    Account, Download, Release, ReleaseAsset, Repo, RunStatus, Visibility, Workflow, WorkflowRun,
};

pub fn repo(owner: &str, name: &str, visibility: Visibility, default_branch: Option<&str>) -> Repo {
    Repo {
        owner: owner.to_string(),
        name: name.to_string(),
        visibility,
        default_branch: default_branch.map(|s| s.to_string()),
        clone_url: format!("https://github.example/{}/{}.git", owner, name),
        html_url: format!("https://github.example/{}/{}", owner, name),
    }
}

fn boom(call: &str) -> OpsError {
    OpsError::RemoteApi {
        status: Some(500),
        message: format!("{} exploded", call),
    }
}

pub struct FakeHost {
    pub login: String,
    pub accounts: HashMap<String, Account>,
    pub repos: RefCell<BTreeMap<(String, String), Repo>>,
    /// Scripted `branch_exists` answers per branch; `false` once exhausted.
    pub branch_answers: RefCell<HashMap<String, VecDeque<bool>>>,
    /// Calls that fail with a 500.
    pub failing: HashSet<&'static str>,
    /// When set, `set_default_branch` succeeds but changes nothing.
    pub ignore_default_branch: bool,
    pub workflows: Vec<Workflow>,
    pub runs: HashMap<&'static str, Vec<WorkflowRun>>,
    pub failing_runs: HashSet<u64>,
    pub asset: Option<Download>,
    pub uploads: RefCell<Vec<(String, String, usize)>>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeHost {
    pub fn new(login: &str) -> Self {
        let mut accounts = HashMap::new();
        accounts.insert(login.to_string(), Account::user(login));
        FakeHost {
            login: login.to_string(),
            accounts,
            repos: RefCell::new(BTreeMap::new()),
            branch_answers: RefCell::new(HashMap::new()),
            failing: HashSet::new(),
            ignore_default_branch: false,
            workflows: Vec::new(),
            runs: HashMap::new(),
            failing_runs: HashSet::new(),
            asset: None,
            uploads: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn with_org(mut self, org: &str) -> Self {
        self.accounts.insert(org.to_string(), Account::organization(org));
        self
    }

    pub fn with_user(mut self, user: &str) -> Self {
        self.accounts.insert(user.to_string(), Account::user(user));
        self
    }

    pub fn with_repo(self, r: Repo) -> Self {
        self.repos
            .borrow_mut()
            .insert((r.owner.clone(), r.name.clone()), r);
        self
    }

    pub fn failing(mut self, call: &'static str) -> Self {
        self.failing.insert(call);
        self
    }

    pub fn answer_branch(&self, branch: &str, answers: &[bool]) {
        self.branch_answers
            .borrow_mut()
            .insert(branch.to_string(), answers.iter().copied().collect());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls
            .borrow()
            .iter()
            .filter(|c| c.split(' ').next() == Some(call))
            .count()
    }

    pub fn stored(&self, owner: &str, name: &str) -> Option<Repo> {
        self.repos
            .borrow()
            .get(&(owner.to_string(), name.to_string()))
            .cloned()
    }

    fn record(&self, call: &'static str, detail: String) -> Result<()> {
        self.calls.borrow_mut().push(format!("{} {}", call, detail));
        if self.failing.contains(call) {
            return Err(boom(call));
        }
        Ok(())
    }

    fn lookup(&self, owner: &str, name: &str) -> Result<Repo> {
        self.stored(owner, name).ok_or_else(|| OpsError::RemoteApi {
            status: Some(404),
            message: "Not Found".to_string(),
        })
    }

    fn update(&self, repo: &Repo, f: impl FnOnce(&mut Repo)) -> Result<Repo> {
        let mut repos = self.repos.borrow_mut();
        let key = (repo.owner.clone(), repo.name.clone());
        let mut current = repos.remove(&key).ok_or_else(|| OpsError::RemoteApi {
            status: Some(404),
            message: "Not Found".to_string(),
        })?;
        f(&mut current);
        repos.insert((current.owner.clone(), current.name.clone()), current.clone());
        Ok(current)
    }
}

impl RepositoryHost for FakeHost {
    fn authenticated_login(&self) -> Result<String> {
        self.record("authenticated_login", String::new())?;
        Ok(self.login.clone())
    }

    fn find_account(&self, name: &str) -> Result<Account> {
        self.record("find_account", name.to_string())?;
        self.accounts
            .get(name)
            .cloned()
            .ok_or_else(|| OpsError::RemoteApi {
                status: Some(404),
                message: "Not Found".to_string(),
            })
    }

    fn list_repositories(&self, account: &Account) -> Result<Vec<Repo>> {
        self.record("list_repositories", account.login.clone())?;
        Ok(self
            .repos
            .borrow()
            .values()
            .filter(|r| r.owner == account.login)
            .cloned()
            .collect())
    }

    fn create_repository(
        &self,
        account: &Account,
        name: &str,
        visibility: Visibility,
        auto_init: bool,
    ) -> Result<Repo> {
        self.record(
            "create_repository",
            format!("{}/{} {} auto_init={}", account.login, name, visibility, auto_init),
        )?;
        let key = (account.login.clone(), name.to_string());
        if self.repos.borrow().contains_key(&key) {
            return Err(OpsError::RemoteApi {
                status: Some(422),
                message: "name already exists on this account".to_string(),
            });
        }
        let default_branch = if auto_init { Some("main") } else { None };
        let r = repo(&account.login, name, visibility, default_branch);
        self.repos.borrow_mut().insert(key, r.clone());
        Ok(r)
    }

    fn get_repository(&self, account: &Account, name: &str) -> Result<Repo> {
        self.record("get_repository", format!("{}/{}", account.login, name))?;
        self.lookup(&account.login, name)
    }

    fn delete_repository(&self, r: &Repo) -> Result<()> {
        self.record("delete_repository", r.full_name())?;
        self.repos
            .borrow_mut()
            .remove(&(r.owner.clone(), r.name.clone()));
        Ok(())
    }

    fn set_visibility(&self, r: &Repo, visibility: Visibility) -> Result<Repo> {
        self.record("set_visibility", format!("{} {}", r.full_name(), visibility))?;
        self.update(r, |cur| cur.visibility = visibility)
    }

    fn rename_repository(&self, r: &Repo, new_name: &str) -> Result<Repo> {
        self.record("rename_repository", format!("{} {}", r.full_name(), new_name))?;
        let owner = r.owner.clone();
        let new = new_name.to_string();
        self.update(r, move |cur| {
            cur.name = new.clone();
            cur.clone_url = format!("https://github.example/{}/{}.git", owner, new);
            cur.html_url = format!("https://github.example/{}/{}", owner, new);
        })
    }

    fn set_default_branch(&self, r: &Repo, branch: &str) -> Result<Repo> {
        self.record("set_default_branch", format!("{} {}", r.full_name(), branch))?;
        if self.ignore_default_branch {
            return self.lookup(&r.owner, &r.name);
        }
        let b = branch.to_string();
        self.update(r, move |cur| cur.default_branch = Some(b))
    }

    fn branch_exists(&self, r: &Repo, branch: &str) -> Result<bool> {
        self.record("branch_exists", format!("{} {}", r.full_name(), branch))?;
        let mut answers = self.branch_answers.borrow_mut();
        Ok(answers
            .get_mut(branch)
            .and_then(|q| q.pop_front())
            .unwrap_or(false))
    }

    fn create_release(&self, r: &Repo, tag: &str, title: &str, body: &str) -> Result<Release> {
        self.record(
            "create_release",
            format!("{} {} {} {}", r.full_name(), tag, title, body),
        )?;
        Ok(Release {
            id: 1,
            owner: r.owner.clone(),
            repo: r.name.clone(),
            tag: tag.to_string(),
            title: title.to_string(),
            html_url: format!("{}/releases/tag/{}", r.html_url, tag),
            upload_url: "https://uploads.github.example/assets{?name,label}".to_string(),
        })
    }

    fn upload_release_asset(
        &self,
        release: &Release,
        bytes: Vec<u8>,
        name: &str,
        content_type: &str,
    ) -> Result<ReleaseAsset> {
        self.record("upload_release_asset", format!("{} {}", release.tag, name))?;
        self.uploads
            .borrow_mut()
            .push((name.to_string(), content_type.to_string(), bytes.len()));
        Ok(ReleaseAsset {
            name: name.to_string(),
            size: bytes.len() as u64,
            download_url: format!("https://github.example/download/{}", name),
        })
    }

    fn fetch_asset(&self, url: &str) -> Result<Download> {
        self.record("fetch_asset", url.to_string())?;
        self.asset.clone().ok_or_else(|| OpsError::RemoteApi {
            status: Some(404),
            message: "Not Found".to_string(),
        })
    }

    fn set_actions_enabled(&self, r: &Repo, enabled: bool) -> Result<()> {
        self.record("set_actions_enabled", format!("{} {}", r.full_name(), enabled))
    }

    fn list_workflows(&self, r: &Repo) -> Result<Vec<Workflow>> {
        self.record("list_workflows", r.full_name())?;
        Ok(self.workflows.clone())
    }

    fn enable_workflow(&self, w: &Workflow) -> Result<()> {
        self.record("enable_workflow", w.id.to_string())
    }

    fn dispatch_workflow(&self, w: &Workflow, git_ref: &str) -> Result<()> {
        self.record("dispatch_workflow", format!("{} {}", w.id, git_ref))
    }

    fn list_workflow_runs(&self, r: &Repo, status: RunStatus) -> Result<Vec<WorkflowRun>> {
        self.record(
            "list_workflow_runs",
            format!("{} {}", r.full_name(), status.as_str()),
        )?;
        Ok(self.runs.get(status.as_str()).cloned().unwrap_or_default())
    }

    fn cancel_run(&self, run: &WorkflowRun) -> Result<()> {
        self.record("cancel_run", run.id.to_string())?;
        if self.failing_runs.contains(&run.id) {
            return Err(OpsError::RemoteApi {
                status: Some(409),
                message: "Cannot cancel a workflow run that is completed.".to_string(),
            });
        }
        Ok(())
    }
}

/// In-memory [`GitTransport`]. `mirror_clone` records and creates the
/// destination directory so tests can check it gets cleaned up.
pub struct FakeGit {
    pub head: Option<String>,
    pub refs: RefCell<Vec<String>>,
    pub fail_clone: bool,
    pub fail_push: bool,
    pub fail_list_refs: bool,
    pub fail_delete: Option<String>,
    pub cloned_into: RefCell<Vec<PathBuf>>,
    pub pushed_to: RefCell<Vec<String>>,
    pub calls: RefCell<Vec<String>>,
}

impl FakeGit {
    pub fn new(head: Option<&str>, refs: &[&str]) -> Self {
        FakeGit {
            head: head.map(|h| h.to_string()),
            refs: RefCell::new(refs.iter().map(|r| r.to_string()).collect()),
            fail_clone: false,
            fail_push: false,
            fail_list_refs: false,
            fail_delete: None,
            cloned_into: RefCell::new(Vec::new()),
            pushed_to: RefCell::new(Vec::new()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl GitTransport for FakeGit {
    fn mirror_clone(&self, url: &str, dest: &Path) -> Result<()> {
        self.calls.borrow_mut().push(format!("mirror_clone {}", url));
        self.cloned_into.borrow_mut().push(dest.to_path_buf());
        if self.fail_clone {
            return Err(OpsError::transport(
                "git clone --mirror",
                "fatal: repository not found",
            ));
        }
        fs::create_dir_all(dest)?;
        fs::write(dest.join("HEAD"), "ref: refs/heads/main\n")?;
        Ok(())
    }

    fn list_refs(&self, _dir: &Path, prefix: &str) -> Result<Vec<String>> {
        self.calls.borrow_mut().push(format!("list_refs {}", prefix));
        if self.fail_list_refs {
            return Err(OpsError::transport("libgit2", "corrupt packed-refs"));
        }
        Ok(self
            .refs
            .borrow()
            .iter()
            .filter(|r| r.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn delete_ref(&self, _dir: &Path, name: &str) -> Result<()> {
        self.calls.borrow_mut().push(format!("delete_ref {}", name));
        if self.fail_delete.as_deref() == Some(name) {
            return Err(OpsError::transport("libgit2", "cannot lock ref"));
        }
        self.refs.borrow_mut().retain(|r| r != name);
        Ok(())
    }

    fn symbolic_ref(&self, _dir: &Path, name: &str) -> Result<Option<String>> {
        self.calls.borrow_mut().push(format!("symbolic_ref {}", name));
        Ok(self.head.clone())
    }

    fn mirror_push(&self, _dir: &Path, url: &str) -> Result<()> {
        self.calls.borrow_mut().push("mirror_push".to_string());
        if self.fail_push {
            return Err(OpsError::transport(
                "git push --mirror",
                "! [remote rejected] refs/pull/1/head (deny updating a hidden ref)",
            ));
        }
        self.pushed_to.borrow_mut().push(url.to_string());
        Ok(())
    }
}
