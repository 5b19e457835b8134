use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Method, StatusCode, Url};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::cell::RefCell;

use super::RepositoryHost;
use crate::error::{OpsError, Result};
use crate::model::{
    Account, AccountKind, Download, Release, ReleaseAsset, Repo, RunStatus, Visibility, Workflow,
    WorkflowRun,
};
use crate::token::Token;

const PER_PAGE: usize = 100;
const API_VERSION: &str = "2022-11-28";

/// [`RepositoryHost`] backed by the GitHub REST API (blocking client).
pub struct GithubHost {
    api: Url,
    client: Client,
    /// Client without the bearer token, for downloads from arbitrary URLs.
    plain: Client,
    login: RefCell<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ApiAccount {
    login: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ApiOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ApiRepo {
    name: String,
    owner: ApiOwner,
    private: bool,
    #[serde(default)]
    default_branch: Option<String>,
    clone_url: String,
    html_url: String,
}

impl From<ApiRepo> for Repo {
    fn from(r: ApiRepo) -> Self {
        Repo {
            owner: r.owner.login,
            name: r.name,
            visibility: Visibility::from_private(r.private),
            default_branch: r.default_branch.filter(|b| !b.is_empty()),
            clone_url: r.clone_url,
            html_url: r.html_url,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiRelease {
    id: u64,
    tag_name: String,
    #[serde(default)]
    name: Option<String>,
    html_url: String,
    upload_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiAsset {
    name: String,
    size: u64,
    browser_download_url: String,
}

#[derive(Debug, Deserialize)]
struct ApiWorkflow {
    id: u64,
    name: String,
    path: String,
    state: String,
}

#[derive(Debug, Deserialize)]
struct WorkflowList {
    workflows: Vec<ApiWorkflow>,
}

#[derive(Debug, Deserialize)]
struct ApiRun {
    id: u64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunList {
    workflow_runs: Vec<ApiRun>,
}

impl GithubHost {
    /// Build a client against `api_url` (e.g. `https://api.github.com`).
    ///
    /// # Errors
    /// Returns an error if the token cannot be used as a header value or the
    /// HTTP client fails to build.
    pub fn new(api_url: &str, user_agent: &str, token: &Token) -> Result<Self> {
        let api = Url::parse(api_url)
            .ok()
            .filter(|u| !u.cannot_be_a_base())
            .ok_or_else(|| {
                OpsError::validation("api_url", format!("not a base URL: {}", api_url))
            })?;
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        let ua = HeaderValue::from_str(user_agent)
            .map_err(|e| OpsError::validation("user_agent", e.to_string()))?;
        headers.insert(USER_AGENT, ua.clone());

        let mut plain_headers = HeaderMap::new();
        plain_headers.insert(USER_AGENT, ua);
        let plain = Client::builder().default_headers(plain_headers).build()?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
            .map_err(|_| OpsError::validation("token", "token contains invalid characters"))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        let client = Client::builder().default_headers(headers).build()?;

        Ok(GithubHost {
            api,
            client,
            plain,
            login: RefCell::new(None),
        })
    }

    /// API URL made of `segments`, each one encoded as a single path
    /// segment so names can never add or climb path levels.
    fn endpoint<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> Url {
        let mut url = self.api.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            // `%` is the only character the segment encoder leaves alone
            path.pop_if_empty()
                .extend(segments.into_iter().map(|s| s.replace('%', "%25")));
        }
        url
    }

    fn repo_endpoint<'s>(
        &self,
        owner: &'s str,
        name: &'s str,
        rest: impl IntoIterator<Item = &'s str>,
    ) -> Url {
        self.endpoint(["repos", owner, name].into_iter().chain(rest))
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.client.request(method, url)
    }

    fn send(&self, req: RequestBuilder) -> Result<Response> {
        check(req.send()?)
    }

    fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        Ok(self.send(self.request(Method::GET, url))?.json()?)
    }

    fn patch_repo(&self, repo: &Repo, body: serde_json::Value) -> Result<Repo> {
        let url = self.repo_endpoint(&repo.owner, &repo.name, []);
        let r: ApiRepo = self
            .send(self.request(Method::PATCH, url).json(&body))?
            .json()?;
        Ok(r.into())
    }

    fn paginate<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>> {
        let mut out = Vec::new();
        for page in 1.. {
            let mut page_url = url.clone();
            page_url
                .query_pairs_mut()
                .append_pair("per_page", &PER_PAGE.to_string())
                .append_pair("page", &page.to_string());
            let batch: Vec<T> = self.get_json(page_url)?;
            let n = batch.len();
            out.extend(batch);
            if n < PER_PAGE {
                break;
            }
        }
        Ok(out)
    }
}

/// Turn a non-2xx response into [`OpsError::RemoteApi`], keeping the
/// service's `message` verbatim when it sent one.
fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().unwrap_or_default();
    let message = match serde_json::from_str::<ApiMessage>(&body) {
        Ok(m) => m.message,
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string(),
        Err(_) => body.trim().to_string(),
    };
    Err(OpsError::RemoteApi {
        status: Some(status.as_u16()),
        message,
    })
}

fn account_from(a: ApiAccount) -> Account {
    let kind = if a.kind == "Organization" {
        AccountKind::Organization
    } else {
        AccountKind::User
    };
    Account {
        login: a.login,
        kind,
    }
}

impl RepositoryHost for GithubHost {
    fn authenticated_login(&self) -> Result<String> {
        if let Some(login) = self.login.borrow().as_ref() {
            return Ok(login.clone());
        }
        let me: ApiAccount = self.get_json(self.endpoint(["user"]))?;
        *self.login.borrow_mut() = Some(me.login.clone());
        Ok(me.login)
    }

    fn find_account(&self, name: &str) -> Result<Account> {
        match self.get_json::<ApiAccount>(self.endpoint(["orgs", name])) {
            Ok(org) => Ok(Account::organization(org.login)),
            Err(_) => {
                let user: ApiAccount = self.get_json(self.endpoint(["users", name]))?;
                Ok(account_from(user))
            }
        }
    }

    fn list_repositories(&self, account: &Account) -> Result<Vec<Repo>> {
        let (mut url, filter) = match account.kind {
            AccountKind::Organization => (
                self.endpoint(["orgs", account.login.as_str(), "repos"]),
                ("type", "all"),
            ),
            AccountKind::User if self.authenticated_login()? == account.login => {
                (self.endpoint(["user", "repos"]), ("affiliation", "owner"))
            }
            AccountKind::User => (
                self.endpoint(["users", account.login.as_str(), "repos"]),
                ("type", "owner"),
            ),
        };
        url.query_pairs_mut().append_pair(filter.0, filter.1);
        let repos: Vec<ApiRepo> = self.paginate(url)?;
        Ok(repos.into_iter().map(Repo::from).collect())
    }

    fn create_repository(
        &self,
        account: &Account,
        name: &str,
        visibility: Visibility,
        auto_init: bool,
    ) -> Result<Repo> {
        let url = match account.kind {
            AccountKind::Organization => {
                self.endpoint(["orgs", account.login.as_str(), "repos"])
            }
            AccountKind::User => self.endpoint(["user", "repos"]),
        };
        let body = json!({
            "name": name,
            "private": visibility.is_private(),
            "auto_init": auto_init,
        });
        let r: ApiRepo = self
            .send(self.request(Method::POST, url).json(&body))?
            .json()?;
        Ok(r.into())
    }

    fn get_repository(&self, account: &Account, name: &str) -> Result<Repo> {
        let r: ApiRepo = self.get_json(self.repo_endpoint(&account.login, name, []))?;
        Ok(r.into())
    }

    fn delete_repository(&self, repo: &Repo) -> Result<()> {
        let url = self.repo_endpoint(&repo.owner, &repo.name, []);
        self.send(self.request(Method::DELETE, url))?;
        Ok(())
    }

    fn set_visibility(&self, repo: &Repo, visibility: Visibility) -> Result<Repo> {
        self.patch_repo(repo, json!({ "private": visibility.is_private() }))
    }

    fn rename_repository(&self, repo: &Repo, new_name: &str) -> Result<Repo> {
        self.patch_repo(repo, json!({ "name": new_name }))
    }

    fn set_default_branch(&self, repo: &Repo, branch: &str) -> Result<Repo> {
        self.patch_repo(repo, json!({ "default_branch": branch }))
    }

    fn branch_exists(&self, repo: &Repo, branch: &str) -> Result<bool> {
        // branch names may contain `/`; every part is encoded on its own
        let rest = ["branches"].into_iter().chain(branch.split('/'));
        let url = self.repo_endpoint(&repo.owner, &repo.name, rest);
        let resp = self.request(Method::GET, url).send()?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(false);
        }
        check(resp)?;
        Ok(true)
    }

    fn create_release(&self, repo: &Repo, tag: &str, title: &str, body: &str) -> Result<Release> {
        let url = self.repo_endpoint(&repo.owner, &repo.name, ["releases"]);
        let payload = json!({ "tag_name": tag, "name": title, "body": body });
        let r: ApiRelease = self
            .send(self.request(Method::POST, url).json(&payload))?
            .json()?;
        Ok(Release {
            id: r.id,
            owner: repo.owner.clone(),
            repo: repo.name.clone(),
            tag: r.tag_name,
            title: r.name.unwrap_or_else(|| title.to_string()),
            html_url: r.html_url,
            upload_url: r.upload_url,
        })
    }

    fn upload_release_asset(
        &self,
        release: &Release,
        bytes: Vec<u8>,
        name: &str,
        content_type: &str,
    ) -> Result<ReleaseAsset> {
        // upload_url is an RFC 6570 template: ".../assets{?name,label}"
        let base = release
            .upload_url
            .split('{')
            .next()
            .unwrap_or(&release.upload_url);
        let ct = HeaderValue::from_str(content_type)
            .map_err(|e| OpsError::validation("content_type", e.to_string()))?;
        let req = self
            .client
            .post(base)
            .query(&[("name", name)])
            .header(CONTENT_TYPE, ct)
            .body(bytes);
        let a: ApiAsset = self.send(req)?.json()?;
        Ok(ReleaseAsset {
            name: a.name,
            size: a.size,
            download_url: a.browser_download_url,
        })
    }

    fn fetch_asset(&self, url: &str) -> Result<Download> {
        let resp = check(self.plain.get(url).send()?)?;
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let bytes = resp.bytes()?.to_vec();
        Ok(Download {
            bytes,
            content_type,
        })
    }

    fn set_actions_enabled(&self, repo: &Repo, enabled: bool) -> Result<()> {
        let url = self.repo_endpoint(&repo.owner, &repo.name, ["actions", "permissions"]);
        self.send(
            self.request(Method::PUT, url)
                .json(&json!({ "enabled": enabled })),
        )?;
        Ok(())
    }

    fn list_workflows(&self, repo: &Repo) -> Result<Vec<Workflow>> {
        let url = self.repo_endpoint(&repo.owner, &repo.name, ["actions", "workflows"]);
        let req = self
            .request(Method::GET, url)
            .query(&[("per_page", PER_PAGE)]);
        let list: WorkflowList = self.send(req)?.json()?;
        Ok(list
            .workflows
            .into_iter()
            .map(|w| Workflow {
                id: w.id,
                owner: repo.owner.clone(),
                repo: repo.name.clone(),
                name: w.name,
                path: w.path,
                state: w.state,
            })
            .collect())
    }

    fn enable_workflow(&self, workflow: &Workflow) -> Result<()> {
        let id = workflow.id.to_string();
        let url = self.repo_endpoint(
            &workflow.owner,
            &workflow.repo,
            ["actions", "workflows", id.as_str(), "enable"],
        );
        self.send(self.request(Method::PUT, url))?;
        Ok(())
    }

    fn dispatch_workflow(&self, workflow: &Workflow, git_ref: &str) -> Result<()> {
        let id = workflow.id.to_string();
        let url = self.repo_endpoint(
            &workflow.owner,
            &workflow.repo,
            ["actions", "workflows", id.as_str(), "dispatches"],
        );
        self.send(
            self.request(Method::POST, url)
                .json(&json!({ "ref": git_ref })),
        )?;
        Ok(())
    }

    fn list_workflow_runs(&self, repo: &Repo, status: RunStatus) -> Result<Vec<WorkflowRun>> {
        let url = self.repo_endpoint(&repo.owner, &repo.name, ["actions", "runs"]);
        let per_page = PER_PAGE.to_string();
        let req = self
            .request(Method::GET, url)
            .query(&[("status", status.as_str()), ("per_page", per_page.as_str())]);
        let list: RunList = self.send(req)?.json()?;
        Ok(list
            .workflow_runs
            .into_iter()
            .map(|r| WorkflowRun {
                id: r.id,
                owner: repo.owner.clone(),
                repo: repo.name.clone(),
                name: r.name,
                status: r.status.unwrap_or_else(|| status.as_str().to_string()),
            })
            .collect())
    }

    fn cancel_run(&self, run: &WorkflowRun) -> Result<()> {
        let id = run.id.to_string();
        let url = self.repo_endpoint(
            &run.owner,
            &run.repo,
            ["actions", "runs", id.as_str(), "cancel"],
        );
        self.send(self.request(Method::POST, url))?;
        Ok(())
    }
}
