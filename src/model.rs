use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::OpsError;

/// Kind of owner an account is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccountKind {
    Organization,
    User,
}

/// Owner of repositories on the hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Account {
    pub login: String,
    pub kind: AccountKind,
}

impl Account {
    pub fn organization(login: impl Into<String>) -> Self {
        Account {
            login: login.into(),
            kind: AccountKind::Organization,
        }
    }

    pub fn user(login: impl Into<String>) -> Self {
        Account {
            login: login.into(),
            kind: AccountKind::User,
        }
    }

    pub fn is_user(&self) -> bool {
        self.kind == AccountKind::User
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Public,
}

impl Visibility {
    pub fn from_private(private: bool) -> Self {
        if private {
            Visibility::Private
        } else {
            Visibility::Public
        }
    }

    pub fn is_private(self) -> bool {
        self == Visibility::Private
    }

    pub fn toggled(self) -> Self {
        match self {
            Visibility::Private => Visibility::Public,
            Visibility::Public => Visibility::Private,
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Visibility::Private => f.write_str("private"),
            Visibility::Public => f.write_str("public"),
        }
    }
}

impl FromStr for Visibility {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "private" => Ok(Visibility::Private),
            "public" => Ok(Visibility::Public),
            other => Err(OpsError::validation(
                "visibility",
                format!("expected `private` or `public`, got `{}`", other),
            )),
        }
    }
}

/// A repository as reported by the hosting service.
///
/// `default_branch` is `None` for a repository without any branch yet
/// (e.g. freshly created with `auto_init=false`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repo {
    pub owner: String,
    pub name: String,
    pub visibility: Visibility,
    pub default_branch: Option<String>,
    pub clone_url: String,
    pub html_url: String,
}

impl Repo {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Release {
    pub id: u64,
    pub owner: String,
    pub repo: String,
    pub tag: String,
    pub title: String,
    pub html_url: String,
    pub upload_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReleaseAsset {
    pub name: String,
    pub size: u64,
    pub download_url: String,
}

/// Bytes fetched from an arbitrary URL, along with the advertised content type.
#[derive(Debug, Clone)]
pub struct Download {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Workflow {
    pub id: u64,
    pub owner: String,
    pub repo: String,
    pub name: String,
    pub path: String,
    pub state: String,
}

/// Run status filter accepted by `list_workflow_runs`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Queued,
    InProgress,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowRun {
    pub id: u64,
    pub owner: String,
    pub repo: String,
    pub name: Option<String>,
    pub status: String,
}
