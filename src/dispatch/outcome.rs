use serde::Serialize;

use crate::mirror::MirrorSummary;
use crate::model::{Release, Repo};

/// Release asset as uploaded, with the digest of the bytes that were sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadedAsset {
    pub name: String,
    pub size: u64,
    pub content_type: String,
    pub sha256: String,
    pub download_url: String,
}

/// Structured success payload of an operation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Listed {
        account: String,
        repos: Vec<Repo>,
    },
    Created {
        repo: Repo,
    },
    Deleted {
        repo: String,
    },
    VisibilityToggled {
        repo: Repo,
    },
    Renamed {
        from: String,
        repo: Repo,
    },
    Released {
        release: Release,
        asset: Option<UploadedAsset>,
    },
    ActionsPermissions {
        repo: String,
        enabled: bool,
    },
    WorkflowsDispatched {
        repo: String,
        git_ref: String,
        workflows: Vec<String>,
    },
    RunsCancelled {
        repo: String,
        cancelled: Vec<u64>,
        failures: Vec<String>,
    },
    Mirrored(MirrorSummary),
}

impl Outcome {
    /// One-line description used as the spinner's final message.
    pub fn headline(&self) -> String {
        match self {
            Outcome::Listed { account, repos } => {
                format!("{} repositories under {}", repos.len(), account)
            }
            Outcome::Created { repo } => {
                format!("created {} ({})", repo.full_name(), repo.visibility)
            }
            Outcome::Deleted { repo } => format!("deleted {}", repo),
            Outcome::VisibilityToggled { repo } => {
                format!("{} is now {}", repo.full_name(), repo.visibility)
            }
            Outcome::Renamed { from, repo } => format!("renamed {} to {}", from, repo.full_name()),
            Outcome::Released { release, asset } => match asset {
                Some(a) => format!("released {} with asset {}", release.tag, a.name),
                None => format!("released {}", release.tag),
            },
            Outcome::ActionsPermissions { repo, enabled } => format!(
                "actions {} for {}",
                if *enabled { "enabled" } else { "disabled" },
                repo
            ),
            Outcome::WorkflowsDispatched {
                repo,
                git_ref,
                workflows,
            } => format!(
                "dispatched {} workflow(s) on {}@{}",
                workflows.len(),
                repo,
                git_ref
            ),
            Outcome::RunsCancelled {
                repo,
                cancelled,
                failures,
            } => {
                if failures.is_empty() {
                    format!("cancelled {} run(s) in {}", cancelled.len(), repo)
                } else {
                    format!(
                        "cancelled {} run(s) in {}, {} failed",
                        cancelled.len(),
                        repo,
                        failures.len()
                    )
                }
            }
            Outcome::Mirrored(s) => match &s.chosen_default_branch {
                Some(b) => format!("mirrored into {} (default branch {})", s.destination, b),
                None => format!("mirrored into {}", s.destination),
            },
        }
    }

    /// Non-fatal problems the operation ran into.
    pub fn warnings(&self) -> Vec<String> {
        match self {
            Outcome::Mirrored(s) => s.warnings.clone(),
            Outcome::RunsCancelled { failures, .. } => failures.clone(),
            _ => Vec::new(),
        }
    }
}
