//! Operation registry and dispatcher.
//!
//! Every operation is a row in [`OPERATIONS`]: its name, the parameters it
//! cannot run without, and the handler. The dispatcher checks the required
//! parameters before the handler (and therefore any remote call) runs.

mod handlers;
mod outcome;
mod params;

pub use outcome::{Outcome, UploadedAsset};
pub use params::{Params, parse_key_value};

use indicatif::ProgressBar;

use crate::config::Settings;
use crate::error::{OpsError, Result};
use crate::git::GitTransport;
use crate::host::RepositoryHost;
use crate::mirror::{Sleeper, ThreadSleeper};
use crate::token::Token;

type Handler = fn(&Context<'_>, &Params) -> Result<Outcome>;

/// One registered operation.
pub struct Operation {
    pub name: &'static str,
    pub required: &'static [&'static str],
    pub optional: &'static [&'static str],
    pub about: &'static str,
    handler: Handler,
}

pub static OPERATIONS: &[Operation] = &[
    Operation {
        name: "list_repos",
        required: &[],
        optional: &[],
        about: "List repositories of the target account",
        handler: handlers::list_repos,
    },
    Operation {
        name: "create_repo",
        required: &["name"],
        optional: &["visibility"],
        about: "Create a repository (initialized with a README)",
        handler: handlers::create_repo,
    },
    Operation {
        name: "delete_repo",
        required: &["name"],
        optional: &[],
        about: "Delete a repository",
        handler: handlers::delete_repo,
    },
    Operation {
        name: "toggle_visibility",
        required: &["name"],
        optional: &[],
        about: "Flip a repository between private and public",
        handler: handlers::toggle_visibility,
    },
    Operation {
        name: "rename_repo",
        required: &["name", "new_name"],
        optional: &[],
        about: "Rename a repository",
        handler: handlers::rename_repo,
    },
    Operation {
        name: "create_release",
        required: &["name", "tag", "title"],
        optional: &["body", "asset_url"],
        about: "Create a release, optionally attaching an asset downloaded from a URL",
        handler: handlers::create_release,
    },
    Operation {
        name: "set_actions_permissions",
        required: &["name", "enabled"],
        optional: &[],
        about: "Enable or disable Actions for a repository",
        handler: handlers::set_actions_permissions,
    },
    Operation {
        name: "run_workflow",
        required: &["name"],
        optional: &["ref"],
        about: "Enable and dispatch every workflow of a repository",
        handler: handlers::run_workflow,
    },
    Operation {
        name: "cancel_workflows",
        required: &["name"],
        optional: &[],
        about: "Cancel queued and in-progress workflow runs",
        handler: handlers::cancel_workflows,
    },
    Operation {
        name: "clone_repo",
        required: &["source_url"],
        optional: &["name", "visibility"],
        about: "Mirror an external repository into a new repository",
        handler: handlers::clone_repo,
    },
];

pub fn find_operation(name: &str) -> Option<&'static Operation> {
    OPERATIONS.iter().find(|op| op.name == name)
}

pub fn operation_names() -> Vec<&'static str> {
    OPERATIONS.iter().map(|op| op.name).collect()
}

/// Everything a handler may touch.
pub(crate) struct Context<'a> {
    pub host: &'a dyn RepositoryHost,
    pub git: &'a dyn GitTransport,
    pub settings: &'a Settings,
    pub token: &'a Token,
    pub target: &'a str,
    pub sleeper: &'a dyn Sleeper,
    pub progress: &'a ProgressBar,
}

/// Routes operation names to handlers against one host, git transport and
/// target account.
pub struct Dispatcher<'a> {
    host: &'a dyn RepositoryHost,
    git: &'a dyn GitTransport,
    settings: &'a Settings,
    token: &'a Token,
    target: String,
    sleeper: &'a dyn Sleeper,
    progress: ProgressBar,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        host: &'a dyn RepositoryHost,
        git: &'a dyn GitTransport,
        settings: &'a Settings,
        token: &'a Token,
        target: impl Into<String>,
    ) -> Self {
        Dispatcher {
            host,
            git,
            settings,
            token,
            target: target.into(),
            sleeper: &ThreadSleeper,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report steps on `pb` instead of a hidden bar.
    pub fn with_progress(mut self, pb: ProgressBar) -> Self {
        self.progress = pb;
        self
    }

    pub fn with_sleeper(mut self, sleeper: &'a dyn Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Run `operation` with `params`.
    ///
    /// # Errors
    /// - [`OpsError::UnsupportedOperation`] for an unknown name.
    /// - [`OpsError::Validation`] for a missing or blank required parameter
    ///   or an empty target account, before any remote call.
    /// - Whatever the handler returns.
    pub fn dispatch(&self, operation: &str, params: &Params) -> Result<Outcome> {
        let op = find_operation(operation.trim()).ok_or_else(|| {
            OpsError::UnsupportedOperation {
                operation: operation.to_string(),
                known: operation_names(),
            }
        })?;

        let target = self.target.trim();
        if target.is_empty() {
            return Err(OpsError::missing("account"));
        }
        for p in op.required {
            params.require(p)?;
        }

        let ctx = Context {
            host: self.host,
            git: self.git,
            settings: self.settings,
            token: self.token,
            target,
            sleeper: self.sleeper,
            progress: &self.progress,
        };
        (op.handler)(&ctx, params)
    }
}
