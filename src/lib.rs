//! Crate entry point for **ghm**.
//!
//! `ghm` runs one-shot operations against a GitHub-like hosting service:
//! repository CRUD, releases, Actions switches, workflow dispatch and
//! cancellation, and mirroring an external repository (`clone_repo`).
//!
//! Each submodule owns one concern (config, REST client, local git,
//! mirror pipeline, dispatch). The `pub use` re-exports are what the `ghm`
//! binary uses.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod git;
pub mod host;
pub mod mirror;
pub mod model;
mod paths;
mod progress;
mod report;
mod run;
mod token;

#[cfg(test)]
mod testing;

pub use dispatch::{Dispatcher, Outcome, Params, parse_key_value};
pub use error::{ErrorKind, OpsError};
pub use paths::ghm_home;
pub use run::{RunOptions, cmd_config_path, cmd_operations, cmd_run};
pub use token::Token;
