//! Git integration layer.
//!
//! [`GitTransport`] is what the mirror pipeline sees. [`SystemGit`] is the
//! real backend: network operations (`clone --mirror`, `push --mirror`)
//! shell out to the `git` binary, local reference reads and deletes go
//! through libgit2 (`git2_backend`).

mod command;
mod git2_backend;

#[cfg(test)]
pub(crate) mod fixtures;

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Local VCS capability used by the mirror pipeline.
pub trait GitTransport {
    /// Mirror-clone `url` into `dest` (a bare repository carrying every ref).
    fn mirror_clone(&self, url: &str, dest: &Path) -> Result<()>;

    /// Full names of every reference in `dir` starting with `prefix`.
    fn list_refs(&self, dir: &Path, prefix: &str) -> Result<Vec<String>>;

    fn delete_ref(&self, dir: &Path, name: &str) -> Result<()>;

    /// Target of the symbolic reference `name`, or `None` when it is not
    /// symbolic, missing, or points at a ref that does not exist (unborn).
    fn symbolic_ref(&self, dir: &Path, name: &str) -> Result<Option<String>>;

    /// `git push --mirror` from `dir` to `url`.
    fn mirror_push(&self, dir: &Path, url: &str) -> Result<()>;
}

/// [`GitTransport`] over the system `git` binary and libgit2.
#[derive(Debug, Clone)]
pub struct SystemGit {
    binary: PathBuf,
}

impl Default for SystemGit {
    fn default() -> Self {
        SystemGit {
            binary: PathBuf::from("git"),
        }
    }
}

impl GitTransport for SystemGit {
    fn mirror_clone(&self, url: &str, dest: &Path) -> Result<()> {
        command::clone_mirror(&self.binary, url, dest)
    }

    fn list_refs(&self, dir: &Path, prefix: &str) -> Result<Vec<String>> {
        git2_backend::list_refs(dir, prefix)
    }

    fn delete_ref(&self, dir: &Path, name: &str) -> Result<()> {
        git2_backend::delete_ref(dir, name)
    }

    fn symbolic_ref(&self, dir: &Path, name: &str) -> Result<Option<String>> {
        git2_backend::symbolic_target(dir, name)
    }

    fn mirror_push(&self, dir: &Path, url: &str) -> Result<()> {
        command::push_mirror(&self.binary, dir, url)
    }
}
