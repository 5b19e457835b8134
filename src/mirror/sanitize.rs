use std::path::Path;

use crate::error::Result;
use crate::git::GitTransport;

/// Result of [`strip_hidden_refs`].
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Stripped {
    /// Refs actually deleted.
    pub removed: usize,
    /// One `<ref>: <error>` line per ref that could not be deleted.
    pub failures: Vec<String>,
}

/// Delete every reference under `prefix` from the local mirror at `dir`.
///
/// Hosting services reject pushes into server-managed namespaces such as
/// `refs/pull/`, and a single rejected ref fails the whole `push --mirror`.
/// Only the local mirror is touched. Zero matches is not an error. A ref
/// that cannot be deleted is recorded in [`Stripped::failures`] and the
/// rest are still attempted.
///
/// # Errors
/// When the refs under `prefix` cannot be listed.
pub fn strip_hidden_refs(git: &dyn GitTransport, dir: &Path, prefix: &str) -> Result<Stripped> {
    let mut stripped = Stripped::default();
    for name in git.list_refs(dir, prefix)? {
        match git.delete_ref(dir, &name) {
            Ok(()) => stripped.removed += 1,
            Err(e) => stripped.failures.push(format!("{}: {}", name, e)),
        }
    }
    Ok(stripped)
}
