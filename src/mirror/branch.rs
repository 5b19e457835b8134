use std::path::Path;

use crate::error::{OpsError, Result};
use crate::git::GitTransport;

const HEADS: &str = "refs/heads/";

/// Short name of the branch the mirror's symbolic `HEAD` points at.
///
/// # Errors
/// [`OpsError::Resolution`] when HEAD is detached, missing, unborn, points
/// outside `refs/heads/`, or cannot be read at all.
pub fn resolve_default_branch(git: &dyn GitTransport, dir: &Path) -> Result<String> {
    let target = git
        .symbolic_ref(dir, "HEAD")
        .map_err(|e| OpsError::Resolution(format!("cannot read HEAD: {}", e)))?
        .ok_or_else(|| {
            OpsError::Resolution(
                "mirror has no symbolic HEAD (empty or detached source)".to_string(),
            )
        })?;

    match target.strip_prefix(HEADS) {
        Some(short) if !short.is_empty() => Ok(short.to_string()),
        _ => Err(OpsError::Resolution(format!(
            "HEAD points outside {}: {}",
            HEADS, target
        ))),
    }
}
