use regex::Regex;
use std::sync::LazyLock;

use crate::error::{OpsError, Result};

/// Used when nothing usable is left of the source URL.
pub const PLACEHOLDER_NAME: &str = "mirrored-repo";

static DISALLOWED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_-]").unwrap());
static REPO_NAME: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]+$").unwrap());

/// Destination name derived from a source URL.
///
/// Takes the last path segment (after `/` or the `:` of scp-like URLs),
/// strips a trailing `.git`, then drops every character outside
/// `[A-Za-z0-9_-]`.
///
/// ```text
/// https://host/org/My Repo!!.git  ->  MyRepo
/// git@host:org/tool.git           ->  tool
/// https://host/org/!!!.git        ->  mirrored-repo
/// ```
pub fn derive_repo_name(source_url: &str) -> String {
    let trimmed = source_url.trim().trim_end_matches('/');
    let segment = trimmed.rsplit(['/', ':']).next().unwrap_or(trimmed);
    let stem = segment.strip_suffix(".git").unwrap_or(segment);
    let cleaned = DISALLOWED.replace_all(stem, "").into_owned();
    if cleaned.is_empty() {
        PLACEHOLDER_NAME.to_string()
    } else {
        cleaned
    }
}

/// Check a caller-supplied repository name against `[A-Za-z0-9_.-]+`.
///
/// `.` and `..` match the pattern but are path components, not names.
///
/// # Errors
/// [`OpsError::Validation`] naming `param` when the name does not match.
pub fn validate_repo_name(param: &str, name: &str) -> Result<()> {
    if REPO_NAME.is_match(name) && name != "." && name != ".." {
        Ok(())
    } else {
        Err(OpsError::validation(
            param,
            format!("`{}` must match [A-Za-z0-9_.-]+", name),
        ))
    }
}
