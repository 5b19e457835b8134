use git2::{ErrorCode, ReferenceType, Repository};
use std::path::Path;

use crate::error::Result;

/// List the full names of references in `dir` whose name starts with `prefix`.
///
/// Names that are not valid UTF-8 are skipped. The result is sorted so
/// callers see a stable order.
///
/// # Errors
/// Returns an error if the repository cannot be opened or its refs iterated.
pub fn list_refs(dir: &Path, prefix: &str) -> Result<Vec<String>> {
    let repo = Repository::open(dir)?;
    let mut out = Vec::new();
    for reference in repo.references()? {
        let reference = reference?;
        if let Some(name) = reference.name()
            && name.starts_with(prefix)
        {
            out.push(name.to_string());
        }
    }
    out.sort();
    Ok(out)
}

/// Delete the reference `name` from the repository at `dir`.
///
/// A reference that is already gone counts as deleted.
pub fn delete_ref(dir: &Path, name: &str) -> Result<()> {
    let repo = Repository::open(dir)?;
    match repo.find_reference(name) {
        Ok(mut r) => {
            r.delete()?;
            Ok(())
        }
        Err(e) if e.code() == ErrorCode::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

/// Resolve the symbolic reference `name` (usually `HEAD`) one level.
///
/// Returns `None` when:
/// - the reference does not exist,
/// - it is a direct reference (detached HEAD),
/// - its target does not exist (unborn branch, e.g. an empty repository).
pub fn symbolic_target(dir: &Path, name: &str) -> Result<Option<String>> {
    let repo = Repository::open(dir)?;
    let reference = match repo.find_reference(name) {
        Ok(r) => r,
        Err(e) if e.code() == ErrorCode::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    if reference.kind() != Some(ReferenceType::Symbolic) {
        return Ok(None);
    }
    let Some(target) = reference.symbolic_target() else {
        return Ok(None);
    };
    if repo.find_reference(target).is_err() {
        return Ok(None);
    }
    Ok(Some(target.to_string()))
}
