use git2::{Oid, Repository, Signature};
use tempfile::{TempDir, tempdir};

/// Bare repo with one commit on `main` and `develop`, a tag, and two PR refs.
/// HEAD points at `develop`.
pub fn fixture_mirror() -> (TempDir, Oid) {
    let td = tempdir().unwrap();
    let repo = Repository::init_bare(td.path()).unwrap();
    let sig = Signature::now("ghm", "ghm@example.invalid").unwrap();
    let tree_id = repo.treebuilder(None).unwrap().write().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let oid = repo
        .commit(Some("refs/heads/main"), &sig, &sig, "init", &tree, &[])
        .unwrap();
    for name in [
        "refs/heads/develop",
        "refs/tags/v1.0.0",
        "refs/pull/1/head",
        "refs/pull/2/merge",
    ] {
        repo.reference(name, oid, true, "fixture").unwrap();
    }
    repo.set_head("refs/heads/develop").unwrap();
    (td, oid)
}
