use std::collections::HashSet;

use crate::error::Result;
use crate::hash::Hash;
use crate::object::read_commit;
use crate::repo::Repo;

/// every object reachable from a branch: commit records and their file blobs
///
/// commits are immutable and content addressed, so the visited set only
/// saves re-reading history shared between branches.
pub fn referenced_objects(repo: &Repo) -> Result<HashSet<Hash>> {
    let mut reachable = HashSet::new();

    for branch in repo.refs().list_branches()? {
        let mut next = repo.refs().read_branch(&branch)?;

        while let Some(hash) = next {
            if !reachable.insert(hash) {
                break;
            }
            let commit = read_commit(repo.objects(), &hash)?;
            reachable.extend(commit.tree.files().into_iter().map(|(_, blob)| blob));
            next = commit.parent;
        }
    }

    Ok(reachable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{add, commit};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_referenced_objects() {
        let dir = tempdir().unwrap();
        let (repo, _) = Repo::init(dir.path()).unwrap();
        assert!(referenced_objects(&repo).unwrap().is_empty());

        fs::write(dir.path().join("a.txt"), "a1").unwrap();
        add(&repo, &dir.path().join("a.txt")).unwrap();
        let c1 = commit(&repo, "one").unwrap();

        fs::write(dir.path().join("a.txt"), "a2").unwrap();
        add(&repo, &dir.path().join("a.txt")).unwrap();
        let c2 = commit(&repo, "two").unwrap();

        let reachable = referenced_objects(&repo).unwrap();
        assert!(reachable.contains(&c1));
        assert!(reachable.contains(&c2));
        assert!(reachable.contains(&Hash::of(b"a1")));
        assert!(reachable.contains(&Hash::of(b"a2")));
        assert_eq!(reachable.len(), 4);
    }
}
