use tracing::instrument;

use crate::error::Result;
use crate::hash::Hash;
use crate::object::{read_commit, ObjectStore};
use crate::repo::Repo;
use crate::types::Commit;

/// commit with its hash for log output
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub hash: Hash,
    pub commit: Commit,
}

/// history of the current branch, newest first
///
/// a branch without commits yields an empty log without reading any object.
#[instrument(skip(repo))]
pub fn log(repo: &Repo) -> Result<Vec<LogEntry>> {
    let head = repo.refs().head_commit()?;
    history(repo.objects(), head)
}

/// follow parent links from `start` to the root commit
pub fn history(store: &ObjectStore, start: Option<Hash>) -> Result<Vec<LogEntry>> {
    let mut entries = Vec::new();
    let mut next = match start {
        Some(hash) => Some((hash, read_commit(store, &hash)?)),
        None => None,
    };

    while let Some((hash, commit)) = next {
        next = commit.parent.zip(commit.parent_commit(store)?);
        entries.push(LogEntry { hash, commit });
    }

    Ok(entries)
}

/// format a log entry for display
impl std::fmt::Display for LogEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "commit {}", self.hash)?;
        writeln!(f)?;
        for line in self.commit.message.lines() {
            writeln!(f, "    {}", line)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::write_commit;
    use crate::ops::{add, commit};
    use crate::types::Tree;
    use std::fs;
    use tempfile::tempdir;

    fn test_repo() -> (tempfile::TempDir, Repo) {
        let dir = tempdir().unwrap();
        let (repo, _) = Repo::init(dir.path()).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_log_no_commits() {
        let (_dir, repo) = test_repo();

        // an unreadable object store proves nothing is read
        fs::remove_dir_all(repo.objects_path()).unwrap();
        assert!(log(&repo).unwrap().is_empty());
    }

    #[test]
    fn test_log_linear_history() {
        let (dir, repo) = test_repo();
        let file = dir.path().join("file.txt");

        let mut hashes = Vec::new();
        for i in 1..=3 {
            fs::write(&file, format!("v{}", i)).unwrap();
            add(&repo, &file).unwrap();
            hashes.push(commit(&repo, &format!("C{}", i)).unwrap());
        }

        let entries = log(&repo).unwrap();
        let seen: Vec<(Hash, &str)> = entries
            .iter()
            .map(|e| (e.hash, e.commit.message.as_str()))
            .collect();
        assert_eq!(
            seen,
            vec![(hashes[2], "C3"), (hashes[1], "C2"), (hashes[0], "C1")]
        );
    }

    #[test]
    fn test_history_from_hand_built_chain() {
        let (_dir, repo) = test_repo();
        let store = repo.objects();

        let c1 = write_commit(store, &Commit::new(Tree::new(), None, "C1")).unwrap();
        let c2 = write_commit(store, &Commit::new(Tree::new(), Some(c1), "C2")).unwrap();
        let c3 = write_commit(store, &Commit::new(Tree::new(), Some(c2), "C3")).unwrap();

        let hashes: Vec<Hash> = history(store, Some(c3))
            .unwrap()
            .into_iter()
            .map(|e| e.hash)
            .collect();
        assert_eq!(hashes, vec![c3, c2, c1]);
    }

    #[test]
    fn test_log_missing_parent() {
        let (_dir, repo) = test_repo();
        let store = repo.objects();

        let orphan = write_commit(store, &Commit::new(Tree::new(), Some(Hash::of(b"gone")), "x"))
            .unwrap();
        let result = history(store, Some(orphan));
        assert!(matches!(result, Err(crate::Error::ObjectNotFound(_))));
    }

    #[test]
    fn test_log_entry_display() {
        let entry = LogEntry {
            hash: Hash::of(b"c"),
            commit: Commit::new(Tree::new(), None, "subject\nbody line"),
        };
        let display = entry.to_string();

        assert!(display.starts_with(&format!("commit {}\n", Hash::of(b"c"))));
        assert!(display.contains("    subject\n    body line\n"));
    }
}
