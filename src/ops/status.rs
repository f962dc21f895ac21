use std::collections::BTreeSet;
use std::fmt;

use tracing::instrument;

use crate::error::Result;
use crate::hash::Hash;
use crate::ops::add::head_files;
use crate::repo::Repo;
use crate::workspace::{hash_file, scan};

/// how a staged path differs from the HEAD commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Added,
    Modified,
    Deleted,
}

/// a path with a staged change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub path: String,
    pub change: Change,
}

/// comparison of HEAD, index and workspace; all lists sorted by path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub branch: String,
    pub head: Option<Hash>,
    /// index entries and removals that differ from HEAD
    pub staged: Vec<StagedFile>,
    /// tracked files whose workspace content differs from index/HEAD
    pub modified: Vec<String>,
    /// tracked files missing from the workspace
    pub deleted: Vec<String>,
    /// workspace files that are neither staged, committed nor ignored
    pub untracked: Vec<String>,
}

impl Status {
    /// nothing staged, changed or untracked
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty()
            && self.modified.is_empty()
            && self.deleted.is_empty()
            && self.untracked.is_empty()
    }
}

/// compute the working tree status
#[instrument(skip(repo))]
pub fn status(repo: &Repo) -> Result<Status> {
    let branch = repo.refs().current_branch()?;
    let head = repo.refs().read_branch(&branch)?;
    let committed = head_files(repo)?;
    let index = repo.index()?;

    let mut staged = Vec::new();
    for (path, hash) in index.list() {
        let change = match committed.get(path) {
            None => Change::Added,
            Some(old) if *old != hash => Change::Modified,
            Some(_) => continue,
        };
        staged.push(StagedFile {
            path: path.to_string(),
            change,
        });
    }
    for path in index.removals().filter(|p| committed.contains_key(*p)) {
        staged.push(StagedFile {
            path: path.to_string(),
            change: Change::Deleted,
        });
    }
    staged.sort_by(|a, b| a.path.cmp(&b.path));

    let tracked: BTreeSet<&str> = committed
        .keys()
        .map(String::as_str)
        .filter(|p| !index.is_removed(p))
        .chain(index.list().map(|(p, _)| p))
        .collect();

    let mut modified = Vec::new();
    let mut deleted = Vec::new();
    for path in &tracked {
        let expected = index.get(path).or_else(|| committed.get(*path).copied());
        let file = repo.workdir().join(path);
        if !file.is_file() {
            deleted.push(path.to_string());
        } else if Some(hash_file(&file)?) != expected {
            modified.push(path.to_string());
        }
    }

    let rules = repo.ignore_rules()?;
    let mut untracked: Vec<String> = scan(repo.workdir(), repo.workdir(), &rules)?
        .into_iter()
        .filter(|e| !e.ignored && !tracked.contains(e.path.as_str()))
        .map(|e| e.path)
        .collect();
    untracked.sort();

    Ok(Status {
        branch,
        head,
        staged,
        modified,
        deleted,
        untracked,
    })
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "On branch {}", self.branch)?;
        match &self.head {
            Some(hash) => writeln!(f, "HEAD at {}", hash.short())?,
            None => writeln!(f, "No commits yet")?,
        }

        if !self.staged.is_empty() {
            writeln!(f, "\nChanges to be committed:")?;
            for file in &self.staged {
                let label = match file.change {
                    Change::Added => "new file:",
                    Change::Modified => "modified:",
                    Change::Deleted => "deleted:",
                };
                writeln!(f, "  {:<11} {}", label, file.path)?;
            }
        }

        if !self.modified.is_empty() || !self.deleted.is_empty() {
            writeln!(f, "\nChanges not staged for commit:")?;
            for path in &self.modified {
                writeln!(f, "  {:<11} {}", "modified:", path)?;
            }
            for path in &self.deleted {
                writeln!(f, "  {:<11} {}", "deleted:", path)?;
            }
        }

        if !self.untracked.is_empty() {
            writeln!(f, "\nUntracked files:")?;
            for path in &self.untracked {
                writeln!(f, "  {}", path)?;
            }
        }

        if self.is_clean() {
            writeln!(f, "\nnothing to commit, working tree clean")?;
        }
        Ok(())
    }
}
