use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::{Error, IoResultExt, Result};
use crate::hash::Hash;
use crate::object::read_commit;
use crate::ops::reachable::referenced_objects;
use crate::repo::Repo;
use crate::workspace::{scan, workspace_path};

/// what `add` did with each path it visited
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AddSummary {
    /// paths whose index entry was created or changed
    pub staged: Vec<String>,
    /// tracked paths missing from the workspace, staged for removal
    pub removed: Vec<String>,
    /// paths already staged with the same content
    pub unchanged: Vec<String>,
    /// paths skipped by the ignore rules
    pub ignored: Vec<String>,
}

/// stage a file, or every non-ignored file below a directory
///
/// tracked paths at or below `path` that no longer exist in the workspace
/// are staged for removal.
#[instrument(skip(repo, path), fields(path = %path.display()))]
pub fn add(repo: &Repo, path: &Path) -> Result<AddSummary> {
    let rel = workspace_path(repo.workdir(), path)?;
    let target = if rel.is_empty() {
        repo.workdir().to_path_buf()
    } else {
        repo.workdir().join(&rel)
    };

    let head = head_files(repo)?;
    let keep = referenced_objects(repo)?;
    let mut index = repo.index()?;
    let mut summary = AddSummary::default();

    let vanished: Vec<String> = head
        .keys()
        .map(String::as_str)
        .chain(index.list().map(|(p, _)| p))
        .filter(|p| is_below(p, &rel) && !index.is_removed(p))
        .filter(|p| repo.workdir().join(p).symlink_metadata().is_err())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    if target.symlink_metadata().is_err() && vanished.is_empty() {
        return Err(Error::PathNotFound(path.to_path_buf()));
    }

    for gone in vanished {
        if head.contains_key(&gone) {
            index.stage_removal(repo.objects(), &gone, &keep)?;
        } else {
            index.remove(repo.objects(), &gone, &keep)?;
        }
        summary.removed.push(gone);
    }

    let entries = if target.exists() {
        let rules = repo.ignore_rules()?;
        scan(repo.workdir(), &target, &rules)?
    } else {
        Vec::new()
    };

    for entry in entries {
        if entry.ignored {
            debug!(path = %entry.path, "ignored");
            summary.ignored.push(entry.path);
            continue;
        }

        let file = repo.workdir().join(&entry.path);
        let content = fs::read(&file).with_path(&file)?;
        let hash = Hash::of(&content);

        if index.get(&entry.path) == Some(hash) {
            summary.unchanged.push(entry.path);
            continue;
        }

        repo.objects().put(&content)?;
        index.add(repo.objects(), &entry.path, hash, &keep)?;
        summary.staged.push(entry.path);
    }

    info!(
        staged = summary.staged.len(),
        removed = summary.removed.len(),
        unchanged = summary.unchanged.len(),
        ignored = summary.ignored.len(),
        "add finished"
    );
    Ok(summary)
}

/// is `path` equal to or inside the workspace-relative `prefix`
fn is_below(path: &str, prefix: &str) -> bool {
    prefix.is_empty()
        || path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// files of the HEAD commit, empty before the first commit
pub(crate) fn head_files(repo: &Repo) -> Result<BTreeMap<String, Hash>> {
    match repo.refs().head_commit()? {
        Some(hash) => {
            let commit = read_commit(repo.objects(), &hash)?;
            Ok(commit.tree.files().into_iter().collect())
        }
        None => Ok(BTreeMap::new()),
    }
}
