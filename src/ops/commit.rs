use tracing::{info, instrument};

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::write_commit;
use crate::ops::add::head_files;
use crate::repo::Repo;
use crate::types::{Commit, Tree};

/// snapshot the index onto the current branch
///
/// the new tree is the parent commit's files without the staged removals,
/// overlaid with every staged entry. the branch pointer moves to the new
/// commit and the index is cleared.
#[instrument(skip(repo))]
pub fn commit(repo: &Repo, message: &str) -> Result<Hash> {
    let mut index = repo.index()?;
    if index.is_empty() {
        return Err(Error::EmptyCommit);
    }

    let branch = repo.refs().current_branch()?;
    let parent = repo.refs().read_branch(&branch)?;

    let mut files = head_files(repo)?;
    for path in index.removals() {
        files.remove(path);
    }
    for (path, hash) in index.list() {
        files.insert(path.to_string(), hash);
    }
    let tree = Tree::from_entries(files.iter().map(|(p, h)| (p.as_str(), *h)));

    let commit = Commit::new(tree, parent, message);
    let hash = write_commit(repo.objects(), &commit)?;

    repo.refs().update_branch(&branch, &hash)?;
    index.clear()?;

    info!(%hash, branch = %branch, files = files.len(), "created commit");
    Ok(hash)
}
