use tracing::{info, instrument};

use crate::error::Result;
use crate::hash::Hash;
use crate::repo::Repo;

/// a branch and where it points
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchInfo {
    pub name: String,
    pub commit: Option<Hash>,
    pub current: bool,
}

/// all branches, sorted, with the active one flagged
pub fn list_branches(repo: &Repo) -> Result<Vec<BranchInfo>> {
    let current = repo.refs().current_branch()?;
    repo.refs()
        .list_branches()?
        .into_iter()
        .map(|name| {
            Ok(BranchInfo {
                commit: repo.refs().read_branch(&name)?,
                current: name == current,
                name,
            })
        })
        .collect()
}

/// create a branch at the current HEAD commit
#[instrument(skip(repo))]
pub fn create_branch(repo: &Repo, name: &str) -> Result<Option<Hash>> {
    let target = repo.refs().create_branch(name)?;
    match &target {
        Some(hash) => info!(branch = name, commit = %hash, "created branch"),
        None => info!(branch = name, "created empty branch"),
    }
    Ok(target)
}

/// make `name` the active branch; workspace files are not touched
#[instrument(skip(repo))]
pub fn switch(repo: &Repo, name: &str) -> Result<()> {
    repo.refs().switch(name)?;
    info!(branch = name, "switched branch");
    Ok(())
}

impl std::fmt::Display for BranchInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let marker = if self.current { '*' } else { ' ' };
        write!(f, "{} {}", marker, self.name)
    }
}
