use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::Hash;

/// prefix HEAD content carries before the branch name
pub const HEADS_PREFIX: &str = "refs/heads/";

/// HEAD and the branch pointers under `refs/heads`
#[derive(Debug, Clone)]
pub struct RefStore {
    head: PathBuf,
    heads: PathBuf,
    tmp: PathBuf,
}

impl RefStore {
    /// open the refs of a metadata root
    pub fn new(root: &Path) -> Self {
        Self {
            head: root.join("HEAD"),
            heads: root.join("refs/heads"),
            tmp: root.join("tmp"),
        }
    }

    /// directory holding branch files
    pub fn heads_path(&self) -> &Path {
        &self.heads
    }

    /// name of the branch HEAD points at
    pub fn current_branch(&self) -> Result<String> {
        let content = fs::read_to_string(&self.head).with_path(&self.head)?;
        let target = content.trim();
        let target = target.strip_prefix("ref:").map(str::trim).unwrap_or(target);

        let branch = target
            .strip_prefix(HEADS_PREFIX)
            .filter(|name| validate_branch_name(name).is_ok())
            .map(str::to_string);

        match branch {
            Some(name) => Ok(name),
            None => Err(Error::DetachedHead(content.trim().to_string())),
        }
    }

    /// point HEAD at an existing branch
    pub fn set_head(&self, branch: &str) -> Result<()> {
        if !self.branch_exists(branch) {
            return Err(Error::BranchNotFound(branch.to_string()));
        }
        self.write_head(branch)
    }

    /// write HEAD without checking the branch (used while initializing)
    pub(crate) fn write_head(&self, branch: &str) -> Result<()> {
        validate_branch_name(branch)?;
        self.atomic_write(&self.head, &format!("{}{}", HEADS_PREFIX, branch))?;
        debug!(branch, "HEAD updated");
        Ok(())
    }

    /// switch the active branch; workspace files are left untouched
    pub fn switch(&self, branch: &str) -> Result<()> {
        self.set_head(branch)
    }

    /// check if a branch exists
    pub fn branch_exists(&self, name: &str) -> bool {
        validate_branch_name(name).is_ok() && self.branch_path(name).is_file()
    }

    /// create a branch at the current HEAD commit (or empty)
    pub fn create_branch(&self, name: &str) -> Result<Option<Hash>> {
        validate_branch_name(name)?;
        if self.branch_path(name).exists() {
            return Err(Error::BranchAlreadyExists(name.to_string()));
        }

        let target = self.head_commit()?;
        self.write_branch(name, target.as_ref())?;
        Ok(target)
    }

    /// create an empty branch, used for the default branch at init
    pub(crate) fn create_empty_branch(&self, name: &str) -> Result<()> {
        validate_branch_name(name)?;
        if self.branch_path(name).exists() {
            return Err(Error::BranchAlreadyExists(name.to_string()));
        }
        self.write_branch(name, None)
    }

    /// move a branch to a new commit
    pub fn update_branch(&self, name: &str, commit: &Hash) -> Result<()> {
        validate_branch_name(name)?;
        self.write_branch(name, Some(commit))
    }

    /// commit a branch points at, `None` before its first commit
    pub fn read_branch(&self, name: &str) -> Result<Option<Hash>> {
        validate_branch_name(name)?;
        let path = self.branch_path(name);

        let content = fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::BranchNotFound(name.to_string())
            } else {
                Error::Io {
                    path: path.clone(),
                    source: e,
                }
            }
        })?;

        let hex = content.trim();
        if hex.is_empty() {
            return Ok(None);
        }
        Hash::from_hex(hex).map(Some)
    }

    /// commit the current branch points at
    pub fn head_commit(&self) -> Result<Option<Hash>> {
        let branch = self.current_branch()?;
        self.read_branch(&branch)
    }

    /// all branch names, sorted
    pub fn list_branches(&self) -> Result<Vec<String>> {
        let mut branches = Vec::new();

        if self.heads.exists() {
            collect_branches(&self.heads, &self.heads, &mut branches)?;
        }

        branches.sort();
        Ok(branches)
    }

    fn branch_path(&self, name: &str) -> PathBuf {
        self.heads.join(name)
    }

    fn write_branch(&self, name: &str, commit: Option<&Hash>) -> Result<()> {
        let path = self.branch_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_path(parent)?;
        }

        let content = commit.map(Hash::to_hex).unwrap_or_default();
        self.atomic_write(&path, &content)?;
        debug!(branch = name, commit = %content, "branch updated");
        Ok(())
    }

    /// atomic write: temp -> fsync -> rename
    fn atomic_write(&self, path: &Path, content: &str) -> Result<()> {
        fs::create_dir_all(&self.tmp).with_path(&self.tmp)?;
        let tmp_path = self.tmp.join(uuid::Uuid::new_v4().to_string());
        {
            let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
            tmp_file.write_all(content.as_bytes()).with_path(&tmp_path)?;
            tmp_file.sync_all().with_path(&tmp_path)?;
        }
        fs::rename(&tmp_path, path).with_path(path)?;
        Ok(())
    }
}

/// recursively collect branch names from directory
fn collect_branches(base: &Path, dir: &Path, branches: &mut Vec<String>) -> Result<()> {
    for entry in fs::read_dir(dir).with_path(dir)? {
        let entry = entry.with_path(dir)?;
        let path = entry.path();

        if path.is_dir() {
            collect_branches(base, &path, branches)?;
        } else if path.is_file() {
            if let Ok(rel) = path.strip_prefix(base) {
                let name = rel
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                branches.push(name);
            }
        }
    }
    Ok(())
}

/// validate branch name
pub fn validate_branch_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidBranchName("empty branch name".to_string()));
    }

    if name.starts_with('/') || name.ends_with('/') {
        return Err(Error::InvalidBranchName(format!(
            "branch name cannot start or end with '/': {}",
            name
        )));
    }

    if name.contains("//") {
        return Err(Error::InvalidBranchName(format!(
            "branch name cannot contain '//': {}",
            name
        )));
    }

    if name.contains('\0') || name.contains('\\') || name.chars().any(char::is_whitespace) {
        return Err(Error::InvalidBranchName(format!(
            "branch name contains a forbidden character: {:?}",
            name
        )));
    }

    // check for path traversal
    for component in name.split('/') {
        if component == "." || component == ".." {
            return Err(Error::InvalidBranchName(format!(
                "branch name cannot contain '.' or '..': {}",
                name
            )));
        }
    }

    Ok(())
}
