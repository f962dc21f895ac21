//! the live working directory as seen by `add` and `status`

use std::fs;
use std::path::{Component, Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{walk_error, Error, IoResultExt, Result};
use crate::hash::Hash;
use crate::ignore::IgnoreRules;

/// one path found while scanning the workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkspaceEntry {
    /// `/` separated path relative to the workspace root
    pub path: String,
    /// true when the ignore rules exclude it
    pub ignored: bool,
}

/// scan files under `start`, deciding for each whether it is ignored
///
/// ignored directories are reported once and not descended into. symbolic
/// links are not followed and not reported. results are in file-name order.
pub fn scan(workdir: &Path, start: &Path, rules: &IgnoreRules) -> Result<Vec<WorkspaceEntry>> {
    let mut entries = Vec::new();
    let mut walker = WalkDir::new(start).sort_by_file_name().into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|e| walk_error(start, e))?;
        let rel = relative_to(workdir, entry.path())?;
        if rel.is_empty() {
            continue;
        }

        if entry.path_is_symlink() {
            debug!(path = %rel, "skipping symlink");
            continue;
        }

        let is_dir = entry.file_type().is_dir();
        if rules.is_ignored(&rel) {
            if is_dir {
                walker.skip_current_dir();
            }
            entries.push(WorkspaceEntry {
                path: rel,
                ignored: true,
            });
            continue;
        }

        if !is_dir {
            entries.push(WorkspaceEntry {
                path: rel,
                ignored: false,
            });
        }
    }

    Ok(entries)
}

/// resolve a user supplied path to a workspace-relative `/` separated path
///
/// relative inputs are taken relative to `workdir`.
pub fn workspace_path(workdir: &Path, path: &Path) -> Result<String> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        workdir.join(path)
    };
    let resolved = fs::canonicalize(&joined).unwrap_or_else(|_| normalize(&joined));
    relative_to(workdir, &resolved)
}

/// hash a workspace file's current content
pub fn hash_file(path: &Path) -> Result<Hash> {
    let content = fs::read(path).with_path(path)?;
    Ok(Hash::of(&content))
}

fn relative_to(workdir: &Path, path: &Path) -> Result<String> {
    let rel = path
        .strip_prefix(workdir)
        .map_err(|_| Error::PathOutsideWorkspace(path.to_path_buf()))?;

    let mut parts = Vec::new();
    for component in rel.components() {
        match component {
            Component::Normal(part) => parts.push(part.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return Err(Error::PathOutsideWorkspace(path.to_path_buf())),
        }
    }
    Ok(parts.join("/"))
}

/// lexical normalization for paths that do not exist on disk
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn workdir() -> (tempfile::TempDir, PathBuf) {
        let dir = tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        (dir, root)
    }

    #[test]
    fn test_scan_reports_files_and_ignored() {
        let (_dir, root) = workdir();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("target/debug")).unwrap();
        fs::create_dir_all(root.join(".cube/objects")).unwrap();
        fs::write(root.join("src/lib.rs"), "lib").unwrap();
        fs::write(root.join("target/debug/app"), "bin").unwrap();
        fs::write(root.join("notes.log"), "log").unwrap();
        fs::write(root.join("README"), "readme").unwrap();

        let rules = IgnoreRules::parse("target\n*.log").unwrap();
        let entries = scan(&root, &root, &rules).unwrap();

        let tracked: Vec<&str> = entries
            .iter()
            .filter(|e| !e.ignored)
            .map(|e| e.path.as_str())
            .collect();
        let ignored: Vec<&str> = entries
            .iter()
            .filter(|e| e.ignored)
            .map(|e| e.path.as_str())
            .collect();

        assert_eq!(tracked, vec!["README", "src/lib.rs"]);
        assert_eq!(ignored, vec![".cube", "notes.log", "target"]);
    }

    #[test]
    fn test_scan_single_file() {
        let (_dir, root) = workdir();
        fs::write(root.join("one.txt"), "1").unwrap();

        let entries = scan(&root, &root.join("one.txt"), &IgnoreRules::default()).unwrap();
        assert_eq!(
            entries,
            vec![WorkspaceEntry {
                path: "one.txt".to_string(),
                ignored: false
            }]
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_skips_symlinks() {
        let (_dir, root) = workdir();
        fs::create_dir_all(root.join("real")).unwrap();
        fs::write(root.join("f.txt"), "f").unwrap();
        fs::write(root.join("real/inner.txt"), "inner").unwrap();
        std::os::unix::fs::symlink(root.join("nowhere"), root.join("dangling")).unwrap();
        std::os::unix::fs::symlink(root.join("real"), root.join("dirlink")).unwrap();

        let entries = scan(&root, &root, &IgnoreRules::default()).unwrap();
        let paths: Vec<&str> = entries.iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["f.txt", "real/inner.txt"]);
    }

    #[test]
    fn test_workspace_path() {
        let (_dir, root) = workdir();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("a/b/c.txt"), "c").unwrap();

        assert_eq!(workspace_path(&root, Path::new("a/b/c.txt")).unwrap(), "a/b/c.txt");
        assert_eq!(workspace_path(&root, Path::new("./a/../a/b")).unwrap(), "a/b");
        assert_eq!(workspace_path(&root, &root.join("a")).unwrap(), "a");
        assert_eq!(workspace_path(&root, Path::new("missing/x")).unwrap(), "missing/x");
    }

    #[test]
    fn test_workspace_path_outside() {
        let (_dir, root) = workdir();
        let result = workspace_path(&root, Path::new("../elsewhere"));
        assert!(matches!(result, Err(Error::PathOutsideWorkspace(_))));
    }

    #[test]
    fn test_hash_file() {
        let (_dir, root) = workdir();
        fs::write(root.join("f"), "hello").unwrap();
        assert_eq!(hash_file(&root.join("f")).unwrap(), Hash::of(b"hello"));
    }
}
