use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hash::Hash;
use crate::object::{read_commit, ObjectStore};
use crate::types::Tree;

/// an immutable snapshot: root tree, parent link and message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// snapshot of every tracked file
    pub tree: Tree,
    /// previous commit on the branch (none for the first commit)
    #[serde(default)]
    pub parent: Option<Hash>,
    pub message: String,
}

impl Commit {
    pub fn new(tree: Tree, parent: Option<Hash>, message: impl Into<String>) -> Self {
        Self {
            tree,
            parent,
            message: message.into(),
        }
    }

    /// is this an initial commit (no parent)
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// load the parent commit from the store
    pub fn parent_commit(&self, store: &ObjectStore) -> Result<Option<Commit>> {
        match &self.parent {
            Some(hash) => read_commit(store, hash).map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::write_commit;
    use tempfile::tempdir;

    #[test]
    fn test_commit_new() {
        let c = Commit::new(Tree::new(), None, "message");
        assert!(c.tree.is_empty());
        assert_eq!(c.message, "message");
        assert!(c.is_root());
    }

    #[test]
    fn test_parent_commit() {
        let dir = tempdir().unwrap();
        let store = ObjectStore::new(dir.path().join("objects"), dir.path().join("tmp"));

        let first = Commit::new(Tree::from_entries([("a", Hash::of(b"a"))]), None, "first");
        let first_hash = write_commit(&store, &first).unwrap();

        let second = Commit::new(Tree::new(), Some(first_hash), "second");
        assert!(!second.is_root());
        assert_eq!(second.parent_commit(&store).unwrap(), Some(first.clone()));
        assert_eq!(first.parent_commit(&store).unwrap(), None);
    }

    #[test]
    fn test_commit_cbor_roundtrip() {
        let c = Commit::new(
            Tree::from_entries([("dir/file.txt", Hash::of(b"x"))]),
            Some(Hash::of(b"parent")),
            "message",
        );

        let mut bytes = Vec::new();
        ciborium::into_writer(&c, &mut bytes).unwrap();

        let parsed: Commit = ciborium::from_reader(&bytes[..]).unwrap();
        assert_eq!(c, parsed);
    }
}
