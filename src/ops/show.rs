use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::decode_commit;
use crate::repo::Repo;
use crate::types::Commit;

/// a stored object, interpreted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredObject {
    Commit(Commit),
    Blob(Vec<u8>),
}

/// read an object, decoding it as a commit when it is one
pub fn cat_file(repo: &Repo, hash: &Hash) -> Result<StoredObject> {
    let bytes = repo.objects().get(hash)?;
    match decode_commit(hash, &bytes) {
        Ok(commit) => Ok(StoredObject::Commit(commit)),
        Err(Error::CorruptObject(_)) => Ok(StoredObject::Blob(bytes)),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{add, commit};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_cat_file() {
        let dir = tempdir().unwrap();
        let (repo, _) = Repo::init(dir.path()).unwrap();
        fs::write(dir.path().join("f.txt"), "payload").unwrap();
        add(&repo, &dir.path().join("f.txt")).unwrap();
        let c1 = commit(&repo, "msg").unwrap();

        match cat_file(&repo, &c1).unwrap() {
            StoredObject::Commit(c) => {
                assert_eq!(c.message, "msg");
                assert_eq!(c.tree.get("f.txt"), Some(Hash::of(b"payload")));
            }
            other => panic!("expected commit, got {other:?}"),
        }

        assert_eq!(
            cat_file(&repo, &Hash::of(b"payload")).unwrap(),
            StoredObject::Blob(b"payload".to_vec())
        );
        assert!(matches!(
            cat_file(&repo, &Hash::of(b"missing")),
            Err(Error::ObjectNotFound(_))
        ));
    }
}
