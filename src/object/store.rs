use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{walk_error, Error, IoResultExt, Result};
use crate::hash::Hash;

/// content-addressed object storage sharded by the first hash byte
///
/// blobs and serialized commit records share this one addressing scheme.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    objects: PathBuf,
    tmp: PathBuf,
}

impl ObjectStore {
    /// open a store rooted at `objects`, using `tmp` for atomic writes
    pub fn new(objects: impl Into<PathBuf>, tmp: impl Into<PathBuf>) -> Self {
        Self {
            objects: objects.into(),
            tmp: tmp.into(),
        }
    }

    /// root directory of the store
    pub fn path(&self) -> &Path {
        &self.objects
    }

    /// write bytes to the store, returning their hash
    ///
    /// writing content that is already stored is a no-op.
    pub fn put(&self, content: &[u8]) -> Result<Hash> {
        let hash = Hash::of(content);

        let (dir, file) = hash.to_path_components();
        let shard = self.objects.join(&dir);
        let object_path = shard.join(&file);

        // deduplication: if the object already exists, we're done
        if object_path.exists() {
            debug!(%hash, "object already stored");
            return Ok(hash);
        }

        fs::create_dir_all(&shard).with_path(&shard)?;
        fs::create_dir_all(&self.tmp).with_path(&self.tmp)?;

        // atomic write: temp -> fsync -> rename
        let tmp_path = self.tmp.join(uuid::Uuid::new_v4().to_string());
        {
            let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
            tmp_file.write_all(content).with_path(&tmp_path)?;
            tmp_file.sync_all().with_path(&tmp_path)?;
        }
        fs::rename(&tmp_path, &object_path).with_path(&object_path)?;

        debug!(%hash, size = content.len(), "stored object");
        Ok(hash)
    }

    /// read an object's bytes
    pub fn get(&self, hash: &Hash) -> Result<Vec<u8>> {
        let path = self.object_path(hash);
        fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ObjectNotFound(*hash)
            } else {
                Error::Io { path, source: e }
            }
        })
    }

    /// remove an object, and its shard directory once empty
    pub fn delete(&self, hash: &Hash) -> Result<()> {
        let path = self.object_path(hash);
        fs::remove_file(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::ObjectNotFound(*hash)
            } else {
                Error::Io {
                    path: path.clone(),
                    source: e,
                }
            }
        })?;

        if let Some(shard) = path.parent() {
            let mut remaining = fs::read_dir(shard).with_path(shard)?;
            if remaining.next().is_none() {
                fs::remove_dir(shard).with_path(shard)?;
            }
        }

        debug!(%hash, "deleted object");
        Ok(())
    }

    /// check if an object exists
    pub fn contains(&self, hash: &Hash) -> bool {
        self.object_path(hash).exists()
    }

    /// get the filesystem path to an object
    pub fn object_path(&self, hash: &Hash) -> PathBuf {
        let (dir, file) = hash.to_path_components();
        self.objects.join(dir).join(file)
    }

    /// list every stored object hash, sorted
    pub fn hashes(&self) -> Result<Vec<Hash>> {
        let mut hashes = Vec::new();
        if !self.objects.exists() {
            return Ok(hashes);
        }

        for entry in WalkDir::new(&self.objects).min_depth(2).max_depth(2) {
            let entry = entry.map_err(|e| walk_error(&self.objects, e))?;
            if !entry.file_type().is_file() {
                continue;
            }

            // reconstruct hash from path: objects/XX/YYYY...
            let path = entry.path();
            let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            let shard_name = path
                .parent()
                .and_then(|p| p.file_name())
                .and_then(|n| n.to_str())
                .unwrap_or("");

            if let Ok(hash) = Hash::from_hex(&format!("{}{}", shard_name, file_name)) {
                hashes.push(hash);
            }
        }

        hashes.sort();
        Ok(hashes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn test_store() -> (tempfile::TempDir, ObjectStore) {
        let dir = tempdir().unwrap();
        let store = ObjectStore::new(dir.path().join("objects"), dir.path().join("tmp"));
        (dir, store)
    }

    #[test]
    fn test_put_and_get() {
        let (_dir, store) = test_store();

        let content = b"hello, world!";
        let hash = store.put(content).unwrap();

        assert!(store.contains(&hash));
        assert_eq!(store.get(&hash).unwrap(), content);
    }

    #[test]
    fn test_put_deduplicates() {
        let (_dir, store) = test_store();

        let h1 = store.put(b"duplicate content").unwrap();
        let h2 = store.put(b"duplicate content").unwrap();

        assert_eq!(h1, h2);
        assert_eq!(store.hashes().unwrap(), vec![h1]);
    }

    #[test]
    fn test_object_path_structure() {
        let (_dir, store) = test_store();

        let hash = store.put(b"test").unwrap();
        let path = store.object_path(&hash);

        let hex = hash.to_hex();
        assert!(path.ends_with(format!("{}/{}", &hex[..2], &hex[2..])));
        assert!(path.is_file());
    }

    #[test]
    fn test_get_missing() {
        let (_dir, store) = test_store();

        let result = store.get(&Hash::of(b"never stored"));
        assert!(matches!(result, Err(Error::ObjectNotFound(_))));
    }

    #[test]
    fn test_delete_removes_empty_shard() {
        let (_dir, store) = test_store();

        let hash = store.put(b"short lived").unwrap();
        let shard = store.object_path(&hash).parent().unwrap().to_path_buf();
        assert!(shard.is_dir());

        store.delete(&hash).unwrap();
        assert!(!store.contains(&hash));
        assert!(!shard.exists());
    }

    #[test]
    fn test_delete_keeps_shared_shard() {
        let (_dir, store) = test_store();

        // find two contents landing in the same shard
        let first = store.put(b"content 0").unwrap();
        let (shard_prefix, _) = first.to_path_components();
        let mut i = 1;
        let second = loop {
            let content = format!("content {}", i);
            if Hash::of(content.as_bytes()).to_path_components().0 == shard_prefix {
                break store.put(content.as_bytes()).unwrap();
            }
            i += 1;
        };

        store.delete(&first).unwrap();
        assert!(store.contains(&second));
        assert!(store.object_path(&second).parent().unwrap().is_dir());
    }

    #[test]
    fn test_delete_missing() {
        let (_dir, store) = test_store();

        let result = store.delete(&Hash::of(b"absent"));
        assert!(matches!(result, Err(Error::ObjectNotFound(_))));
    }

    #[test]
    fn test_hashes_empty_store() {
        let (_dir, store) = test_store();
        assert!(store.hashes().unwrap().is_empty());
    }
}
