//! the staging area: a durable `path -> hash` mapping
//!
//! every mutation is written through to disk before returning. entries are
//! kept sorted by path (byte order), which is the order `list` reports and
//! the order commits insert files into their tree. besides entries the index
//! holds staged removals: committed paths the next commit drops.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, IoResultExt, Result};
use crate::hash::Hash;
use crate::object::ObjectStore;

/// format tag written into the index file
pub const INDEX_FORMAT: &str = "cube-index";

/// current index schema version
pub const INDEX_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct IndexFile {
    format: String,
    version: u32,
    entries: BTreeMap<String, Hash>,
    #[serde(default)]
    removed: BTreeSet<String>,
}

/// staged `path -> hash` entries backed by a file
#[derive(Debug)]
pub struct Index {
    path: PathBuf,
    tmp: PathBuf,
    entries: BTreeMap<String, Hash>,
    removed: BTreeSet<String>,
}

impl Index {
    /// load the index at `path`, creating an empty one if absent
    pub fn load(path: impl Into<PathBuf>, tmp: impl Into<PathBuf>) -> Result<Self> {
        let mut index = Self {
            path: path.into(),
            tmp: tmp.into(),
            entries: BTreeMap::new(),
            removed: BTreeSet::new(),
        };

        if !index.path.exists() {
            debug!(path = %index.path.display(), "bootstrapping empty index");
            index.save()?;
            return Ok(index);
        }

        let bytes = fs::read(&index.path).with_path(&index.path)?;
        let file: IndexFile = ciborium::from_reader(&bytes[..]).map_err(|e| Error::CorruptIndex {
            path: index.path.clone(),
            message: e.to_string(),
        })?;
        if file.format != INDEX_FORMAT || file.version != INDEX_VERSION {
            return Err(Error::CorruptIndex {
                path: index.path.clone(),
                message: format!("unsupported format {} v{}", file.format, file.version),
            });
        }

        index.entries = file.entries;
        index.removed = file.removed;
        Ok(index)
    }

    /// path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// stage `path -> hash`, releasing the blob previously staged there
    ///
    /// the released blob is deleted from `store` unless another entry or
    /// `keep` still references it. a staged removal of `path` is dropped.
    pub fn add(
        &mut self,
        store: &ObjectStore,
        path: &str,
        hash: Hash,
        keep: &HashSet<Hash>,
    ) -> Result<()> {
        self.removed.remove(path);
        let previous = self.entries.insert(path.to_string(), hash);
        self.save()?;

        match previous {
            Some(old) if old != hash => {
                debug!(path, %old, new = %hash, "overwrote staged entry");
                self.release(store, &old, keep)?;
            }
            Some(_) => debug!(path, "entry unchanged"),
            None => debug!(path, %hash, "staged new entry"),
        }
        Ok(())
    }

    /// unstage `path`, releasing its blob; returns the removed hash
    pub fn remove(
        &mut self,
        store: &ObjectStore,
        path: &str,
        keep: &HashSet<Hash>,
    ) -> Result<Option<Hash>> {
        let removed = self.entries.remove(path);
        if let Some(hash) = removed {
            self.save()?;
            self.release(store, &hash, keep)?;
        }
        Ok(removed)
    }

    /// stage the removal of `path`, unstaging any entry it had
    pub fn stage_removal(
        &mut self,
        store: &ObjectStore,
        path: &str,
        keep: &HashSet<Hash>,
    ) -> Result<()> {
        let previous = self.entries.remove(path);
        self.removed.insert(path.to_string());
        self.save()?;

        debug!(path, "staged removal");
        if let Some(hash) = previous {
            self.release(store, &hash, keep)?;
        }
        Ok(())
    }

    /// drop every entry and removal without touching the object store
    pub fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.removed.clear();
        self.save()
    }

    /// staged hash for `path`
    pub fn get(&self, path: &str) -> Option<Hash> {
        self.entries.get(path).copied()
    }

    /// staged entries sorted by path
    pub fn list(&self) -> impl Iterator<Item = (&str, Hash)> + '_ {
        self.entries.iter().map(|(p, h)| (p.as_str(), *h))
    }

    /// is a removal of `path` staged
    pub fn is_removed(&self, path: &str) -> bool {
        self.removed.contains(path)
    }

    /// staged removals sorted by path
    pub fn removals(&self) -> impl Iterator<Item = &str> + '_ {
        self.removed.iter().map(String::as_str)
    }

    /// number of staged entries, removals excluded
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// is nothing staged, neither entries nor removals
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.removed.is_empty()
    }

    /// delete an unreferenced blob
    fn release(&self, store: &ObjectStore, hash: &Hash, keep: &HashSet<Hash>) -> Result<()> {
        if keep.contains(hash) || self.entries.values().any(|h| h == hash) {
            debug!(%hash, "blob still referenced, keeping");
            return Ok(());
        }
        if store.contains(hash) {
            store.delete(hash)?;
        }
        Ok(())
    }

    /// atomically replace the backing file
    fn save(&self) -> Result<()> {
        let file = IndexFile {
            format: INDEX_FORMAT.to_string(),
            version: INDEX_VERSION,
            entries: self.entries.clone(),
            removed: self.removed.clone(),
        };
        let mut bytes = Vec::new();
        ciborium::into_writer(&file, &mut bytes)?;

        fs::create_dir_all(&self.tmp).with_path(&self.tmp)?;
        let tmp_path = self.tmp.join(uuid::Uuid::new_v4().to_string());
        {
            let mut tmp_file = File::create(&tmp_path).with_path(&tmp_path)?;
            tmp_file.write_all(&bytes).with_path(&tmp_path)?;
            tmp_file.sync_all().with_path(&tmp_path)?;
        }
        fs::rename(&tmp_path, &self.path).with_path(&self.path)?;
        Ok(())
    }
}
