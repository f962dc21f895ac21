use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, IoResultExt, Result};
use crate::ignore::IgnoreRules;
use crate::index::Index;
use crate::object::ObjectStore;
use crate::refs::{validate_branch_name, RefStore};

/// metadata directory created inside the workspace
pub const META_DIR: &str = ".cube";

/// ignore file read from the workspace root
pub const IGNORE_FILE: &str = ".cubeignore";

/// result of [`Repo::init`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    Created,
    AlreadyInitialized,
}

/// a cube repository: a workspace plus its metadata root
#[derive(Debug)]
pub struct Repo {
    workdir: PathBuf,
    root: PathBuf,
    config: Config,
    objects: ObjectStore,
    refs: RefStore,
}

impl Repo {
    /// initialize a repository in `workdir` with the default configuration
    pub fn init(workdir: &Path) -> Result<(Self, InitOutcome)> {
        Self::init_with_config(workdir, Config::default())
    }

    /// initialize a repository in `workdir`
    ///
    /// an existing repository is opened untouched. a failed initialization
    /// removes the partially created metadata root.
    pub fn init_with_config(workdir: &Path, config: Config) -> Result<(Self, InitOutcome)> {
        let root = workdir.join(META_DIR);
        if root.is_dir() {
            info!(path = %root.display(), "repository already initialized");
            return Ok((Self::open(workdir)?, InitOutcome::AlreadyInitialized));
        }
        validate_branch_name(&config.default_branch)?;

        match Self::create(workdir, &root, config) {
            Ok(repo) => {
                info!(path = %repo.root.display(), branch = %repo.config.default_branch, "initialized repository");
                Ok((repo, InitOutcome::Created))
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(&root) {
                    warn!(path = %root.display(), error = %cleanup, "failed to remove partial repository");
                }
                Err(e)
            }
        }
    }

    fn create(workdir: &Path, root: &Path, config: Config) -> Result<Self> {
        // create directory structure
        fs::create_dir_all(root.join("objects")).with_path(root)?;
        fs::create_dir_all(root.join("refs/heads")).with_path(root)?;
        fs::create_dir_all(root.join("tmp")).with_path(root)?;
        config.save(&root.join("config.toml"))?;

        let repo = Self::from_parts(workdir, config)?;
        Index::load(repo.index_path(), repo.tmp_path())?;
        repo.refs.create_empty_branch(&repo.config.default_branch)?;
        repo.refs.write_head(&repo.config.default_branch)?;
        Ok(repo)
    }

    /// open the repository of `workdir`
    pub fn open(workdir: &Path) -> Result<Self> {
        let root = workdir.join(META_DIR);
        if !root.join("HEAD").is_file() {
            return Err(Error::NotInitialized(workdir.to_path_buf()));
        }

        let config = Config::load(&root.join("config.toml"))?;
        Self::from_parts(workdir, config)
    }

    fn from_parts(workdir: &Path, config: Config) -> Result<Self> {
        let workdir = fs::canonicalize(workdir).with_path(workdir)?;
        let root = workdir.join(META_DIR);
        debug!(root = %root.display(), "opened repository");

        Ok(Self {
            objects: ObjectStore::new(root.join("objects"), root.join("tmp")),
            refs: RefStore::new(&root),
            workdir,
            root,
            config,
        })
    }

    /// delete the whole metadata root; the workspace is left alone
    pub fn destroy(self) -> Result<()> {
        Self::destroy_in(&self.workdir).map(|_| ())
    }

    /// delete the metadata root of `workdir`, even a partially initialized
    /// one; returns the removed path
    pub fn destroy_in(workdir: &Path) -> Result<PathBuf> {
        let root = workdir.join(META_DIR);
        if !root.is_dir() {
            return Err(Error::NotInitialized(workdir.to_path_buf()));
        }
        fs::remove_dir_all(&root).with_path(&root)?;
        info!(path = %root.display(), "removed repository metadata");
        Ok(root)
    }

    /// workspace root path
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// metadata root path
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// repository configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// object store
    pub fn objects(&self) -> &ObjectStore {
        &self.objects
    }

    /// HEAD and branch pointers
    pub fn refs(&self) -> &RefStore {
        &self.refs
    }

    /// load the staging index
    pub fn index(&self) -> Result<Index> {
        Index::load(self.index_path(), self.tmp_path())
    }

    /// ignore rules from the workspace ignore file and the config
    pub fn ignore_rules(&self) -> Result<IgnoreRules> {
        IgnoreRules::load(&self.workdir, &self.config.ignore)
    }

    /// path to config.toml
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// path to the index file
    pub fn index_path(&self) -> PathBuf {
        self.root.join("index")
    }

    /// path to objects directory
    pub fn objects_path(&self) -> PathBuf {
        self.root.join("objects")
    }

    /// path to branch files
    pub fn heads_path(&self) -> PathBuf {
        self.root.join("refs/heads")
    }

    /// path to tmp directory (for atomic writes)
    pub fn tmp_path(&self) -> PathBuf {
        self.root.join("tmp")
    }
}
