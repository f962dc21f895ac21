//! cube - minimal content-addressed version control
//!
//! a workspace gets a `.cube` metadata root holding an object store, a
//! staging index, commits chained by parent links, and branch/HEAD pointers.
//!
//! # Core concepts
//!
//! - **Blob**: file content stored once per distinct SHA-1 digest
//! - **Index**: staged `path -> hash` entries, written through on every change
//! - **Tree**: directory hierarchy rebuilt from flat staged paths
//! - **Commit**: tree + optional parent + message, stored as a versioned CBOR
//!   record in the same object store as blobs
//! - **Branch / HEAD**: named commit pointers and the symbolic active branch
//!
//! # On-disk layout
//!
//! ```text
//! .cube/
//!   HEAD               refs/heads/<branch>
//!   config.toml
//!   index
//!   objects/<2 hex>/<38 hex>
//!   refs/heads/<branch> commit hash, or empty before the first commit
//!   tmp/
//! .cubeignore          glob patterns, one per line
//! ```
//!
//! # Example usage
//!
//! ```no_run
//! use cube::{ops, Repo};
//! use std::path::Path;
//!
//! let (repo, _) = Repo::init(Path::new("/path/to/project")).unwrap();
//! ops::add(&repo, Path::new("src")).unwrap();
//! let hash = ops::commit(&repo, "initial import").unwrap();
//!
//! for entry in ops::log(&repo).unwrap() {
//!     println!("{} {}", entry.hash.short(), entry.commit.message);
//! }
//! # let _ = hash;
//! ```

mod config;
mod error;
mod hash;
mod ignore;
mod index;
mod refs;
mod repo;

pub mod object;
pub mod ops;
pub mod types;
pub mod workspace;

pub use config::Config;
pub use error::{Error, Result};
pub use hash::Hash;
pub use ignore::IgnoreRules;
pub use index::Index;
pub use object::{read_commit, write_commit, ObjectStore};
pub use refs::{validate_branch_name, RefStore};
pub use repo::{InitOutcome, Repo, IGNORE_FILE, META_DIR};
pub use types::{Commit, NodeId, Tree, TreeNode};
