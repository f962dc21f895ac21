use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::hash::Hash;
use crate::object::ObjectStore;
use crate::types::Commit;

/// format tag written into every commit record
pub const COMMIT_FORMAT: &str = "cube-commit";

/// current commit record schema version
pub const COMMIT_VERSION: u32 = 1;

#[derive(Serialize)]
struct CommitRecordRef<'a> {
    format: &'a str,
    version: u32,
    commit: &'a Commit,
}

#[derive(Deserialize)]
struct CommitRecord {
    format: String,
    version: u32,
    commit: Commit,
}

/// serialize a commit into its stored record (CBOR)
pub fn encode_commit(commit: &Commit) -> Result<Vec<u8>> {
    let record = CommitRecordRef {
        format: COMMIT_FORMAT,
        version: COMMIT_VERSION,
        commit,
    };
    let mut bytes = Vec::new();
    ciborium::into_writer(&record, &mut bytes)?;
    Ok(bytes)
}

/// parse a stored record read under `hash`
pub fn decode_commit(hash: &Hash, bytes: &[u8]) -> Result<Commit> {
    let record: CommitRecord = ciborium::from_reader(bytes).map_err(|e| {
        debug!(%hash, error = %e, "object is not a commit record");
        Error::CorruptObject(*hash)
    })?;

    if record.format != COMMIT_FORMAT || record.version != COMMIT_VERSION {
        debug!(
            %hash,
            format = %record.format,
            version = record.version,
            "unsupported commit record"
        );
        return Err(Error::CorruptObject(*hash));
    }

    Ok(record.commit)
}

/// write a commit to the object store
///
/// the record goes through the same content addressing as file blobs,
/// so its hash is the commit's identity.
pub fn write_commit(store: &ObjectStore, commit: &Commit) -> Result<Hash> {
    let bytes = encode_commit(commit)?;
    store.put(&bytes)
}

/// read a commit from the object store
pub fn read_commit(store: &ObjectStore, hash: &Hash) -> Result<Commit> {
    let bytes = store.get(hash)?;

    // verify hash
    if Hash::of(&bytes) != *hash {
        return Err(Error::CorruptObject(*hash));
    }

    decode_commit(hash, &bytes).inspect_err(|_| warn!(%hash, "unreadable commit object"))
}
