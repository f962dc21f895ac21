pub mod commit;
pub mod store;

pub use commit::{decode_commit, encode_commit, read_commit, write_commit};
pub use store::ObjectStore;
