//! high-level operations on cube repositories

mod add;
mod branch;
mod commit;
mod log;
mod reachable;
mod show;
mod status;

pub use add::{add, AddSummary};
pub use branch::{create_branch, list_branches, switch, BranchInfo};
pub use commit::commit;
pub use log::{history, log, LogEntry};
pub use reachable::referenced_objects;
pub use show::{cat_file, StoredObject};
pub use status::{status, Change, StagedFile, Status};
