mod commit;
mod tree;

pub use commit::Commit;
pub use tree::{NodeId, Tree, TreeNode};
