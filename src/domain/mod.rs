pub mod branch;
pub mod session;
pub mod thought;
pub mod tree;

pub use branch::{BRANCH_NAME_MAX_CHARS, Branch, derive_branch_name, sort_branches};
pub use session::{Session, sort_sessions_newest_first};
pub use thought::{BRANCH_ORIGIN_MARKER, Thought, sort_chronologically};
pub use tree::TreeNode;
