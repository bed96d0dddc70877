pub mod branch_manager;
pub mod error;
pub mod hierarchy_service;

pub use branch_manager::{ActiveBranch, BranchManager, CreatedBranch, StartedSession};
pub use error::ServiceError;
pub use hierarchy_service::{HierarchyService, SessionSnapshot, build_hierarchy};
