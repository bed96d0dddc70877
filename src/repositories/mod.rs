pub mod branch_repo;
pub mod session_repo;
pub mod thought_repo;

use std::sync::Arc;

pub use branch_repo::BranchRepository;
pub use session_repo::SessionRepository;
pub use thought_repo::ThoughtRepository;

use crate::db::DbClient;
use crate::store::Stores;

/// Store handles backed by one ScyllaDB session.
pub fn scylla_stores(client: DbClient) -> Stores {
    Stores::new(
        Arc::new(ThoughtRepository::new(client.clone())),
        Arc::new(BranchRepository::new(client.clone())),
        Arc::new(SessionRepository::new(client)),
    )
}
