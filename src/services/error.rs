use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Message content is empty")]
    EmptyContent,

    #[error("No branch is active")]
    NoActiveBranch,

    #[error("Branch {requested} is not the active branch ({active})")]
    InactiveBranch { requested: Uuid, active: Uuid },

    #[error("Branch {branch_id} does not belong to session {session_id}")]
    BranchNotInSession { session_id: Uuid, branch_id: Uuid },

    #[error("Session {0} has no root branch")]
    RootBranchMissing(Uuid),

    #[error(transparent)]
    Store(#[from] StoreError),
}
