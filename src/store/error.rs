use thiserror::Error;
use uuid::Uuid;

use crate::db::DbError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Session {0} not found")]
    SessionNotFound(Uuid),

    #[error("Record {0} already exists")]
    Duplicate(Uuid),
}
