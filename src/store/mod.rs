//! Store interfaces the core reads and writes through.
//!
//! Each call is atomic on its own; nothing here offers multi-record
//! transactions. Handles are bundled into [`Stores`] and injected into the
//! services.

mod error;
mod in_memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{Branch, Session, Thought};

pub use error::StoreError;
pub use in_memory::InMemoryStore;

#[async_trait]
pub trait ThoughtStore: Send + Sync {
    async fn add_thought(&self, thought: &Thought) -> Result<Uuid, StoreError>;

    async fn thoughts_by_session(&self, session_id: Uuid) -> Result<Vec<Thought>, StoreError>;

    async fn thoughts_by_branch(&self, branch_id: Uuid) -> Result<Vec<Thought>, StoreError>;
}

#[async_trait]
pub trait BranchStore: Send + Sync {
    async fn add_branch(&self, branch: &Branch) -> Result<Uuid, StoreError>;

    async fn branches_by_session(&self, session_id: Uuid) -> Result<Vec<Branch>, StoreError>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn add_session(&self, session: &Session) -> Result<Uuid, StoreError>;

    /// Advance the session's `updated_at` to `at`.
    async fn touch_session(&self, session_id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError>;

    async fn list_sessions(&self) -> Result<Vec<Session>, StoreError>;
}

/// The three store handles the services depend on.
#[derive(Clone)]
pub struct Stores {
    pub thoughts: Arc<dyn ThoughtStore>,
    pub branches: Arc<dyn BranchStore>,
    pub sessions: Arc<dyn SessionStore>,
}

impl Stores {
    pub fn new(
        thoughts: Arc<dyn ThoughtStore>,
        branches: Arc<dyn BranchStore>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            thoughts,
            branches,
            sessions,
        }
    }

    /// All three interfaces served by one store value.
    pub fn from_shared<S>(store: Arc<S>) -> Self
    where
        S: ThoughtStore + BranchStore + SessionStore + 'static,
    {
        Self {
            thoughts: store.clone(),
            branches: store.clone(),
            sessions: store,
        }
    }

    pub fn in_memory() -> Self {
        Self::from_shared(Arc::new(InMemoryStore::new()))
    }
}
