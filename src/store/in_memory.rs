//! In-memory store, used by tests and by embedders that persist elsewhere.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BranchStore, SessionStore, StoreError, ThoughtStore};
use crate::domain::{Branch, Session, Thought};

/// Records are kept in insertion order; queries return them in that order.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Tables>,
}

#[derive(Debug, Default)]
struct Tables {
    sessions: Vec<Session>,
    branches: Vec<Branch>,
    thoughts: Vec<Thought>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of thought records, across sessions.
    pub async fn thought_count(&self) -> usize {
        self.inner.read().await.thoughts.len()
    }

    pub async fn branch_count(&self) -> usize {
        self.inner.read().await.branches.len()
    }
}

#[async_trait]
impl ThoughtStore for InMemoryStore {
    async fn add_thought(&self, thought: &Thought) -> Result<Uuid, StoreError> {
        let mut tables = self.inner.write().await;
        if tables
            .thoughts
            .iter()
            .any(|t| t.thought_id == thought.thought_id)
        {
            return Err(StoreError::Duplicate(thought.thought_id));
        }
        tables.thoughts.push(thought.clone());
        Ok(thought.thought_id)
    }

    async fn thoughts_by_session(&self, session_id: Uuid) -> Result<Vec<Thought>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables
            .thoughts
            .iter()
            .filter(|t| t.session_id == session_id)
            .cloned()
            .collect())
    }

    async fn thoughts_by_branch(&self, branch_id: Uuid) -> Result<Vec<Thought>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables
            .thoughts
            .iter()
            .filter(|t| t.branch_id == branch_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl BranchStore for InMemoryStore {
    async fn add_branch(&self, branch: &Branch) -> Result<Uuid, StoreError> {
        let mut tables = self.inner.write().await;
        if tables
            .branches
            .iter()
            .any(|b| b.branch_id == branch.branch_id)
        {
            return Err(StoreError::Duplicate(branch.branch_id));
        }
        tables.branches.push(branch.clone());
        Ok(branch.branch_id)
    }

    async fn branches_by_session(&self, session_id: Uuid) -> Result<Vec<Branch>, StoreError> {
        let tables = self.inner.read().await;
        Ok(tables
            .branches
            .iter()
            .filter(|b| b.session_id == session_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn add_session(&self, session: &Session) -> Result<Uuid, StoreError> {
        let mut tables = self.inner.write().await;
        if tables
            .sessions
            .iter()
            .any(|s| s.session_id == session.session_id)
        {
            return Err(StoreError::Duplicate(session.session_id));
        }
        tables.sessions.push(session.clone());
        Ok(session.session_id)
    }

    async fn touch_session(&self, session_id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        let mut tables = self.inner.write().await;
        let session = tables
            .sessions
            .iter_mut()
            .find(|s| s.session_id == session_id)
            .ok_or(StoreError::SessionNotFound(session_id))?;
        session.touch(at);
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, StoreError> {
        Ok(self.inner.read().await.sessions.clone())
    }
}
