use async_trait::async_trait;
use scylla::IntoTypedRows;
use scylla::batch::{Batch, BatchType};
use scylla::query::Query;
use uuid::Uuid;

use crate::db::{DbClient, DbError, ThoughtRow};
use crate::domain::Thought;
use crate::store::{StoreError, ThoughtStore};

#[derive(Clone)]
pub struct ThoughtRepository {
    client: DbClient,
}

impl ThoughtRepository {
    pub fn new(client: DbClient) -> Self {
        Self { client }
    }

    /// Write a thought to both the session and the branch table
    pub async fn insert_thought(&self, thought: &Thought) -> Result<(), DbError> {
        let row = ThoughtRow::from_thought(thought);
        let values = (
            row.session_id,
            row.branch_id,
            row.thought_id,
            row.parent_id,
            row.content,
            row.created_at,
            row.is_branch_origin,
        );

        let mut batch = Batch::new(BatchType::Logged);
        batch.append_statement(crate::db::queries::INSERT_THOUGHT_BY_SESSION);
        batch.append_statement(crate::db::queries::INSERT_THOUGHT_BY_BRANCH);

        self.client
            .session()
            .batch(&batch, vec![values.clone(), values])
            .await?;

        Ok(())
    }

    /// All thoughts of a session, in clustering (chat) order
    pub async fn get_thoughts_by_session(&self, session_id: Uuid) -> Result<Vec<Thought>, DbError> {
        self.select_thoughts(crate::db::queries::SELECT_THOUGHTS_BY_SESSION, session_id)
            .await
    }

    /// All thoughts of a branch, in clustering (chat) order
    pub async fn get_thoughts_by_branch(&self, branch_id: Uuid) -> Result<Vec<Thought>, DbError> {
        self.select_thoughts(crate::db::queries::SELECT_THOUGHTS_BY_BRANCH, branch_id)
            .await
    }

    async fn select_thoughts(&self, cql: &str, partition: Uuid) -> Result<Vec<Thought>, DbError> {
        let query = Query::new(cql);

        let result = self.client.session().query(query, (partition,)).await?;

        let rows = result.rows.unwrap_or_default();
        let mut thoughts = Vec::new();

        for row in rows.into_typed::<ThoughtRow>() {
            let row =
                row.map_err(|e| DbError::InvalidData(format!("Failed to parse thought row: {}", e)))?;
            thoughts.push(row.to_thought());
        }

        Ok(thoughts)
    }
}

#[async_trait]
impl ThoughtStore for ThoughtRepository {
    async fn add_thought(&self, thought: &Thought) -> Result<Uuid, StoreError> {
        self.insert_thought(thought).await?;
        Ok(thought.thought_id)
    }

    async fn thoughts_by_session(&self, session_id: Uuid) -> Result<Vec<Thought>, StoreError> {
        Ok(self.get_thoughts_by_session(session_id).await?)
    }

    async fn thoughts_by_branch(&self, branch_id: Uuid) -> Result<Vec<Thought>, StoreError> {
        Ok(self.get_thoughts_by_branch(branch_id).await?)
    }
}
