use async_trait::async_trait;
use scylla::IntoTypedRows;
use scylla::query::Query;
use uuid::Uuid;

use crate::db::{BranchRow, DbClient, DbError};
use crate::domain::Branch;
use crate::store::{BranchStore, StoreError};

#[derive(Clone)]
pub struct BranchRepository {
    client: DbClient,
}

impl BranchRepository {
    pub fn new(client: DbClient) -> Self {
        Self { client }
    }

    /// Insert a new branch
    pub async fn insert_branch(&self, branch: &Branch) -> Result<(), DbError> {
        let row = BranchRow::from_branch(branch);
        let query = Query::new(crate::db::queries::INSERT_BRANCH);

        self.client
            .session()
            .query(
                query,
                (
                    row.session_id,
                    row.branch_id,
                    row.branch_name,
                    row.parent_branch_id,
                    row.root_thought_id,
                    row.created_at,
                ),
            )
            .await?;

        Ok(())
    }

    /// Get all branches of a session, oldest first
    pub async fn get_branches_by_session(&self, session_id: Uuid) -> Result<Vec<Branch>, DbError> {
        let query = Query::new(crate::db::queries::SELECT_BRANCHES_BY_SESSION);

        let result = self.client.session().query(query, (session_id,)).await?;

        let rows = result.rows.unwrap_or_default();
        let mut branches = Vec::new();

        for row in rows.into_typed::<BranchRow>() {
            let row =
                row.map_err(|e| DbError::InvalidData(format!("Failed to parse branch row: {}", e)))?;
            branches.push(row.to_branch());
        }

        Ok(branches)
    }
}

#[async_trait]
impl BranchStore for BranchRepository {
    async fn add_branch(&self, branch: &Branch) -> Result<Uuid, StoreError> {
        self.insert_branch(branch).await?;
        Ok(branch.branch_id)
    }

    async fn branches_by_session(&self, session_id: Uuid) -> Result<Vec<Branch>, StoreError> {
        Ok(self.get_branches_by_session(session_id).await?)
    }
}
