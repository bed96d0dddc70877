use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scylla::IntoTypedRows;
use scylla::query::Query;
use uuid::Uuid;

use crate::db::{DbClient, DbError, SessionRow};
use crate::domain::Session;
use crate::store::{SessionStore, StoreError};

#[derive(Clone)]
pub struct SessionRepository {
    client: DbClient,
}

impl SessionRepository {
    pub fn new(client: DbClient) -> Self {
        Self { client }
    }

    pub async fn insert_session(&self, session: &Session) -> Result<(), DbError> {
        let row = SessionRow::from_session(session);
        let query = Query::new(crate::db::queries::INSERT_SESSION);

        self.client
            .session()
            .query(query, (row.session_id, row.created_at, row.updated_at))
            .await?;

        Ok(())
    }

    pub async fn get_session(&self, session_id: Uuid) -> Result<Session, DbError> {
        let query = Query::new(crate::db::queries::SELECT_SESSION);

        let result = self.client.session().query(query, (session_id,)).await?;

        let row = result
            .rows
            .ok_or(DbError::NotFound)?
            .into_typed::<SessionRow>()
            .next()
            .ok_or(DbError::NotFound)?
            .map_err(|e| DbError::InvalidData(format!("Failed to parse session row: {}", e)))?;

        Ok(row.to_session())
    }

    /// Advance `updated_at`; an UPDATE alone would upsert a partial row for
    /// an unknown session, so the session is read first
    pub async fn update_session_activity(
        &self,
        session_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<(), DbError> {
        let mut session = self.get_session(session_id).await?;
        session.touch(at);

        let query = Query::new(crate::db::queries::UPDATE_SESSION_UPDATED_AT);
        self.client
            .session()
            .query(query, (session.updated_at, session_id))
            .await?;

        Ok(())
    }

    pub async fn get_all_sessions(&self) -> Result<Vec<Session>, DbError> {
        let query = Query::new(crate::db::queries::SELECT_ALL_SESSIONS);

        let result = self.client.session().query(query, &[]).await?;

        let rows = result.rows.unwrap_or_default();
        let mut sessions = Vec::new();

        for row in rows.into_typed::<SessionRow>() {
            let row =
                row.map_err(|e| DbError::InvalidData(format!("Failed to parse session row: {}", e)))?;
            sessions.push(row.to_session());
        }

        Ok(sessions)
    }
}

#[async_trait]
impl SessionStore for SessionRepository {
    async fn add_session(&self, session: &Session) -> Result<Uuid, StoreError> {
        self.insert_session(session).await?;
        Ok(session.session_id)
    }

    async fn touch_session(&self, session_id: Uuid, at: DateTime<Utc>) -> Result<(), StoreError> {
        match self.update_session_activity(session_id, at).await {
            Err(DbError::NotFound) => Err(StoreError::SessionNotFound(session_id)),
            other => Ok(other?),
        }
    }

    async fn list_sessions(&self) -> Result<Vec<Session>, StoreError> {
        Ok(self.get_all_sessions().await?)
    }
}
