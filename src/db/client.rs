use scylla::{Session, SessionBuilder};
use std::sync::Arc;
use thiserror::Error;

use crate::config::ScyllaConfig;

use super::migration;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Cannot reach the thought store: {0}")]
    ConnectionError(#[from] scylla::transport::errors::NewSessionError),

    #[error("Query error: {0}")]
    QueryError(#[from] scylla::transport::errors::QueryError),

    #[error("Record not found")]
    NotFound,

    #[error("Malformed row: {0}")]
    InvalidData(String),

    #[error("Schema migration failed: {0}")]
    MigrationError(String),
}

/// Shared handle to the ScyllaDB session holding sessions, branches and
/// thoughts. Every repository holds a clone.
#[derive(Clone)]
pub struct DbClient {
    session: Arc<Session>,
}

impl DbClient {
    /// Connect, bring the thought-tree schema up to date and select the
    /// configured keyspace.
    pub async fn new(config: &ScyllaConfig) -> Result<Self, DbError> {
        let mut builder = SessionBuilder::new().known_nodes(&config.nodes);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.user(username, password);
        }
        let session = builder.build().await?;
        tracing::debug!(
            "Connected to {} node(s); applying thought-tree schema",
            config.nodes.len()
        );

        migration::run_migrations(&session, config).await?;
        session.use_keyspace(&config.keyspace, false).await?;
        tracing::info!("Thought store ready in keyspace '{}'", config.keyspace);

        Ok(Self {
            session: Arc::new(session),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }
}
