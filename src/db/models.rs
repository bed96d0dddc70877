use chrono::{DateTime, Utc};
use scylla::FromRow;
use uuid::Uuid;

use crate::domain::{Branch, Session, Thought};

// Row model shared by thoughts_by_session and thoughts_by_branch
#[derive(Debug, Clone, FromRow)]
pub struct ThoughtRow {
    pub session_id: Uuid,
    pub branch_id: Uuid,
    pub thought_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub is_branch_origin: Option<bool>,
}

impl ThoughtRow {
    pub fn from_thought(thought: &Thought) -> Self {
        ThoughtRow {
            session_id: thought.session_id,
            branch_id: thought.branch_id,
            thought_id: thought.thought_id,
            parent_id: thought.parent_id,
            content: thought.content.clone(),
            created_at: thought.created_at,
            is_branch_origin: Some(thought.is_branch_origin),
        }
    }

    pub fn to_thought(self) -> Thought {
        Thought {
            thought_id: self.thought_id,
            session_id: self.session_id,
            branch_id: self.branch_id,
            parent_id: self.parent_id,
            content: self.content,
            created_at: self.created_at,
            is_branch_origin: self.is_branch_origin.unwrap_or(false),
        }
    }
}

// Row model for branches_by_session table
#[derive(Debug, Clone, FromRow)]
pub struct BranchRow {
    pub session_id: Uuid,
    pub branch_id: Uuid,
    pub branch_name: String,
    pub parent_branch_id: Option<Uuid>,
    pub root_thought_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl BranchRow {
    pub fn from_branch(branch: &Branch) -> Self {
        BranchRow {
            session_id: branch.session_id,
            branch_id: branch.branch_id,
            branch_name: branch.name.clone(),
            parent_branch_id: branch.parent_branch_id,
            root_thought_id: branch.root_thought_id,
            created_at: branch.created_at,
        }
    }

    pub fn to_branch(self) -> Branch {
        Branch {
            branch_id: self.branch_id,
            session_id: self.session_id,
            name: self.branch_name,
            parent_branch_id: self.parent_branch_id,
            root_thought_id: self.root_thought_id,
            created_at: self.created_at,
        }
    }
}

// Row model for thought_sessions table
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub session_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SessionRow {
    pub fn from_session(session: &Session) -> Self {
        SessionRow {
            session_id: session.session_id,
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }

    pub fn to_session(self) -> Session {
        Session {
            session_id: self.session_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}
