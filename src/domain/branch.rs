use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::truncate_chars;

/// Longest source excerpt used for a derived branch name.
pub const BRANCH_NAME_MAX_CHARS: usize = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Branch {
    pub branch_id: Uuid,
    pub session_id: Uuid,
    pub name: String,
    pub parent_branch_id: Option<Uuid>,
    pub root_thought_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Branch {
    /// The main branch every session starts with.
    pub fn new_root(session_id: Uuid, name: String) -> Self {
        Branch {
            branch_id: Uuid::now_v7(),
            session_id,
            name,
            parent_branch_id: None,
            root_thought_id: None,
            created_at: Utc::now(),
        }
    }

    /// A branch spawned from `root_thought_id`, a message of `parent_branch_id`.
    pub fn new_child(
        session_id: Uuid,
        parent_branch_id: Uuid,
        root_thought_id: Uuid,
        name: String,
    ) -> Self {
        Branch {
            branch_id: Uuid::now_v7(),
            session_id,
            name,
            parent_branch_id: Some(parent_branch_id),
            root_thought_id: Some(root_thought_id),
            created_at: Utc::now(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_branch_id.is_none()
    }
}

/// Name for a branch spawned from a message with content `source`.
///
/// Falls back to a counter-based name when the source message could not be
/// resolved; `existing_branches` is the number of branches already recorded
/// for the session.
pub fn derive_branch_name(source: Option<&str>, existing_branches: usize) -> String {
    match source {
        Some(content) => truncate_chars(content, BRANCH_NAME_MAX_CHARS),
        None => format!("Branch {}", existing_branches + 1),
    }
}

/// Sort branches into creation order, identifier breaking ties.
pub fn sort_branches(branches: &mut [Branch]) {
    branches.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.branch_id.cmp(&b.branch_id))
    });
}
