use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix carried by the copied first message of a spawned branch.
pub const BRANCH_ORIGIN_MARKER: &str = "[branch-origin]";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thought {
    pub thought_id: Uuid,
    pub session_id: Uuid,
    pub branch_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_branch_origin: bool,
}

impl Thought {
    pub fn new(
        session_id: Uuid,
        branch_id: Uuid,
        parent_id: Option<Uuid>,
        content: String,
    ) -> Self {
        Thought {
            thought_id: Uuid::now_v7(),
            session_id,
            branch_id,
            parent_id,
            content,
            created_at: Utc::now(),
            is_branch_origin: false,
        }
    }

    /// Copy of `source` that opens the branch `branch_id`.
    pub fn branch_origin(source: &Thought, branch_id: Uuid) -> Self {
        Thought {
            thought_id: Uuid::now_v7(),
            session_id: source.session_id,
            branch_id,
            parent_id: None,
            content: format!("{} {}", BRANCH_ORIGIN_MARKER, source.content),
            created_at: Utc::now(),
            is_branch_origin: true,
        }
    }

    pub fn is_branch_start(&self) -> bool {
        self.parent_id.is_none()
    }

    /// Content without the origin marker prefix.
    pub fn display_content(&self) -> &str {
        if self.is_branch_origin {
            self.content
                .strip_prefix(BRANCH_ORIGIN_MARKER)
                .map(str::trim_start)
                .unwrap_or(&self.content)
        } else {
            &self.content
        }
    }
}

/// Sort thoughts into chat order: creation time, identifier breaking ties.
pub fn sort_chronologically(thoughts: &mut [Thought]) {
    thoughts.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.thought_id.cmp(&b.thought_id))
    });
}
