use chrono::Utc;
use uuid::Uuid;

use super::ServiceError;
use crate::config::AppConfig;
use crate::domain::{
    Branch, Session, Thought, derive_branch_name, sort_branches, sort_chronologically,
    sort_sessions_newest_first,
};
use crate::store::Stores;

/// The branch the user is writing in and the messages they can see.
#[derive(Debug, Clone)]
pub struct ActiveBranch {
    pub session_id: Uuid,
    pub branch_id: Uuid,
    pub messages: Vec<Thought>,
}

#[derive(Debug, Clone)]
pub struct StartedSession {
    pub session: Session,
    pub root_branch: Branch,
}

#[derive(Debug, Clone)]
pub struct CreatedBranch {
    pub branch: Branch,
    /// Absent when the source message could not be resolved.
    pub origin: Option<Thought>,
}

/// Sole writer of branch and thought records.
///
/// Holds the single active branch of the client; every write goes through
/// `&mut self`, so writes for a session never overlap.
pub struct BranchManager {
    stores: Stores,
    app_config: AppConfig,
    active: Option<ActiveBranch>,
}

impl BranchManager {
    pub fn new(stores: Stores, app_config: AppConfig) -> Self {
        Self {
            stores,
            app_config,
            active: None,
        }
    }

    pub fn active(&self) -> Option<&ActiveBranch> {
        self.active.as_ref()
    }

    /// Messages of the active branch in chat order; empty when nothing is active.
    pub fn visible_messages(&self) -> &[Thought] {
        self.active
            .as_ref()
            .map(|active| active.messages.as_slice())
            .unwrap_or_default()
    }

    /// Create a session together with its root branch and activate it.
    pub async fn start_session(&mut self) -> Result<StartedSession, ServiceError> {
        let session = Session::new();
        self.stores.sessions.add_session(&session).await?;

        let root_branch = Branch::new_root(
            session.session_id,
            self.app_config.root_branch_name.clone(),
        );
        self.stores.branches.add_branch(&root_branch).await?;

        tracing::info!(
            "Started session {} with root branch {}",
            session.session_id,
            root_branch.branch_id
        );

        self.active = Some(ActiveBranch {
            session_id: session.session_id,
            branch_id: root_branch.branch_id,
            messages: Vec::new(),
        });

        Ok(StartedSession {
            session,
            root_branch,
        })
    }

    /// Activate the root branch of an existing session.
    pub async fn open_session(&mut self, session_id: Uuid) -> Result<Branch, ServiceError> {
        let branches = self.stores.branches.branches_by_session(session_id).await?;
        let root = branches
            .into_iter()
            .filter(Branch::is_root)
            .min_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.branch_id.cmp(&b.branch_id))
            })
            .ok_or(ServiceError::RootBranchMissing(session_id))?;

        self.switch_branch(session_id, root.branch_id).await?;
        Ok(root)
    }

    pub async fn list_sessions(&self) -> Result<Vec<Session>, ServiceError> {
        let mut sessions = self.stores.sessions.list_sessions().await?;
        sort_sessions_newest_first(&mut sessions);
        Ok(sessions)
    }

    /// Branches of a session in creation order.
    pub async fn branches(&self, session_id: Uuid) -> Result<Vec<Branch>, ServiceError> {
        let mut branches = self.stores.branches.branches_by_session(session_id).await?;
        sort_branches(&mut branches);
        Ok(branches)
    }

    /// Load a branch's messages and make it the active branch.
    ///
    /// The branch must be recorded for `session_id`; the active view is left
    /// untouched otherwise.
    pub async fn switch_branch(
        &mut self,
        session_id: Uuid,
        branch_id: Uuid,
    ) -> Result<&[Thought], ServiceError> {
        let known = self
            .stores
            .branches
            .branches_by_session(session_id)
            .await?
            .iter()
            .any(|branch| branch.branch_id == branch_id);
        if !known {
            return Err(ServiceError::BranchNotInSession {
                session_id,
                branch_id,
            });
        }

        let mut messages = self.stores.thoughts.thoughts_by_branch(branch_id).await?;
        if messages.iter().any(|t| t.session_id != session_id) {
            return Err(ServiceError::BranchNotInSession {
                session_id,
                branch_id,
            });
        }
        sort_chronologically(&mut messages);

        tracing::debug!(
            "Switched to branch {} ({} message(s))",
            branch_id,
            messages.len()
        );

        let active = self.active.insert(ActiveBranch {
            session_id,
            branch_id,
            messages,
        });
        Ok(active.messages.as_slice())
    }

    /// Append a message to the active branch, after its latest message.
    pub async fn append_message(
        &mut self,
        session_id: Uuid,
        branch_id: Uuid,
        content: &str,
    ) -> Result<Thought, ServiceError> {
        if content.trim().is_empty() {
            return Err(ServiceError::EmptyContent);
        }

        let active = self.active_for(session_id, branch_id)?;
        let parent_id = active.messages.last().map(|t| t.thought_id);
        let thought = Thought::new(session_id, branch_id, parent_id, content.to_string());

        self.stores.thoughts.add_thought(&thought).await?;
        if let Some(active) = self.active.as_mut() {
            active.messages.push(thought.clone());
        }

        self.stores
            .sessions
            .touch_session(session_id, Utc::now())
            .await?;

        tracing::debug!(
            "Appended thought {} to branch {}",
            thought.thought_id,
            branch_id
        );

        Ok(thought)
    }

    /// Spawn a branch from a visible message of the active branch and
    /// activate it.
    ///
    /// The branch record is written before its origin thought; if the second
    /// write fails the branch remains without an origin and the error is
    /// returned.
    pub async fn create_branch(
        &mut self,
        session_id: Uuid,
        current_branch_id: Uuid,
        from_thought_id: Uuid,
    ) -> Result<CreatedBranch, ServiceError> {
        let active = self.active_for(session_id, current_branch_id)?;
        let source = active
            .messages
            .iter()
            .find(|t| t.thought_id == from_thought_id)
            .cloned();

        let name = match &source {
            Some(source) => derive_branch_name(Some(&source.content), 0),
            None => {
                tracing::warn!(
                    "Branch source {} is not visible in branch {}",
                    from_thought_id,
                    current_branch_id
                );
                let existing = self.stores.branches.branches_by_session(session_id).await?;
                derive_branch_name(None, existing.len())
            }
        };

        let branch = Branch::new_child(session_id, current_branch_id, from_thought_id, name);
        self.stores.branches.add_branch(&branch).await?;

        // The new branch stays active even if the origin write below fails.
        self.active = Some(ActiveBranch {
            session_id,
            branch_id: branch.branch_id,
            messages: Vec::new(),
        });

        let origin = match source {
            Some(source) => {
                let origin = Thought::branch_origin(&source, branch.branch_id);
                self.stores.thoughts.add_thought(&origin).await?;
                if let Some(active) = self.active.as_mut() {
                    active.messages.push(origin.clone());
                }
                Some(origin)
            }
            None => None,
        };

        tracing::info!(
            "Created branch {} '{}' from thought {}",
            branch.branch_id,
            branch.name,
            from_thought_id
        );

        Ok(CreatedBranch { branch, origin })
    }

    fn active_for(&self, session_id: Uuid, branch_id: Uuid) -> Result<&ActiveBranch, ServiceError> {
        let active = self.active.as_ref().ok_or(ServiceError::NoActiveBranch)?;
        if active.branch_id != branch_id {
            return Err(ServiceError::InactiveBranch {
                requested: branch_id,
                active: active.branch_id,
            });
        }
        if active.session_id != session_id {
            return Err(ServiceError::BranchNotInSession {
                session_id,
                branch_id,
            });
        }
        Ok(active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;
    use crate::services::build_hierarchy;
    use crate::store::{InMemoryStore, StoreError, ThoughtStore};
    use async_trait::async_trait;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn manager() -> BranchManager {
        BranchManager::new(Stores::in_memory(), AppConfig::default())
    }

    /// Thought store that rejects writes while `failing` is set.
    struct FlakyThoughts {
        inner: InMemoryStore,
        failing: AtomicBool,
    }

    #[async_trait]
    impl ThoughtStore for FlakyThoughts {
        async fn add_thought(&self, thought: &Thought) -> Result<Uuid, StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(StoreError::Database(DbError::InvalidData(
                    "write rejected".to_string(),
                )));
            }
            self.inner.add_thought(thought).await
        }

        async fn thoughts_by_session(&self, session_id: Uuid) -> Result<Vec<Thought>, StoreError> {
            self.inner.thoughts_by_session(session_id).await
        }

        async fn thoughts_by_branch(&self, branch_id: Uuid) -> Result<Vec<Thought>, StoreError> {
            self.inner.thoughts_by_branch(branch_id).await
        }
    }

    #[tokio::test]
    async fn test_start_session_activates_empty_root_branch() {
        let mut manager = manager();

        let started = manager.start_session().await.unwrap();

        assert!(started.root_branch.is_root());
        assert_eq!(started.root_branch.name, "main");
        let active = manager.active().unwrap();
        assert_eq!(active.branch_id, started.root_branch.branch_id);
        assert!(manager.visible_messages().is_empty());
    }

    #[tokio::test]
    async fn test_append_chains_messages() {
        let mut manager = manager();
        let started = manager.start_session().await.unwrap();
        let (session, branch) = (started.session.session_id, started.root_branch.branch_id);

        let a = manager.append_message(session, branch, "A").await.unwrap();
        let b = manager.append_message(session, branch, "B").await.unwrap();

        assert_eq!(a.parent_id, None);
        assert_eq!(b.parent_id, Some(a.thought_id));
        assert_eq!(manager.visible_messages(), &[a, b]);
    }

    #[tokio::test]
    async fn test_append_touches_session() {
        let mut manager = manager();
        let started = manager.start_session().await.unwrap();
        let (session, branch) = (started.session.session_id, started.root_branch.branch_id);

        let thought = manager.append_message(session, branch, "A").await.unwrap();

        let sessions = manager.list_sessions().await.unwrap();
        assert!(sessions[0].updated_at >= thought.created_at);
    }

    #[tokio::test]
    async fn test_whitespace_message_is_rejected_without_writes() {
        let store = Arc::new(InMemoryStore::new());
        let mut manager = BranchManager::new(Stores::from_shared(store.clone()), AppConfig::default());
        let started = manager.start_session().await.unwrap();

        let result = manager
            .append_message(started.session.session_id, started.root_branch.branch_id, "  ")
            .await;

        assert!(matches!(result, Err(ServiceError::EmptyContent)));
        assert_eq!(store.thought_count().await, 0);
    }

    #[tokio::test]
    async fn test_append_to_inactive_branch_is_rejected() {
        let mut manager = manager();
        let started = manager.start_session().await.unwrap();
        let other = Uuid::new_v4();

        let result = manager
            .append_message(started.session.session_id, other, "A")
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::InactiveBranch { requested, .. }) if requested == other
        ));
    }

    #[tokio::test]
    async fn test_append_without_active_branch_is_rejected() {
        let mut manager = manager();

        let result = manager
            .append_message(Uuid::new_v4(), Uuid::new_v4(), "A")
            .await;

        assert!(matches!(result, Err(ServiceError::NoActiveBranch)));
    }

    #[tokio::test]
    async fn test_create_branch_copies_source_as_origin() {
        let mut manager = manager();
        let started = manager.start_session().await.unwrap();
        let (session, main) = (started.session.session_id, started.root_branch.branch_id);
        manager.append_message(session, main, "A").await.unwrap();
        let b = manager.append_message(session, main, "B").await.unwrap();
        manager.append_message(session, main, "C").await.unwrap();

        let created = manager.create_branch(session, main, b.thought_id).await.unwrap();

        assert_eq!(created.branch.name, "B");
        assert_eq!(created.branch.parent_branch_id, Some(main));
        assert_eq!(created.branch.root_thought_id, Some(b.thought_id));
        let origin = created.origin.unwrap();
        assert_eq!(origin.content, "[branch-origin] B");
        assert_eq!(origin.parent_id, None);
        assert!(origin.is_branch_origin);
        assert_eq!(manager.active().unwrap().branch_id, created.branch.branch_id);
        assert_eq!(manager.visible_messages(), &[origin]);
    }

    #[tokio::test]
    async fn test_long_source_truncates_branch_name() {
        let mut manager = manager();
        let started = manager.start_session().await.unwrap();
        let (session, main) = (started.session.session_id, started.root_branch.branch_id);
        let text = "x".repeat(45);
        let source = manager.append_message(session, main, &text).await.unwrap();

        let created = manager
            .create_branch(session, main, source.thought_id)
            .await
            .unwrap();

        assert_eq!(created.branch.name, format!("{}...", "x".repeat(30)));
    }

    #[tokio::test]
    async fn test_unresolved_source_creates_empty_branch() {
        let mut manager = manager();
        let started = manager.start_session().await.unwrap();
        let (session, main) = (started.session.session_id, started.root_branch.branch_id);
        let missing = Uuid::new_v4();

        let created = manager.create_branch(session, main, missing).await.unwrap();

        assert!(created.origin.is_none());
        assert_eq!(created.branch.name, "Branch 2");
        assert_eq!(created.branch.root_thought_id, Some(missing));
        assert!(manager.visible_messages().is_empty());
    }

    #[tokio::test]
    async fn test_appending_after_branch_continues_from_origin() {
        let mut manager = manager();
        let started = manager.start_session().await.unwrap();
        let (session, main) = (started.session.session_id, started.root_branch.branch_id);
        let a = manager.append_message(session, main, "A").await.unwrap();
        let created = manager.create_branch(session, main, a.thought_id).await.unwrap();
        let branch = created.branch.branch_id;

        let d = manager.append_message(session, branch, "D").await.unwrap();

        assert_eq!(d.parent_id, created.origin.map(|o| o.thought_id));
        assert_eq!(d.branch_id, branch);
    }

    #[tokio::test]
    async fn test_switch_branch_loads_in_chat_order() {
        let mut manager = manager();
        let started = manager.start_session().await.unwrap();
        let (session, main) = (started.session.session_id, started.root_branch.branch_id);
        let a = manager.append_message(session, main, "A").await.unwrap();
        manager.append_message(session, main, "B").await.unwrap();
        manager.create_branch(session, main, a.thought_id).await.unwrap();

        let messages: Vec<String> = manager
            .switch_branch(session, main)
            .await
            .unwrap()
            .iter()
            .map(|t| t.content.clone())
            .collect();

        assert_eq!(messages, vec!["A", "B"]);
        assert_eq!(manager.active().unwrap().branch_id, main);
    }

    #[tokio::test]
    async fn test_switch_to_branch_of_other_session_is_rejected() {
        let mut manager = manager();
        let first = manager.start_session().await.unwrap();
        let second = manager.start_session().await.unwrap();
        let (other_session, own_root) = (
            second.session.session_id,
            second.root_branch.branch_id,
        );

        let result = manager
            .switch_branch(other_session, first.root_branch.branch_id)
            .await;

        assert!(matches!(
            result,
            Err(ServiceError::BranchNotInSession { session_id, branch_id })
                if session_id == other_session && branch_id == first.root_branch.branch_id
        ));
        assert_eq!(manager.active().unwrap().branch_id, own_root);
        let appended = manager
            .append_message(other_session, first.root_branch.branch_id, "hello")
            .await;
        assert!(matches!(appended, Err(ServiceError::InactiveBranch { .. })));
    }

    #[tokio::test]
    async fn test_switch_to_unknown_branch_is_rejected() {
        let mut manager = manager();
        let started = manager.start_session().await.unwrap();
        let session = started.session.session_id;
        let unknown = Uuid::new_v4();

        let result = manager.switch_branch(session, unknown).await;

        assert!(matches!(
            result,
            Err(ServiceError::BranchNotInSession { branch_id, .. }) if branch_id == unknown
        ));
        let appended = manager.append_message(session, unknown, "hello").await;
        assert!(appended.is_err());
        let stored = manager
            .stores
            .thoughts
            .thoughts_by_session(session)
            .await
            .unwrap();
        assert!(stored.is_empty());
    }

    #[tokio::test]
    async fn test_open_session_activates_root_branch() {
        let stores = Stores::in_memory();
        let mut writer = BranchManager::new(stores.clone(), AppConfig::default());
        let started = writer.start_session().await.unwrap();
        let (session, main) = (started.session.session_id, started.root_branch.branch_id);
        writer.append_message(session, main, "A").await.unwrap();

        let mut reader = BranchManager::new(stores, AppConfig::default());
        let root = reader.open_session(session).await.unwrap();

        assert_eq!(root.branch_id, main);
        assert_eq!(reader.visible_messages().len(), 1);
    }

    #[tokio::test]
    async fn test_open_unknown_session_fails() {
        let mut manager = manager();
        let missing = Uuid::new_v4();

        let result = manager.open_session(missing).await;

        assert!(matches!(result, Err(ServiceError::RootBranchMissing(id)) if id == missing));
    }

    #[tokio::test]
    async fn test_failed_origin_write_leaves_branch_without_origin() {
        let shared = Arc::new(InMemoryStore::new());
        let thoughts = Arc::new(FlakyThoughts {
            inner: InMemoryStore::new(),
            failing: AtomicBool::new(false),
        });
        let stores = Stores::new(thoughts.clone(), shared.clone(), shared.clone());
        let mut manager = BranchManager::new(stores, AppConfig::default());
        let started = manager.start_session().await.unwrap();
        let (session, main) = (started.session.session_id, started.root_branch.branch_id);
        let a = manager.append_message(session, main, "A").await.unwrap();

        thoughts.failing.store(true, Ordering::SeqCst);
        let result = manager.create_branch(session, main, a.thought_id).await;
        thoughts.failing.store(false, Ordering::SeqCst);

        assert!(matches!(
            result,
            Err(ServiceError::Store(StoreError::Database(_)))
        ));
        assert_eq!(shared.branch_count().await, 2);
        let all_thoughts = thoughts.thoughts_by_session(session).await.unwrap();
        let branches = manager.branches(session).await.unwrap();
        let tree = build_hierarchy(&all_thoughts, &branches).unwrap();
        assert!(tree.is_leaf());
    }
}
