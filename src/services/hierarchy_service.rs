//! Reconstruction of a session's thought hierarchy from flat records.
//!
//! Thoughts link to their predecessor inside a branch; branches link to the
//! message they were spawned from. [`build_hierarchy`] folds both kinds of
//! link into one tree: a branch point gains the spawned branch's first real
//! message (or its origin marker, when nothing else was written) as an extra
//! child after its same-branch continuation.

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::ServiceError;
use crate::domain::{Branch, Thought, TreeNode, sort_branches, sort_chronologically};
use crate::store::Stores;

/// Build the session tree. Returns `None` when there is nothing to render:
/// no thoughts, no root branch, or a root branch without a first message.
pub fn build_hierarchy(thoughts: &[Thought], branches: &[Branch]) -> Option<TreeNode> {
    if thoughts.is_empty() {
        return None;
    }

    let index = HierarchyIndex::new(thoughts, branches);
    let root_branch = index.root_branch()?;
    let root = index.branch_start(root_branch.branch_id)?;

    index.walk(root)
}

struct HierarchyIndex<'a> {
    branches: Vec<&'a Branch>,
    by_parent: HashMap<Uuid, Vec<&'a Thought>>,
    by_branch: HashMap<Uuid, Vec<&'a Thought>>,
    spawned_from: HashMap<Uuid, Vec<&'a Branch>>,
}

struct Frame<'a> {
    thought: &'a Thought,
    pending: std::vec::IntoIter<&'a Thought>,
    children: Vec<TreeNode>,
}

impl<'a> HierarchyIndex<'a> {
    fn new(thoughts: &'a [Thought], branches: &'a [Branch]) -> Self {
        let mut ordered_thoughts: Vec<&Thought> = thoughts.iter().collect();
        ordered_thoughts.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.thought_id.cmp(&b.thought_id))
        });

        let mut ordered_branches: Vec<&Branch> = branches.iter().collect();
        ordered_branches.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.branch_id.cmp(&b.branch_id))
        });

        let mut by_parent: HashMap<Uuid, Vec<&Thought>> = HashMap::new();
        let mut by_branch: HashMap<Uuid, Vec<&Thought>> = HashMap::new();
        for &thought in &ordered_thoughts {
            if let Some(parent_id) = thought.parent_id {
                by_parent.entry(parent_id).or_default().push(thought);
            }
            by_branch.entry(thought.branch_id).or_default().push(thought);
        }

        let mut spawned_from: HashMap<Uuid, Vec<&Branch>> = HashMap::new();
        for &branch in &ordered_branches {
            if let (Some(_), Some(root_thought_id)) = (branch.parent_branch_id, branch.root_thought_id)
            {
                spawned_from.entry(root_thought_id).or_default().push(branch);
            }
        }

        Self {
            branches: ordered_branches,
            by_parent,
            by_branch,
            spawned_from,
        }
    }

    fn root_branch(&self) -> Option<&'a Branch> {
        self.branches.iter().copied().find(|b| b.is_root())
    }

    fn branch_thoughts(&self, branch_id: Uuid) -> &[&'a Thought] {
        self.by_branch
            .get(&branch_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn branch_start(&self, branch_id: Uuid) -> Option<&'a Thought> {
        self.branch_thoughts(branch_id)
            .iter()
            .copied()
            .find(|t| t.parent_id.is_none())
    }

    /// Where a spawned branch joins the tree: its first non-origin message,
    /// else its first message.
    fn branch_entry(&self, branch_id: Uuid) -> Option<&'a Thought> {
        let thoughts = self.branch_thoughts(branch_id);
        thoughts
            .iter()
            .copied()
            .find(|t| !t.is_branch_origin)
            .or_else(|| thoughts.first().copied())
    }

    fn children_of(&self, thought: &Thought) -> Vec<&'a Thought> {
        let same_branch = self
            .by_parent
            .get(&thought.thought_id)
            .into_iter()
            .flatten()
            .copied()
            .filter(|child| child.branch_id == thought.branch_id);

        let branch_points = self
            .spawned_from
            .get(&thought.thought_id)
            .into_iter()
            .flatten()
            .filter_map(|branch| self.branch_entry(branch.branch_id));

        same_branch.chain(branch_points).collect()
    }

    fn frame(&self, thought: &'a Thought) -> Frame<'a> {
        Frame {
            thought,
            pending: self.children_of(thought).into_iter(),
            children: Vec::new(),
        }
    }

    /// Depth-first construction with an explicit stack. Each thought is
    /// placed at most once, so malformed links cannot loop.
    fn walk(&self, root: &'a Thought) -> Option<TreeNode> {
        let mut visited = HashSet::from([root.thought_id]);
        let mut stack = vec![self.frame(root)];

        while let Some(frame) = stack.last_mut() {
            if let Some(next) = frame.pending.next() {
                if visited.insert(next.thought_id) {
                    let child = self.frame(next);
                    stack.push(child);
                }
                continue;
            }

            let done = stack.pop()?;
            let node = TreeNode {
                thought: done.thought.clone(),
                children: done.children,
            };
            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => return Some(node),
            }
        }

        None
    }
}

/// Every record of one session, in chat and creation order.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub session_id: Uuid,
    pub thoughts: Vec<Thought>,
    pub branches: Vec<Branch>,
}

impl SessionSnapshot {
    pub fn tree(&self) -> Option<TreeNode> {
        build_hierarchy(&self.thoughts, &self.branches)
    }

    pub fn is_multi_branch(&self) -> bool {
        self.branches.len() > 1
    }
}

/// Read side: loads session records from the stores and builds the tree.
#[derive(Clone)]
pub struct HierarchyService {
    stores: Stores,
}

impl HierarchyService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub async fn snapshot(&self, session_id: Uuid) -> Result<SessionSnapshot, ServiceError> {
        let mut thoughts = self.stores.thoughts.thoughts_by_session(session_id).await?;
        let mut branches = self.stores.branches.branches_by_session(session_id).await?;
        sort_chronologically(&mut thoughts);
        sort_branches(&mut branches);

        tracing::debug!(
            "Loaded session {}: {} thought(s), {} branch(es)",
            session_id,
            thoughts.len(),
            branches.len()
        );

        Ok(SessionSnapshot {
            session_id,
            thoughts,
            branches,
        })
    }

    /// `Ok(None)` means the session has nothing to render yet.
    pub async fn session_tree(&self, session_id: Uuid) -> Result<Option<TreeNode>, ServiceError> {
        let tree = self.snapshot(session_id).await?.tree();
        if tree.is_none() {
            tracing::debug!("Session {} has no renderable tree", session_id);
        }
        Ok(tree)
    }
}
