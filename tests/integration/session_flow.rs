use thought_tree::{
    BranchManager, HierarchyService, Stores,
    config::AppConfig,
    domain::{Thought, TreeNode},
    services::ServiceError,
};
use uuid::Uuid;

struct Session {
    stores: Stores,
    manager: BranchManager,
    session_id: Uuid,
    main: Uuid,
}

async fn start() -> Session {
    let stores = Stores::in_memory();
    let mut manager = BranchManager::new(stores.clone(), AppConfig::default());
    let started = manager.start_session().await.unwrap();

    Session {
        stores,
        manager,
        session_id: started.session.session_id,
        main: started.root_branch.branch_id,
    }
}

impl Session {
    async fn say(&mut self, branch_id: Uuid, content: &str) -> Thought {
        self.manager
            .append_message(self.session_id, branch_id, content)
            .await
            .unwrap()
    }

    /// Branch from `from` (a message of `branch_id`); returns the new branch.
    async fn branch(&mut self, branch_id: Uuid, from: Uuid) -> Uuid {
        self.manager
            .switch_branch(self.session_id, branch_id)
            .await
            .unwrap();
        self.manager
            .create_branch(self.session_id, branch_id, from)
            .await
            .unwrap()
            .branch
            .branch_id
    }

    async fn tree(&self) -> Option<TreeNode> {
        HierarchyService::new(self.stores.clone())
            .session_tree(self.session_id)
            .await
            .unwrap()
    }
}

/// Shape of a tree: visible text, origin flag and children, nested.
#[derive(Debug, PartialEq)]
struct Shape {
    text: String,
    origin: bool,
    children: Vec<Shape>,
}

fn shape(node: &TreeNode) -> Shape {
    Shape {
        text: node.thought.display_content().to_string(),
        origin: node.thought.is_branch_origin,
        children: node.children.iter().map(shape).collect(),
    }
}

/// Re-record a tree into a fresh store through the branch manager.
async fn replay(tree: &TreeNode) -> Session {
    let mut session = start().await;
    let main = session.main;
    let root = session.say(main, &tree.thought.content).await;

    let mut pending = vec![(tree, root)];
    while let Some((node, copy)) = pending.pop() {
        let mut copies = Vec::new();
        for child in &node.children {
            session
                .manager
                .switch_branch(session.session_id, copy.branch_id)
                .await
                .unwrap();

            let child_copy = if child.thought.branch_id == node.thought.branch_id {
                session.say(copy.branch_id, &child.thought.content).await
            } else {
                let created = session
                    .manager
                    .create_branch(session.session_id, copy.branch_id, copy.thought_id)
                    .await
                    .unwrap();
                let origin = created.origin.unwrap();
                if child.thought.is_branch_origin {
                    origin
                } else {
                    session
                        .say(created.branch.branch_id, &child.thought.content)
                        .await
                }
            };
            copies.push((child, child_copy));
        }
        pending.extend(copies.into_iter().rev());
    }

    session
}

#[tokio::test]
async fn test_linear_session_is_a_chain() {
    let mut session = start().await;
    let main = session.main;
    for content in ["A", "B", "C"] {
        session.say(main, content).await;
    }

    let tree = session.tree().await.unwrap();

    assert_eq!(tree.depth(), 3);
    let contents: Vec<&str> = tree.iter().map(|n| n.thought.content.as_str()).collect();
    assert_eq!(contents, vec!["A", "B", "C"]);
}

#[tokio::test]
async fn test_branch_origin_is_second_child() {
    let mut session = start().await;
    let main = session.main;
    session.say(main, "A").await;
    let b = session.say(main, "B").await;
    session.say(main, "C").await;

    let spawned = session.branch(main, b.thought_id).await;

    let visible = session.manager.visible_messages();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].content, "[branch-origin] B");
    assert_eq!(visible[0].branch_id, spawned);
    assert!(visible[0].parent_id.is_none());

    let tree = session.tree().await.unwrap();
    let node_b = tree.find(b.thought_id).unwrap();
    assert_eq!(node_b.children.len(), 2);
    assert_eq!(node_b.children[0].thought.content, "C");
    assert!(node_b.children[1].thought.is_branch_origin);
}

#[tokio::test]
async fn test_sibling_branches_follow_creation_order() {
    let mut session = start().await;
    let main = session.main;
    session.say(main, "A").await;
    let b = session.say(main, "B").await;

    let first = session.branch(main, b.thought_id).await;
    session.say(first, "first idea").await;
    let second = session.branch(main, b.thought_id).await;
    session.say(second, "second idea").await;

    let tree = session.tree().await.unwrap();
    let node_b = tree.find(b.thought_id).unwrap();
    let texts: Vec<&str> = node_b
        .children
        .iter()
        .map(|n| n.thought.content.as_str())
        .collect();
    assert_eq!(texts, vec!["first idea", "second idea"]);
}

#[tokio::test]
async fn test_whitespace_message_creates_nothing() {
    let mut session = start().await;
    let main = session.main;

    let result = session
        .manager
        .append_message(session.session_id, main, "  ")
        .await;

    assert!(matches!(result, Err(ServiceError::EmptyContent)));
    let stored = session
        .stores
        .thoughts
        .thoughts_by_session(session.session_id)
        .await
        .unwrap();
    assert!(stored.is_empty());
    assert!(session.tree().await.is_none());
}

#[tokio::test]
async fn test_every_branch_has_one_start() {
    let mut session = start().await;
    let main = session.main;
    let a = session.say(main, "A").await;
    session.say(main, "B").await;
    let side = session.branch(main, a.thought_id).await;
    let x = session.say(side, "X").await;
    let nested = session.branch(side, x.thought_id).await;
    session.say(nested, "Y").await;

    let branches = session.manager.branches(session.session_id).await.unwrap();
    assert_eq!(branches.iter().filter(|b| b.is_root()).count(), 1);

    for branch in &branches {
        let thoughts = session
            .stores
            .thoughts
            .thoughts_by_branch(branch.branch_id)
            .await
            .unwrap();
        let starts = thoughts.iter().filter(|t| t.is_branch_start()).count();
        assert_eq!(starts, 1, "branch {}", branch.name);
    }
}

#[tokio::test]
async fn test_replaying_a_tree_rebuilds_its_shape() {
    let mut session = start().await;
    let main = session.main;
    session.say(main, "A").await;
    let b = session.say(main, "B").await;
    let c = session.say(main, "C").await;

    let first = session.branch(main, b.thought_id).await;
    let d = session.say(first, "D").await;
    session.say(first, "E").await;
    session.branch(main, b.thought_id).await;
    session.branch(first, d.thought_id).await;
    let late = session.branch(main, c.thought_id).await;
    session.say(late, "F").await;

    let original = session.tree().await.unwrap();
    let replayed = replay(&original).await.tree().await.unwrap();

    assert_eq!(original.node_count(), 8);
    assert_eq!(shape(&replayed), shape(&original));
}

#[tokio::test]
async fn test_flatten_visits_parent_before_children() {
    let mut session = start().await;
    let main = session.main;
    session.say(main, "A").await;
    let b = session.say(main, "B").await;
    session.say(main, "C").await;
    session.branch(main, b.thought_id).await;

    let tree = session.tree().await.unwrap();
    let flat = tree.flatten();

    let texts: Vec<&str> = flat.iter().map(|t| t.display_content()).collect();
    assert_eq!(texts, vec!["A", "B", "C", "B"]);
}
