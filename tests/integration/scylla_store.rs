use thought_tree::{
    BranchManager, DbClient, HierarchyService,
    config::{AppConfig, ScyllaConfig},
    repositories::scylla_stores,
    store::Stores,
};

async fn setup_test_stores() -> Stores {
    let scylla_config = ScyllaConfig {
        nodes: vec!["localhost:9042".to_string()],
        keyspace: "thought_tree_test".to_string(),
        username: None,
        password: None,
    };

    let db_client = DbClient::new(&scylla_config)
        .await
        .expect("Failed to connect to test database");

    scylla_stores(db_client)
}

#[tokio::test]
#[ignore] // Requires running ScyllaDB
async fn test_append_and_branch() {
    let stores = setup_test_stores().await;
    let mut manager = BranchManager::new(stores.clone(), AppConfig::default());

    let started = manager.start_session().await.unwrap();
    let session_id = started.session.session_id;
    let main = started.root_branch.branch_id;

    manager.append_message(session_id, main, "A").await.unwrap();
    let b = manager.append_message(session_id, main, "B").await.unwrap();
    let created = manager
        .create_branch(session_id, main, b.thought_id)
        .await
        .unwrap();

    assert_eq!(created.branch.name, "B");
    assert!(created.origin.is_some());

    let tree = HierarchyService::new(stores)
        .session_tree(session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tree.node_count(), 3);
    assert!(tree.children[0].children[0].thought.is_branch_origin);
}

#[tokio::test]
#[ignore] // Requires running ScyllaDB
async fn test_sessions_are_listed_and_reopened() {
    let stores = setup_test_stores().await;
    let mut manager = BranchManager::new(stores.clone(), AppConfig::default());

    let started = manager.start_session().await.unwrap();
    let session_id = started.session.session_id;
    manager
        .append_message(session_id, started.root_branch.branch_id, "hello")
        .await
        .unwrap();

    let sessions = manager.list_sessions().await.unwrap();
    let listed = sessions
        .iter()
        .find(|s| s.session_id == session_id)
        .unwrap();
    assert!(listed.updated_at >= listed.created_at);

    let mut reopened = BranchManager::new(stores, AppConfig::default());
    let root = reopened.open_session(session_id).await.unwrap();
    assert_eq!(root.branch_id, started.root_branch.branch_id);
    assert_eq!(reopened.visible_messages().len(), 1);
}
