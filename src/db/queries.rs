// CQL statements for the ScyllaDB store. Column order matches the FromRow
// models in `models.rs`.

// thought_sessions queries
pub const INSERT_SESSION: &str = r#"
    INSERT INTO thought_sessions (session_id, created_at, updated_at)
    VALUES (?, ?, ?)
"#;

pub const UPDATE_SESSION_UPDATED_AT: &str = r#"
    UPDATE thought_sessions SET updated_at = ? WHERE session_id = ?
"#;

pub const SELECT_SESSION: &str = r#"
    SELECT session_id, created_at, updated_at
    FROM thought_sessions
    WHERE session_id = ?
"#;

pub const SELECT_ALL_SESSIONS: &str = r#"
    SELECT session_id, created_at, updated_at
    FROM thought_sessions
"#;

// thoughts_by_session / thoughts_by_branch queries
pub const INSERT_THOUGHT_BY_SESSION: &str = r#"
    INSERT INTO thoughts_by_session (
        session_id, branch_id, thought_id, parent_id,
        content, created_at, is_branch_origin
    ) VALUES (?, ?, ?, ?, ?, ?, ?)
"#;

pub const INSERT_THOUGHT_BY_BRANCH: &str = r#"
    INSERT INTO thoughts_by_branch (
        session_id, branch_id, thought_id, parent_id,
        content, created_at, is_branch_origin
    ) VALUES (?, ?, ?, ?, ?, ?, ?)
"#;

pub const SELECT_THOUGHTS_BY_SESSION: &str = r#"
    SELECT session_id, branch_id, thought_id, parent_id,
           content, created_at, is_branch_origin
    FROM thoughts_by_session
    WHERE session_id = ?
"#;

pub const SELECT_THOUGHTS_BY_BRANCH: &str = r#"
    SELECT session_id, branch_id, thought_id, parent_id,
           content, created_at, is_branch_origin
    FROM thoughts_by_branch
    WHERE branch_id = ?
"#;

// branches_by_session queries
pub const INSERT_BRANCH: &str = r#"
    INSERT INTO branches_by_session (
        session_id, branch_id, branch_name, parent_branch_id,
        root_thought_id, created_at
    ) VALUES (?, ?, ?, ?, ?, ?)
"#;

pub const SELECT_BRANCHES_BY_SESSION: &str = r#"
    SELECT session_id, branch_id, branch_name, parent_branch_id,
           root_thought_id, created_at
    FROM branches_by_session
    WHERE session_id = ?
"#;
