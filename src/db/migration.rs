use scylla::Session;
use std::path::{Path, PathBuf};
use tokio::{
    fs,
    time::{Duration, sleep},
};
use tracing::{debug, error, info, warn};

use crate::config::ScyllaConfig;

use super::DbError;

/// Keyspace name written in the bundled `.cql` files; replaced by the
/// configured keyspace before execution.
const DEFAULT_KEYSPACE: &str = "thought_tree";

const KEYSPACE_SELECT_ATTEMPTS: usize = 6;

#[derive(Debug, Clone, PartialEq)]
enum StatementKind {
    UseKeyspace,
    CreateKeyspace,
    CreateTable(String),
    CreateIndex,
    Other,
}

fn classify(statement: &str) -> StatementKind {
    let upper = statement.to_uppercase();
    if upper.starts_with("USE ") {
        StatementKind::UseKeyspace
    } else if upper.contains("CREATE KEYSPACE") {
        StatementKind::CreateKeyspace
    } else if upper.contains("CREATE TABLE") {
        let table = statement
            .split_whitespace()
            .skip_while(|word| !word.eq_ignore_ascii_case("TABLE"))
            .skip(1)
            .find(|word| {
                !["IF", "NOT", "EXISTS"]
                    .iter()
                    .any(|kw| word.eq_ignore_ascii_case(kw))
            })
            .map(|word| word.split('(').next().unwrap_or(word).to_string())
            .unwrap_or_else(|| "unknown".to_string());
        StatementKind::CreateTable(table)
    } else if upper.contains("CREATE INDEX") {
        StatementKind::CreateIndex
    } else {
        StatementKind::Other
    }
}

/// Split a migration file into single statements, dropping blank lines and
/// `--` comments.
fn split_statements(sql: &str) -> Vec<String> {
    sql.split(';')
        .filter_map(|chunk| {
            let statement = chunk
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with("--"))
                .collect::<Vec<_>>()
                .join(" ");
            (!statement.is_empty()).then_some(statement)
        })
        .collect()
}

async fn migration_files(dir: &Path) -> Result<Vec<PathBuf>, DbError> {
    let mut entries = fs::read_dir(dir).await.map_err(|e| {
        DbError::MigrationError(format!("Failed to read {}: {}", dir.display(), e))
    })?;

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(|e| {
        DbError::MigrationError(format!("Failed to iterate {}: {}", dir.display(), e))
    })? {
        let path = entry.path();
        if path.is_file() && path.extension().and_then(|ext| ext.to_str()) == Some("cql") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Apply every `.cql` file under `migrations/`, in lexicographic order.
///
/// Statements that fail with "already exists" are skipped so the schema can
/// be applied on every start.
pub async fn run_migrations(session: &Session, config: &ScyllaConfig) -> Result<(), DbError> {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("migrations");
    let files = migration_files(&dir).await?;

    if files.is_empty() {
        warn!("No migrations found in '{}'", dir.display());
        return Ok(());
    }

    info!("Applying {} migration file(s)", files.len());
    let mut keyspace_ready = false;

    for path in files {
        let display_path = path.display().to_string();
        let sql = fs::read_to_string(&path).await.map_err(|e| {
            DbError::MigrationError(format!("Failed to read {}: {}", display_path, e))
        })?;
        let sql = sql.replace(DEFAULT_KEYSPACE, &config.keyspace);
        let statements = split_statements(&sql);
        info!("{}: {} statement(s)", display_path, statements.len());

        for (index, statement) in statements.iter().enumerate() {
            let number = index + 1;
            let kind = classify(statement);

            match &kind {
                StatementKind::UseKeyspace => {
                    ensure_keyspace_selected(session, &config.keyspace, number, &display_path)
                        .await?;
                    keyspace_ready = true;
                    continue;
                }
                StatementKind::CreateTable(table) => {
                    debug!("Statement {}: creating table {}", number, table)
                }
                other => debug!("Statement {}: {:?}", number, other),
            }

            if !keyspace_ready && kind != StatementKind::CreateKeyspace {
                ensure_keyspace_selected(session, &config.keyspace, number, &display_path).await?;
                keyspace_ready = true;
            }

            if let Err(err) = session.query(statement.as_str(), &[]).await {
                let message = err.to_string();
                if message.contains("already exists") {
                    warn!("Statement {} skipped: {}", number, message);
                    continue;
                }
                error!(
                    "Statement {} from {} failed: {}",
                    number, display_path, message
                );
                debug!("Failed statement: {}", statement);
                return Err(DbError::MigrationError(format!(
                    "Statement {} from {} failed: {}",
                    number, display_path, err
                )));
            }

            if kind == StatementKind::CreateKeyspace {
                if let Err(err) = session.await_schema_agreement().await {
                    warn!("Schema agreement after creating keyspace failed: {}", err);
                }
                if let Err(err) = session.refresh_metadata().await {
                    warn!("Metadata refresh after creating keyspace failed: {}", err);
                }
                ensure_keyspace_selected(session, &config.keyspace, number, &display_path).await?;
                keyspace_ready = true;
            }
        }
    }

    info!("Migrations applied");
    Ok(())
}

async fn ensure_keyspace_selected(
    session: &Session,
    keyspace: &str,
    statement_number: usize,
    display_path: &str,
) -> Result<(), DbError> {
    let mut last_error = None;
    for attempt in 0..KEYSPACE_SELECT_ATTEMPTS {
        match session.use_keyspace(keyspace, false).await {
            Ok(_) => {
                if attempt > 0 {
                    info!("Selected keyspace '{}' after {} retries", keyspace, attempt);
                }
                return Ok(());
            }
            Err(err) => {
                warn!(
                    "Attempt {} to select keyspace '{}' before statement {} in {} failed: {}",
                    attempt + 1,
                    keyspace,
                    statement_number,
                    display_path,
                    err
                );
                last_error = Some(err.to_string());
                if let Err(refresh_err) = session.refresh_metadata().await {
                    warn!("Metadata refresh failed: {}", refresh_err);
                }
                sleep(Duration::from_millis(250 * (attempt as u64 + 1))).await;
            }
        }
    }

    Err(DbError::MigrationError(format!(
        "Unable to select keyspace '{}' after {} attempts ({}): {}",
        keyspace,
        KEYSPACE_SELECT_ATTEMPTS,
        display_path,
        last_error.unwrap_or_default()
    )))
}
