//! Command-line front end over the branch manager and tree renderer.

mod record;

use chrono::Local;
use clap::{Parser, Subcommand};
use std::io::Write;
use thiserror::Error;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::domain::Thought;
use crate::render::{NodeLabel, ORIGIN_TAG, render_json, render_text};
use crate::services::{BranchManager, HierarchyService, ServiceError};
use crate::store::Stores;

pub use record::record;

#[derive(Parser, Debug)]
#[command(name = "thought-tree")]
#[command(version, about = "Record short thoughts as branching timelines")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a new session with an empty main branch
    New,

    /// List sessions, newest first
    Sessions,

    /// Append a message to a branch
    Send {
        #[arg(long)]
        session: Uuid,
        #[arg(long)]
        branch: Uuid,
        /// Message text; several words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        content: Vec<String>,
    },

    /// Branch from a message of a branch
    Branch {
        #[arg(long)]
        session: Uuid,
        #[arg(long)]
        branch: Uuid,
        /// Message to branch from
        #[arg(long)]
        from: Uuid,
    },

    /// Print the messages of a branch (the main branch by default)
    Show {
        #[arg(long)]
        session: Uuid,
        #[arg(long)]
        branch: Option<Uuid>,
    },

    /// Print the session's thought tree
    Tree {
        #[arg(long)]
        session: Uuid,
        /// Emit the tree as JSON instead of text
        #[arg(long)]
        json: bool,
        #[arg(long)]
        no_color: bool,
    },

    /// Interactive recording; type `/help` for commands
    Record {
        /// Continue an existing session instead of starting one
        #[arg(long)]
        session: Option<Uuid>,
    },
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything a command needs: the writer, the reader and presentation
/// settings.
pub struct App {
    pub manager: BranchManager,
    pub hierarchy: HierarchyService,
    pub config: AppConfig,
    pub color: bool,
}

impl App {
    pub fn new(stores: Stores, config: AppConfig) -> Self {
        Self {
            manager: BranchManager::new(stores.clone(), config.clone()),
            hierarchy: HierarchyService::new(stores),
            config,
            color: true,
        }
    }

    pub async fn run<W: Write>(&mut self, command: Command, out: &mut W) -> Result<(), CliError> {
        match command {
            Command::New => {
                let started = self.manager.start_session().await?;
                writeln!(out, "session {}", started.session.session_id)?;
                writeln!(
                    out,
                    "branch  {} ({})",
                    started.root_branch.branch_id, started.root_branch.name
                )?;
            }
            Command::Sessions => {
                for session in self.manager.list_sessions().await? {
                    writeln!(
                        out,
                        "{}  created {}  updated {}",
                        session.session_id,
                        session.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                        session.updated_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
                    )?;
                }
            }
            Command::Send {
                session,
                branch,
                content,
            } => {
                self.manager.switch_branch(session, branch).await?;
                let thought = self
                    .manager
                    .append_message(session, branch, &content.join(" "))
                    .await?;
                writeln!(out, "{}", thought.thought_id)?;
            }
            Command::Branch {
                session,
                branch,
                from,
            } => {
                self.manager.switch_branch(session, branch).await?;
                let created = self.manager.create_branch(session, branch, from).await?;
                writeln!(
                    out,
                    "branch {} ({})",
                    created.branch.branch_id, created.branch.name
                )?;
                if created.origin.is_none() {
                    writeln!(out, "source message not found in branch; branch starts empty")?;
                }
            }
            Command::Show { session, branch } => {
                match branch {
                    Some(branch) => {
                        self.manager.switch_branch(session, branch).await?;
                    }
                    None => {
                        self.manager.open_session(session).await?;
                    }
                }
                write_messages(out, self.manager.visible_messages())?;
            }
            Command::Tree {
                session,
                json,
                no_color,
            } => {
                let color = self.color && !no_color;
                self.write_tree(out, session, json, color).await?;
            }
            Command::Record { session } => {
                let stdin = tokio::io::BufReader::new(tokio::io::stdin());
                record(self, session, stdin, out).await?;
            }
        }
        Ok(())
    }

    async fn write_tree<W: Write>(
        &self,
        out: &mut W,
        session_id: Uuid,
        json: bool,
        color: bool,
    ) -> Result<(), CliError> {
        let snapshot = self.hierarchy.snapshot(session_id).await?;
        let tree = snapshot.tree();

        match (tree, json) {
            (Some(tree), true) => writeln!(out, "{}", render_json(&tree)?)?,
            (None, true) => writeln!(out, "null")?,
            (Some(tree), false) => {
                let label = NodeLabel::for_session(&self.config, snapshot.is_multi_branch(), color);
                write!(out, "{}", render_text(&tree, |node| label.label(node)))?;
            }
            (None, false) => writeln!(out, "(nothing recorded yet)")?,
        }
        Ok(())
    }
}

/// Numbered chat listing, the way a branch reads top to bottom.
fn write_messages<W: Write>(out: &mut W, messages: &[Thought]) -> std::io::Result<()> {
    if messages.is_empty() {
        return writeln!(out, "(no messages)");
    }
    for (index, thought) in messages.iter().enumerate() {
        let tag = if thought.is_branch_origin {
            format!("{} ", ORIGIN_TAG)
        } else {
            String::new()
        };
        writeln!(
            out,
            "#{} [{}] {}{}",
            index + 1,
            thought.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S"),
            tag,
            thought.display_content()
        )?;
    }
    Ok(())
}
