use chrono::Local;
use std::io::Write;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use uuid::Uuid;

use super::{App, CliError};
use crate::render::ORIGIN_TAG;
use crate::services::ServiceError;
use crate::utils::{short_id, validate_uuid};

const HELP: &str = "\
Type a line to record it on the active branch.
  /branch <n>     branch from message n of the active branch
  /switch <id>    make another branch of this session active
  /branches       list the session's branches
  /show           list the active branch's messages
  /tree           print the session tree
  /done           stop recording";

enum Input<'a> {
    Message(&'a str),
    Branch(&'a str),
    Switch(&'a str),
    Branches,
    Show,
    Tree,
    Help,
    Done,
    Unknown(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let Some(command) = line.strip_prefix('/') else {
        return Input::Message(line);
    };
    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map(|(name, arg)| (name, arg.trim()))
        .unwrap_or((command, ""));

    match name {
        "branch" => Input::Branch(arg),
        "switch" => Input::Switch(arg),
        "branches" => Input::Branches,
        "show" => Input::Show,
        "tree" => Input::Tree,
        "help" => Input::Help,
        "done" | "quit" => Input::Done,
        _ => Input::Unknown(name),
    }
}

/// Interactive recording loop over `input`.
///
/// Service failures on a single line are reported and the loop continues;
/// I/O failures end it.
pub async fn record<R, W>(
    app: &mut App,
    session: Option<Uuid>,
    input: R,
    out: &mut W,
) -> Result<(), CliError>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let session_id = match session {
        Some(session_id) => {
            let root = app.manager.open_session(session_id).await?;
            writeln!(
                out,
                "session {} on branch {} ({} message(s))",
                session_id,
                root.name,
                app.manager.visible_messages().len()
            )?;
            session_id
        }
        None => {
            let started = app.manager.start_session().await?;
            writeln!(
                out,
                "session {} on branch {}",
                started.session.session_id, started.root_branch.name
            )?;
            started.session.session_id
        }
    };
    writeln!(out, "type /help for commands")?;

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let result = match parse_input(line) {
            Input::Done => break,
            Input::Message(text) => send(app, session_id, text, out).await,
            Input::Branch(arg) => branch(app, session_id, arg, out).await,
            Input::Switch(arg) => switch(app, session_id, arg, out).await,
            Input::Branches => list_branches(app, session_id, out).await,
            Input::Show => super::write_messages(out, app.manager.visible_messages())
                .map_err(CliError::from),
            Input::Tree => {
                let color = app.color;
                app.write_tree(out, session_id, false, color).await
            }
            Input::Help => writeln!(out, "{}", HELP).map_err(CliError::from),
            Input::Unknown(name) => {
                writeln!(out, "unknown command /{}", name).map_err(CliError::from)
            }
        };

        match result {
            Ok(()) => {}
            Err(CliError::Service(err)) => {
                tracing::warn!("Command failed: {}", err);
                writeln!(out, "error: {}", err)?;
            }
            Err(err) => return Err(err),
        }
    }

    Ok(())
}

fn active_branch(app: &App) -> Result<Uuid, CliError> {
    app.manager
        .active()
        .map(|active| active.branch_id)
        .ok_or(CliError::Service(ServiceError::NoActiveBranch))
}

async fn send<W: Write>(
    app: &mut App,
    session_id: Uuid,
    text: &str,
    out: &mut W,
) -> Result<(), CliError> {
    let branch_id = active_branch(app)?;
    let thought = app.manager.append_message(session_id, branch_id, text).await?;
    writeln!(
        out,
        "  #{} {}",
        app.manager.visible_messages().len(),
        thought.created_at.with_timezone(&Local).format("%H:%M:%S")
    )?;
    Ok(())
}

async fn branch<W: Write>(
    app: &mut App,
    session_id: Uuid,
    arg: &str,
    out: &mut W,
) -> Result<(), CliError> {
    let count = app.manager.visible_messages().len();
    let index = match arg.parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => n - 1,
        _ => {
            writeln!(out, "usage: /branch <n> with n between 1 and {}", count)?;
            return Ok(());
        }
    };

    let branch_id = active_branch(app)?;
    let from = app.manager.visible_messages()[index].thought_id;
    let created = app.manager.create_branch(session_id, branch_id, from).await?;
    writeln!(
        out,
        "now on branch {} ({})",
        created.branch.name,
        short_id(created.branch.branch_id)
    )?;
    Ok(())
}

async fn switch<W: Write>(
    app: &mut App,
    session_id: Uuid,
    arg: &str,
    out: &mut W,
) -> Result<(), CliError> {
    let branch_id = match validate_uuid(arg) {
        Ok(branch_id) => branch_id,
        Err(message) => {
            writeln!(out, "{}", message)?;
            return Ok(());
        }
    };

    let known = app
        .manager
        .branches(session_id)
        .await?
        .into_iter()
        .find(|branch| branch.branch_id == branch_id);
    let Some(target) = known else {
        writeln!(out, "no branch {} in this session", short_id(branch_id))?;
        return Ok(());
    };

    let count = app.manager.switch_branch(session_id, branch_id).await?.len();
    writeln!(out, "now on branch {} ({} message(s))", target.name, count)?;
    Ok(())
}

async fn list_branches<W: Write>(
    app: &mut App,
    session_id: Uuid,
    out: &mut W,
) -> Result<(), CliError> {
    let active = app.manager.active().map(|active| active.branch_id);
    for branch in app.manager.branches(session_id).await? {
        let marker = if Some(branch.branch_id) == active {
            "*"
        } else {
            " "
        };
        let kind = if branch.is_root() { "" } else { ORIGIN_TAG };
        writeln!(
            out,
            "{} {} {} {}",
            marker, branch.branch_id, kind, branch.name
        )?;
    }
    Ok(())
}
