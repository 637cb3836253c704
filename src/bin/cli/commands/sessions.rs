use anyhow::{Context, Result};
use chrono::Utc;

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

pub fn run_list(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let sessions = app.list_sessions()?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&sessions)?);
        }
        OutputFormat::Plain => {
            if sessions.is_empty() {
                println!("No chat sessions yet.");
                return Ok(());
            }

            for session in &sessions {
                println!(
                    "{}  {} {}",
                    terminal::paint(&session.id.to_string()[..8], Color::GRAY, use_color),
                    session.title,
                    terminal::paint(
                        &format!(
                            "({} turns, {})",
                            session.turn_count,
                            session.updated_at.format("%Y-%m-%d %H:%M")
                        ),
                        Color::DIM,
                        use_color
                    ),
                );
            }

            println!("\n{} sessions total", sessions.len());
        }
    }

    Ok(())
}

pub fn run_show(app: &App, query: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let id = app.find_session(query)?;
    let session = app
        .sessions
        .get_session(&app.profile().id, id)
        .context("Failed to load chat session")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&session)?);
        }
        OutputFormat::Plain => {
            println!("{}", terminal::paint(&session.title, Color::BOLD, use_color));
            for turn in &session.turns {
                println!();
                println!("{} {}", terminal::paint("You:", Color::CYAN, use_color), turn.transcript);
                println!("{} {}", terminal::paint("Toki:", Color::MAGENTA, use_color), turn.reply.reply);
            }
        }
    }

    Ok(())
}

pub fn run_rename(app: &App, query: &str, title: String, format: &OutputFormat) -> Result<()> {
    let id = app.find_session(query)?;
    let session = app
        .sessions
        .rename_session(&app.profile().id, id, title, Utc::now())
        .context("Failed to rename chat session")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&session.summary())?),
        OutputFormat::Plain => println!("Renamed session to \"{}\"", session.title),
    }

    Ok(())
}

pub fn run_delete(app: &App, query: &str) -> Result<()> {
    let id = app.find_session(query)?;
    app.sessions
        .delete_session(&app.profile().id, id)
        .context("Failed to delete chat session")?;
    println!("Deleted session {}", id);
    Ok(())
}
