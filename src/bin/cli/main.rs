mod app;
mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use lingobud_lib::flashcards::Rating;

#[derive(Parser)]
#[command(name = "lingobud-cli", about = "LingoBud language tutor CLI", version)]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Talk with the tutor (reads lines from stdin when no message is given)
    Chat {
        /// What to say
        message: Option<String>,
        /// Continue an existing session (id prefix)
        #[arg(long)]
        session: Option<String>,
    },

    /// Saved chat sessions
    #[command(subcommand)]
    Sessions(SessionsCommand),

    /// Flashcard deck
    #[command(subcommand)]
    Cards(CardsCommand),

    /// List cards due for review
    Due,

    /// Grade a card
    Review {
        /// Card id prefix or word
        card: String,
        /// again, hard, good or easy
        rating: Rating,
        /// Version the card was read at (default: current)
        #[arg(long)]
        version: Option<u64>,
    },

    /// Ask the tutor for a flashcard about a word
    AddWord {
        word: String,
        /// Sentence the word appeared in
        #[arg(long, default_value = "")]
        context: String,
    },

    /// Translate a single word into your native language
    Translate { word: String },

    /// Synthesize speech with the avatar voice
    Speak {
        text: String,
        /// Write samples as raw 32-bit float PCM
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum SessionsCommand {
    /// List sessions, most recent first
    List,
    /// Show every turn of a session
    Show { session: String },
    /// Rename a session
    Rename { session: String, title: String },
    /// Delete a session
    Delete { session: String },
}

#[derive(Subcommand)]
enum CardsCommand {
    /// List all cards, newest first
    List,
    /// Delete a card
    Delete { card: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();
    let app = app::App::new(cli.config.as_deref())?;

    match cli.command {
        Command::Chat { message, session } => {
            commands::chat::run(&app, message, session.as_deref(), &cli.format, use_color).await?;
        }
        Command::Sessions(subcmd) => match subcmd {
            SessionsCommand::List => commands::sessions::run_list(&app, &cli.format, use_color)?,
            SessionsCommand::Show { session } => {
                commands::sessions::run_show(&app, &session, &cli.format, use_color)?
            }
            SessionsCommand::Rename { session, title } => {
                commands::sessions::run_rename(&app, &session, title, &cli.format)?
            }
            SessionsCommand::Delete { session } => commands::sessions::run_delete(&app, &session)?,
        },
        Command::Cards(subcmd) => match subcmd {
            CardsCommand::List => commands::cards::run_list(&app, &cli.format, use_color)?,
            CardsCommand::Delete { card } => commands::cards::run_delete(&app, &card)?,
        },
        Command::Due => commands::review::run_due(&app, &cli.format, use_color)?,
        Command::Review { card, rating, version } => {
            commands::review::run_review(&app, &card, rating, version, &cli.format, use_color)?;
        }
        Command::AddWord { word, context } => {
            commands::words::run_add(&app, &word, &context, &cli.format, use_color).await?;
        }
        Command::Translate { word } => {
            commands::words::run_translate(&app, &word, &cli.format).await?;
        }
        Command::Speak { text, output } => {
            commands::speak::run(&app, &text, output.as_deref(), &cli.format).await?;
        }
    }

    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    unsafe { libc_isatty(1) != 0 }
}

extern "C" {
    #[link_name = "isatty"]
    fn libc_isatty(fd: i32) -> i32;
}
