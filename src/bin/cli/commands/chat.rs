use std::io::Write;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use uuid::Uuid;

use lingobud_lib::conversations::ConversationTurn;
use lingobud_lib::tutor::{ErrorDetails, Tutor, TutorEvent, TutorResponse, TurnObserver};

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

/// Prints a turn as it streams
struct TurnPrinter<'a> {
    format: &'a OutputFormat,
    use_color: bool,
    response: Option<TutorResponse>,
}

impl<'a> TurnPrinter<'a> {
    fn new(format: &'a OutputFormat, use_color: bool) -> Self {
        Self {
            format,
            use_color,
            response: None,
        }
    }

    fn emit(&self, event: &TutorEvent) {
        match serde_json::to_string(event) {
            Ok(line) => println!("{}", line),
            Err(e) => log::error!("Failed to serialize event: {}", e),
        }
    }
}

impl TurnObserver for TurnPrinter<'_> {
    fn on_text_chunk(&mut self, chunk: &str) {
        match self.format {
            OutputFormat::Json => self.emit(&TutorEvent::Chunk {
                content: chunk.to_string(),
            }),
            OutputFormat::Plain => {
                print!("{}", chunk);
                let _ = std::io::stdout().flush();
            }
        }
    }

    fn on_complete(&mut self, response: TutorResponse) {
        match self.format {
            OutputFormat::Json => self.emit(&TutorEvent::Done {
                response: response.clone(),
            }),
            OutputFormat::Plain => {
                println!();
                for line in terminal::render_metadata(&response.metadata, self.use_color) {
                    println!("{}", line);
                }
            }
        }
        self.response = Some(response);
    }

    fn on_error(&mut self, details: ErrorDetails) {
        match self.format {
            OutputFormat::Json => self.emit(&TutorEvent::Error { details }),
            OutputFormat::Plain => {
                println!();
                eprintln!("{}", terminal::paint(&details.message, Color::RED, self.use_color));
            }
        }
    }
}

pub async fn run(
    app: &App,
    message: Option<String>,
    session: Option<&str>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let tutor = app.tutor()?;

    let session_id = match session {
        Some(query) => app.find_session(query)?,
        None => {
            let created = app
                .sessions
                .create_session(&app.profile().id, Utc::now())
                .context("Failed to create chat session")?;
            created.id
        }
    };

    if let Some(message) = message {
        if !take_turn(app, &tutor, session_id, &message, format, use_color).await? {
            bail!("The tutor could not answer");
        }
        return Ok(());
    }

    if let OutputFormat::Plain = format {
        println!(
            "{}",
            terminal::paint(
                &format!("Chatting with Toki in session {} (Ctrl-D to quit)", session_id),
                Color::DIM,
                use_color
            )
        );
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        take_turn(app, &tutor, session_id, line, format, use_color).await?;
    }

    Ok(())
}

/// One turn: stream, then persist the turn and any new vocabulary.
/// Returns false when the tutor failed to answer.
async fn take_turn(
    app: &App,
    tutor: &Tutor,
    session_id: Uuid,
    transcript: &str,
    format: &OutputFormat,
    use_color: bool,
) -> Result<bool> {
    let mut printer = TurnPrinter::new(format, use_color);
    tutor.respond(transcript, app.profile(), &mut printer).await;

    let Some(response) = printer.response else {
        return Ok(false);
    };

    let added = app
        .cards
        .add_drafts(&app.profile().id, response.metadata.flashcards.clone())
        .context("Failed to save flashcards")?;

    let turn = ConversationTurn::new(transcript, response, Utc::now());
    app.sessions
        .append_turn(&app.profile().id, session_id, turn)
        .context("Failed to save conversation turn")?;

    if let OutputFormat::Plain = format {
        for card in &added {
            println!(
                "{} {}",
                terminal::paint("+ card", Color::GREEN, use_color),
                terminal::render_card_line(card, use_color)
            );
        }
    }

    Ok(true)
}
