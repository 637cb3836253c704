use anyhow::{Context, Result};
use chrono::Utc;

use lingobud_lib::flashcards::algorithm::{format_interval, preview_intervals};
use lingobud_lib::flashcards::Rating;

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

pub fn run_due(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let due = app
        .cards
        .due_cards(&app.profile().id, Utc::now())
        .context("Failed to load due cards")?;

    match format {
        OutputFormat::Json => {
            let mut output = Vec::new();
            for card in &due {
                let preview = preview_intervals(&card.review)?;
                output.push(serde_json::json!({
                    "card": card,
                    "preview": {
                        "again": preview[0],
                        "hard": preview[1],
                        "good": preview[2],
                        "easy": preview[3],
                    },
                }));
            }
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if due.is_empty() {
                println!("Nothing due. ¡Buen trabajo!");
                return Ok(());
            }

            for card in &due {
                for line in terminal::render_card(card, use_color) {
                    println!("{}", line);
                }
                let preview = preview_intervals(&card.review)?;
                let buttons = Rating::ALL
                    .iter()
                    .zip(preview)
                    .map(|(rating, days)| format!("{:?} {}", rating, format_interval(days)))
                    .collect::<Vec<_>>()
                    .join(" | ");
                println!("    {}", terminal::paint(&buttons, Color::CYAN, use_color));
                println!();
            }

            println!("{} cards due", due.len());
        }
    }

    Ok(())
}

pub fn run_review(
    app: &App,
    query: &str,
    rating: Rating,
    version: Option<u64>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let card = app.find_card(query)?;
    let expected_version = version.unwrap_or(card.version);

    let updated = app
        .cards
        .submit_review(&app.profile().id, card.id, rating, expected_version, Utc::now())
        .with_context(|| format!("Failed to review '{}'", card.word))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&updated)?),
        OutputFormat::Plain => {
            println!(
                "{} {} → next review in {}",
                terminal::paint(&format!("{:?}", rating), Color::BOLD, use_color),
                updated.word,
                format_interval(updated.review.interval)
            );
        }
    }

    Ok(())
}
