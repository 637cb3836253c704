use anyhow::{Context, Result};

use crate::app::App;
use crate::render::terminal;
use crate::OutputFormat;

pub fn run_list(app: &App, format: &OutputFormat, use_color: bool) -> Result<()> {
    let cards = app
        .cards
        .list_cards(&app.profile().id)
        .context("Failed to list flashcards")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&cards)?);
        }
        OutputFormat::Plain => {
            if cards.is_empty() {
                println!("No flashcards yet. Chat with the tutor or use add-word.");
                return Ok(());
            }

            for card in &cards {
                println!("{}", terminal::render_card_line(card, use_color));
            }

            println!("\n{} cards total", cards.len());
        }
    }

    Ok(())
}

pub fn run_delete(app: &App, query: &str) -> Result<()> {
    let card = app.find_card(query)?;
    app.cards
        .delete_card(&app.profile().id, card.id)
        .context("Failed to delete flashcard")?;
    println!("Deleted card '{}'", card.word);
    Ok(())
}
