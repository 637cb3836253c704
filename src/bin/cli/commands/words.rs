use anyhow::{Context, Result};

use crate::app::App;
use crate::render::terminal::{self, Color};
use crate::OutputFormat;

pub async fn run_add(
    app: &App,
    word: &str,
    context_sentence: &str,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let tutor = app.tutor()?;
    let draft = tutor
        .create_flashcard_for_word(word, context_sentence, app.profile())
        .await
        .with_context(|| format!("Failed to create a flashcard for '{}'", word))?;

    let added = app
        .cards
        .add_drafts(&app.profile().id, vec![draft])
        .context("Failed to save flashcard")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&added)?),
        OutputFormat::Plain => match added.first() {
            Some(card) => {
                for line in terminal::render_card(card, use_color) {
                    println!("{}", line);
                }
            }
            None => println!(
                "{}",
                terminal::paint(&format!("'{}' is already in your deck", word), Color::YELLOW, use_color)
            ),
        },
    }

    Ok(())
}

pub async fn run_translate(app: &App, word: &str, format: &OutputFormat) -> Result<()> {
    let tutor = app.tutor()?;
    let translation = tutor.translate_word(word, app.profile()).await;

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::json!({ "word": word, "translation": translation })
        ),
        OutputFormat::Plain => println!("{}", translation),
    }

    Ok(())
}
