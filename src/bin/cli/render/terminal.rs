use lingobud_lib::flashcards::algorithm::format_interval;
use lingobud_lib::flashcards::Flashcard;
use lingobud_lib::tutor::{Emotion, TutorMetadata};

/// ANSI color codes
#[allow(dead_code)]
pub struct Color;

#[allow(dead_code)]
impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const ITALIC: &str = "\x1b[3m";
    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const MAGENTA: &str = "\x1b[35m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

/// Wrap `text` in a color when colors are enabled
pub fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

fn emotion_color(emotion: Emotion) -> &'static str {
    match emotion {
        Emotion::Happy => Color::GREEN,
        Emotion::Thinking => Color::BLUE,
        Emotion::Teaching => Color::MAGENTA,
        Emotion::Confused => Color::YELLOW,
    }
}

/// Footer printed after a streamed reply
pub fn render_metadata(metadata: &TutorMetadata, use_color: bool) -> Vec<String> {
    let mut lines = Vec::new();

    let mood = format!(
        "[{} / {}]",
        format!("{:?}", metadata.emotion).to_lowercase(),
        format!("{:?}", metadata.avatar_action).to_lowercase()
    );
    lines.push(paint(&mood, emotion_color(metadata.emotion), use_color));

    if !metadata.pronunciation_feedback.is_empty() {
        lines.push(format!(
            "{} {}",
            paint("Pronunciation:", Color::BOLD, use_color),
            metadata.pronunciation_feedback
        ));
    }

    lines
}

/// One-line card summary: word, translation, next interval
pub fn render_card_line(card: &Flashcard, use_color: bool) -> String {
    format!(
        "{}  {} {} {}",
        paint(&card.id.to_string()[..8], Color::GRAY, use_color),
        paint(&card.word, Color::BOLD, use_color),
        paint(&format!("({})", card.part_of_speech), Color::DIM, use_color),
        card.translation,
    )
}

/// Multi-line card detail used by review output
pub fn render_card(card: &Flashcard, use_color: bool) -> Vec<String> {
    vec![
        render_card_line(card, use_color),
        format!("    {}", paint(&card.example_sentence, Color::ITALIC, use_color)),
        paint(
            &format!(
                "    {} · every {} · ease {:.2} · due {}",
                card.difficulty,
                format_interval(card.review.interval),
                card.review.ease_factor,
                card.review.due_date.format("%Y-%m-%d %H:%M")
            ),
            Color::DIM,
            use_color,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use lingobud_lib::flashcards::{Difficulty, FlashcardDraft};

    #[test]
    fn test_paint_without_color() {
        assert_eq!(paint("hola", Color::RED, false), "hola");
        assert_eq!(paint("hola", Color::RED, true), "\x1b[31mhola\x1b[0m");
    }

    #[test]
    fn test_metadata_footer() {
        let lines = render_metadata(&TutorMetadata::malformed(), false);
        assert_eq!(lines[0], "[confused / smile]");
        assert_eq!(lines[1], "Pronunciation: I had a little trouble with my thoughts just now.");

        assert_eq!(render_metadata(&TutorMetadata::empty(), false).len(), 1);
    }

    #[test]
    fn test_card_rendering() {
        let draft = FlashcardDraft {
            word: "gato".to_string(),
            translation: "cat".to_string(),
            example_sentence: "El gato duerme.".to_string(),
            part_of_speech: "n".to_string(),
            difficulty: Difficulty::Beginner,
        };
        let card = Flashcard::from_draft("local", draft, Utc::now());
        let lines = render_card(&card, false);

        assert!(lines[0].ends_with("gato (n) cat"));
        assert_eq!(lines[1], "    El gato duerme.");
        assert!(lines[2].starts_with("    Beginner · every now · ease 2.50"));
    }
}
