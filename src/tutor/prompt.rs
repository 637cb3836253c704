//! Instructions sent to the text generation model

use serde_json::json;

use super::splitter::DELIMITER;
use crate::profile::UserProfile;

/// Persona and output contract for a conversation turn
pub fn system_instruction(profile: &UserProfile) -> String {
    let native = &profile.native_language;
    let target = &profile.target_language;
    let level = profile.difficulty_level;

    format!(
        "You are Toki, a friendly and adaptive AI language partner for the LingoBud app.

The user's native language (NL) is {native}.
The user's target language (TL) is {target}.

You must ALWAYS follow these core rules:

**Rule 1: Primary Conversation in Native Language (NL).**
- Converse with the user primarily in {native}.
- Keep your language complexity appropriate for a {level} learner.
- Only switch to speaking {target} when the user asks you to, for example \"let's practice\" or \"say that in {target} for me\".

**Rule 2: Use Native Language (NL) for Clarity.**
- If the user asks a question in {native}, seems confused, or asks for a translation or explanation, respond in {native}.

**Rule 3: Gently correct mistakes.**
- When the user makes an error in the TL, model the correct form naturally in your reply instead of pointing it out.

**Rule 4: Identify and create flashcards for key vocabulary.**
- Pick 1-2 words or phrases from your response that a {level} learner might not know.
- For each flashcard give the word in TL, its translation in NL, a simple example sentence in TL, part of speech and difficulty.
- For 'part_of_speech', use short codes like 'n', 'v', 'adj'.

**Rule 5: Provide pronunciation feedback.**
- Based on the user's input, especially in the target language, identify likely pronunciation challenges.
- Put a short tip in the 'pronunciation_feedback' field, written in {native}.

**Rule 6: Be engaging.**
- Keep responses concise, natural and conversational. Ask questions to keep the conversation flowing.

**Rule 7: Streamed Dialogue Flow & Output Format.**
- First, stream the conversational reply text.
- After the entire reply, output the delimiter: `{DELIMITER}`.
- Immediately after the delimiter, output a single minified JSON object without markdown formatting and without a 'reply' field: {{ \"flashcards\": [...], \"emotion\": \"happy|thinking|teaching|confused\", \"avatar_action\": \"talk|nod|wave|smile\", \"pronunciation_feedback\": \"...\" }}
"
    )
}

/// Prompt for a single flashcard about `word`
pub fn flashcard_instruction(word: &str, context_sentence: &str, profile: &UserProfile) -> String {
    format!(
        "The user is learning {target} and their native language is {native}. Their level is {level}.
Create a single flashcard object for the word \"{word}\". The context is from the sentence: \"{context_sentence}\".
Provide the translation, a simple example sentence in {target}, part of speech (using short codes like 'n', 'v', 'adj'), and difficulty.
Your response MUST be a single JSON object. Do not wrap it in markdown backticks.",
        target = profile.target_language,
        native = profile.native_language,
        level = profile.difficulty_level,
    )
}

/// Response schema matching `FlashcardDraft`
pub fn flashcard_schema(profile: &UserProfile) -> serde_json::Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "word": {
                "type": "STRING",
                "description": format!("The word/phrase in {}.", profile.target_language),
            },
            "translation": {
                "type": "STRING",
                "description": format!("The translation of the word/phrase in {}.", profile.native_language),
            },
            "example_sentence": {
                "type": "STRING",
                "description": format!("A simple example sentence using the word in {}.", profile.target_language),
            },
            "part_of_speech": { "type": "STRING", "description": "e.g., 'n', 'v', 'adj'." },
            "difficulty": { "type": "STRING", "enum": ["Beginner", "Intermediate", "Advanced"] },
        },
        "required": ["word", "translation", "example_sentence", "part_of_speech", "difficulty"],
    })
}

/// Prompt for a bare single-word translation
pub fn translation_instruction(word: &str, profile: &UserProfile) -> String {
    format!(
        "Translate the following word from {} to {}: \"{}\".
Respond with ONLY the translated word(s). Do not add any extra text, explanation, or punctuation. If you cannot translate it, respond with the original word.",
        profile.target_language, profile.native_language, word
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashcards::Difficulty;

    #[test]
    fn test_system_instruction_mentions_contract() {
        let profile = UserProfile {
            native_language: "German".to_string(),
            target_language: "Japanese".to_string(),
            difficulty_level: Difficulty::Intermediate,
            ..UserProfile::default()
        };
        let instruction = system_instruction(&profile);

        assert!(instruction.contains("native language (NL) is German"));
        assert!(instruction.contains("target language (TL) is Japanese"));
        assert!(instruction.contains("Intermediate learner"));
        assert!(instruction.contains("`_||_`"));
        assert!(instruction.contains("\"avatar_action\""));
    }

    #[test]
    fn test_flashcard_schema_requires_all_fields() {
        let schema = flashcard_schema(&UserProfile::default());
        assert_eq!(schema["required"].as_array().unwrap().len(), 5);
        assert_eq!(schema["properties"]["difficulty"]["enum"][2], "Advanced");
    }
}
