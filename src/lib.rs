pub mod audio;
pub mod config;
pub mod conversations;
pub mod flashcards;
pub mod profile;
pub mod storage;
pub mod tutor;
