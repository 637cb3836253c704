pub mod cards;
pub mod chat;
pub mod review;
pub mod sessions;
pub mod speak;
pub mod words;
