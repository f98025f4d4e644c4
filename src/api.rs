pub mod foxess;
pub mod telegram;
