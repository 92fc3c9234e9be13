pub mod deck;
pub mod error;
pub mod player;
pub mod shop;
pub mod types;
