pub mod chat;
pub mod news;
pub mod quote;
