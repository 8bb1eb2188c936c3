pub mod auth;
pub mod chat;
pub mod client;
pub mod message;
