//! `chatkit` — in-memory conversation and message core for a desktop chat client.

pub mod chat;
pub mod config;
pub mod transport;
