//! Local-first chat: on-device history, slash commands and RSA-PSS signing.

pub mod chat;
pub mod config;
pub mod crypto;
pub mod error;
pub mod logging;
pub mod store;
