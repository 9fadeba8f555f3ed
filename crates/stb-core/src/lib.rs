//! Core logic for the slot timer bot.
//!
//! Tracks who currently holds a contended slot per chat thread and resolves
//! participants to chat-scoped nicknames. Telegram lives behind the
//! [`messaging::port::MessagingPort`] trait implemented in the adapter crate.

pub mod command;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod identity;
pub mod logging;
pub mod messaging;
pub mod store;
pub mod tracker;

pub use errors::{Error, Result};
