//! Source code for the NPEPE community bot: keyword and AI answers, spam
//! moderation, member greetings and scheduled broadcasts for the $NPEPE
//! Telegram group.

/// Configuration from the environment.
mod config;

/// Error type for the top level.
mod error;
pub use error::Error;

/// The member registry and the schedule log.
mod database;

/// Canned lines and their categories.
mod responses;

/// Chat completion client.
mod llm;

/// Refreshing canned lines with the LLM.
mod renewal;

/// Things shared by everything that does stuff.
mod context;

/// Miscellaneous functions.
mod misc;

/// Spam and advertising detection.
mod spam_checker;

/// Deciding how to answer a message.
mod replies;

/// Functions that perform stuff via the bot.
mod actions;

/// Functions that handle events from Telegram.
mod handlers;

/// Periodic jobs.
mod scheduler;

/// HTTP routes.
mod server;

/// Entry function that starts the bot.
mod entry;
pub use entry::*;
