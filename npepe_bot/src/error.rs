use teloxide::RequestError;

use crate::llm::LlmError;

/// Anything that can go wrong while running the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Telegram request failed: {0}")]
    Telegram(#[from] RequestError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("LLM client error: {0}")]
    Llm(#[from] LlmError),
    #[error("HTTP server error: {0}")]
    Io(#[from] std::io::Error),
}
