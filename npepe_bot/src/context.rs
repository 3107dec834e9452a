use std::sync::Arc;

use crate::{config::Config, database::Database, llm::LlmClient, responses::ResponsePool};

/// Everything the handlers and scheduled jobs share.
pub struct BotContext {
    pub config: Config,
    pub database: Arc<Database>,
    pub responses: ResponsePool,
    /// Present only when an API key is configured.
    pub llm: Option<LlmClient>,
}

impl BotContext {
    /// Build the context, creating an LLM client if the config has a key for it.
    pub async fn new(config: Config) -> Result<BotContext, crate::Error> {
        let database = Arc::new(Database::new(&config.database_url).await?);

        let llm = match &config.groq_api_key {
            Some(key) => Some(LlmClient::new(
                key.clone(),
                &config.groq_api_url,
                config.groq_model.clone(),
            )?),
            None => {
                log::warn!("No GROQ_API_KEY set, AI answers and phrase renewal are off.");
                None
            }
        };

        Ok(BotContext {
            config,
            database,
            responses: ResponsePool::with_defaults(),
            llm,
        })
    }
}
