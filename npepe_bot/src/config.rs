use std::{fs, path::Path, time::Duration};

use teloxide::types::{ChatId, UserId};
use url::Url;

pub(crate) const DEFAULT_PORT: u16 = 10000;
const DEFAULT_DATABASE_URL: &str = "sqlite:npepe_bot.sqlite";
const DEFAULT_GROQ_API_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_GROQ_MODEL: &str = "llama3-8b-8192";
const DEFAULT_CONTRACT_ADDRESS: &str = "BJ65ym9UYPkcfLSUuE9j4uXYuiG6TgA4pFn393Eppump";
const DEFAULT_WEBSITE_URL: &str = "https://next-npepe-launchpad-2b8b3071.base44.app";
const DEFAULT_TELEGRAM_URL: &str = "https://t.me/NPEPEVERSE";
const DEFAULT_TWITTER_URL: &str = "https://x.com/NPEPE_Verse";
const DEFAULT_GREETING_DELAY_SECS: u64 = 300;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("no bot token: set BOT_TOKEN or put it in a \"{0}\" file")]
    MissingBotToken(&'static str),
    #[error("{name} is not a valid number: {value:?}")]
    InvalidNumber { name: &'static str, value: String },
    #[error("{name} is not a valid URL: {source}")]
    InvalidUrl {
        name: &'static str,
        #[source]
        source: url::ParseError,
    },
}

/// Everything the bot reads from its environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    /// Public base URL the platform should deliver updates to.
    /// Long polling is used when this is absent.
    pub webhook_base_url: Option<Url>,
    pub port: u16,
    pub database_url: String,
    pub groq_api_key: Option<String>,
    pub groq_api_url: Url,
    pub groq_model: String,
    /// The community chat that scheduled broadcasts go to.
    pub group_chat_id: Option<ChatId>,
    pub group_owner_id: Option<UserId>,
    pub contract_address: String,
    pub website_url: Url,
    pub telegram_url: Url,
    pub twitter_url: Url,
    pub greeting_delay: Duration,
}

impl Config {
    /// Reads the configuration from environment variables.
    ///
    /// The bot token falls back to the contents of a `key` file (`key_debug`
    /// for debug builds) in the working directory.
    pub fn from_env() -> Result<Config, ConfigError> {
        let key_file = match cfg!(debug_assertions) {
            true => "key_debug",
            false => "key",
        };

        Config::from_lookup(|name| match name {
            "BOT_TOKEN" => token_or_key_file(std::env::var(name).ok(), Path::new(key_file)),
            _ => std::env::var(name).ok(),
        })
    }

    /// Builds the configuration out of an arbitrary variable lookup.
    /// Empty or whitespace-only values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ConfigError> {
        let get = |name: &str| {
            lookup(name)
                .map(|x| x.trim().to_string())
                .filter(|x| !x.is_empty())
        };

        let key_file = match cfg!(debug_assertions) {
            true => "key_debug",
            false => "key",
        };
        let bot_token = get("BOT_TOKEN").ok_or(ConfigError::MissingBotToken(key_file))?;

        let webhook_base_url = get("WEBHOOK_BASE_URL")
            .map(|x| parse_url("WEBHOOK_BASE_URL", &x))
            .transpose()?;

        let port = get("PORT")
            .map(|x| parse_number::<u16>("PORT", &x))
            .transpose()?
            .unwrap_or(DEFAULT_PORT);

        let group_chat_id = get("GROUP_CHAT_ID")
            .map(|x| parse_number::<i64>("GROUP_CHAT_ID", &x).map(ChatId))
            .transpose()?;

        let group_owner_id = get("GROUP_OWNER_ID")
            .map(|x| parse_number::<u64>("GROUP_OWNER_ID", &x).map(UserId))
            .transpose()?;

        let greeting_delay = get("GREETING_DELAY_SECS")
            .map(|x| parse_number::<u64>("GREETING_DELAY_SECS", &x))
            .transpose()?
            .unwrap_or(DEFAULT_GREETING_DELAY_SECS);

        let url_or_default = |name: &'static str, default: &str| -> Result<Url, ConfigError> {
            parse_url(name, &get(name).unwrap_or_else(|| default.to_string()))
        };

        Ok(Config {
            bot_token,
            webhook_base_url,
            port,
            database_url: get("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            groq_api_key: get("GROQ_API_KEY"),
            groq_api_url: url_or_default("GROQ_API_URL", DEFAULT_GROQ_API_URL)?,
            groq_model: get("GROQ_MODEL").unwrap_or_else(|| DEFAULT_GROQ_MODEL.to_string()),
            group_chat_id,
            group_owner_id,
            contract_address: get("CONTRACT_ADDRESS")
                .unwrap_or_else(|| DEFAULT_CONTRACT_ADDRESS.to_string()),
            website_url: url_or_default("WEBSITE_URL", DEFAULT_WEBSITE_URL)?,
            telegram_url: url_or_default("TELEGRAM_URL", DEFAULT_TELEGRAM_URL)?,
            twitter_url: url_or_default("TWITTER_URL", DEFAULT_TWITTER_URL)?,
            greeting_delay: Duration::from_secs(greeting_delay),
        })
    }

    /// Link to the token's page on Pump.fun.
    #[must_use]
    pub fn pump_fun_url(&self) -> Url {
        // A base58 address always makes a valid path, but don't panic over it.
        Url::parse(&format!("https://pump.fun/{}", self.contract_address))
            .unwrap_or_else(|_| self.website_url.clone())
    }

    /// Full URL the platform should send updates to, if running with a webhook.
    #[must_use]
    pub fn webhook_url(&self) -> Option<Url> {
        let base = self.webhook_base_url.as_ref()?;
        let mut url = base.clone();
        let path = format!("{}/webhook", base.path().trim_end_matches('/'));
        url.set_path(&path);
        Some(url)
    }
}

/// The token from the environment, or from `key_file` if that's unset or blank.
fn token_or_key_file(from_env: Option<String>, key_file: &Path) -> Option<String> {
    from_env
        .filter(|x| !x.trim().is_empty())
        .or_else(|| fs::read_to_string(key_file).ok())
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidNumber {
        name,
        value: value.to_string(),
    })
}

fn parse_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|source| ConfigError::InvalidUrl { name, source })
}
