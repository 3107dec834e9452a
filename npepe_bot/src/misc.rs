use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardButtonKind, InlineKeyboardMarkup, Message,
    MessageEntityKind, User,
};
use url::Url;

use crate::config::Config;

/// Callback data of the main menu buttons.
pub const CALLBACK_HYPE: &str = "hype";
pub const CALLBACK_ABOUT: &str = "about";
pub const CALLBACK_CA: &str = "ca";

/// Try to parse a string as a [`Url`] in a way that telegram parses it,
/// with allowing an implicit `https://` prefix.
///
/// # Errors
/// Errors if it fails to parse either way.
pub fn parse_url_like_telegram(string: &str) -> Result<Url, url::ParseError> {
    match Url::parse(string) {
        Ok(url) => Ok(url),
        Err(e @ url::ParseError::RelativeUrlWithoutBase) => {
            // Try prepending https:// to it
            if let Ok(url) = Url::parse(&format!("https://{string}")) {
                Ok(url)
            } else {
                Err(e)
            }
        }
        Err(e) => Err(e),
    }
}

/// All URLs in this message's text or caption entities, and in its buttons.
#[must_use]
pub fn message_links(message: &Message) -> Vec<Url> {
    let entity_links = message
        .parse_entities()
        .or_else(|| message.parse_caption_entities())
        .unwrap_or_default()
        .into_iter()
        .filter_map(|entity| match entity.kind() {
            MessageEntityKind::Url => parse_url_like_telegram(entity.text()).ok(),
            MessageEntityKind::TextLink { url } => Some(url.clone()),
            _ => None,
        });

    let button_links = message
        .reply_markup()
        .map(|x| &x.inline_keyboard)
        .into_iter()
        .flat_map(|x| x.iter())
        .flat_map(|x| x.iter())
        .filter_map(|button| match &button.kind {
            InlineKeyboardButtonKind::Url(url) => Some(url.clone()),
            _ => None,
        });

    entity_links.chain(button_links).collect()
}

/// Name to greet a user by: their first name, or "fren" if it's empty.
#[must_use]
pub fn greeting_name(user: &User) -> &str {
    match user.first_name.trim() {
        "" => "fren",
        name => name,
    }
}

/// A @username or a full name describing who sent this message, for logs.
#[must_use]
pub fn sender_name(message: &Message) -> String {
    if let Some(user) = &message.from {
        if let Some(username) = &user.username {
            format!("@{username}")
        } else {
            user.full_name()
        }
    } else if let Some(chat) = &message.sender_chat {
        if let Some(username) = chat.username() {
            format!("@{username}")
        } else {
            chat.title().unwrap_or("a private chat").to_string()
        }
    } else {
        "an unknown sender".to_string()
    }
}

/// The keyboard attached to the welcome and "how to buy" messages.
#[must_use]
pub fn main_menu_keyboard(config: &Config) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new([
        vec![InlineKeyboardButton::url(
            "💰 Buy on Pump.fun",
            config.pump_fun_url(),
        )],
        vec![
            InlineKeyboardButton::callback("🔗 Contract Address", CALLBACK_CA),
            InlineKeyboardButton::callback("🐸 About", CALLBACK_ABOUT),
        ],
        vec![
            InlineKeyboardButton::url("🌐 Website", config.website_url.clone()),
            InlineKeyboardButton::url("💬 Telegram", config.telegram_url.clone()),
            InlineKeyboardButton::url("🐦 X", config.twitter_url.clone()),
        ],
        vec![InlineKeyboardButton::callback("🚀 LFG!", CALLBACK_HYPE)],
    ])
}
