use std::future::Future;

use html_escape::encode_text;
use teloxide::{
    requests::Requester,
    types::{ChatAction, ChatId, Message, UserId},
    Bot, RequestError,
};

pub trait MessageStuff {
    /// Text of the message, or its caption if it's a media message.
    fn text_full(&self) -> Option<&str>;
    /// `true` for groups and supergroups.
    fn is_group_chat(&self) -> bool;
}

impl MessageStuff for Message {
    fn text_full(&self) -> Option<&str> {
        self.text().or_else(|| self.caption())
    }
    fn is_group_chat(&self) -> bool {
        self.chat.is_group() || self.chat.is_supergroup()
    }
}

pub trait BotStuff {
    fn typing(&self, to_where: ChatId) -> impl Future<Output = Result<(), RequestError>> + Send;
}

impl BotStuff for Bot {
    async fn typing(&self, to_where: ChatId) -> Result<(), RequestError> {
        self.send_chat_action(to_where, ChatAction::Typing).await?;
        Ok(())
    }
}

/// An HTML link that mentions a user by ID, with `name` as the visible text.
/// Works whether or not the user has a username.
#[must_use]
pub fn mention_html(user: UserId, name: &str) -> String {
    format!("<a href=\"tg://user?id={}\">{}</a>", user, encode_text(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mention_escapes_names() {
        assert_eq!(
            mention_html(UserId(42), "fren"),
            "<a href=\"tg://user?id=42\">fren</a>"
        );
        assert_eq!(
            mention_html(UserId(7), "<b>pepe</b> & co"),
            "<a href=\"tg://user?id=7\">&lt;b&gt;pepe&lt;/b&gt; &amp; co</a>"
        );
    }
}
