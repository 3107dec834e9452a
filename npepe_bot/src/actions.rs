use std::sync::Arc;

use bot_commons::useful_methods::{mention_html, BotStuff};
use chrono::Utc;
use html_escape::encode_text;
use teloxide::{
    payloads::{EditMessageTextSetters, SendMessageSetters},
    prelude::Requester,
    sugar::request::RequestReplyExt,
    types::{ChatId, Message, ParseMode, User},
    ApiError, Bot, RequestError,
};

use crate::{
    context::BotContext,
    llm::ChatMessage,
    misc::{greeting_name, main_menu_keyboard, sender_name},
    responses::{fill, Category},
    spam_checker::SpamReason,
};

const ORACLE_PLACEHOLDER: &str = "🐸 The NPEPE oracle is consulting the memes...";

const ORACLE_SYSTEM_PROMPT: &str = "You are a crypto community bot for $NPEPE. Funny, \
    enthusiastic, chaotic. Use slang: 'fren', 'WAGMI', 'HODL', 'based', 'LFG', 'ribbit'. \
    Keep answers short.";

/// Delete a message that was taken for spam. Someone else beating us to it
/// is fine, and so is lacking the rights to do it, which only gets logged.
pub async fn delete_message_as_spam(
    bot: &Bot,
    message: &Message,
    reason: &SpamReason,
) -> Result<(), RequestError> {
    let sender = sender_name(message);

    match bot.delete_message(message.chat.id, message.id).await {
        Ok(_) => {
            log::info!(
                "Deleted message {} from {sender} in {}: {reason}",
                message.id,
                message.chat.id
            );
            Ok(())
        }
        Err(RequestError::Api(ApiError::MessageIdInvalid | ApiError::MessageToDeleteNotFound)) => {
            // Someone else probably has already deleted it. That's fine.
            Ok(())
        }
        Err(RequestError::Api(ApiError::MessageCantBeDeleted)) => {
            log::error!(
                "Can't delete spam from {sender} in {} ({reason}). Is the bot an admin?",
                message.chat.id
            );
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Wait for the configured delay in the background, then note every human
/// among `members` as a contacted arrival and greet each of them.
pub fn greet_after_delay(bot: Bot, context: Arc<BotContext>, chat_id: ChatId, members: &[User]) {
    let members: Vec<User> = members.iter().filter(|x| !x.is_bot).cloned().collect();
    if members.is_empty() {
        return;
    }

    let delay = context.config.greeting_delay;
    log::info!(
        "{} new member(s) in {chat_id}, greeting in {}s.",
        members.len(),
        delay.as_secs()
    );

    tokio::spawn(async move {
        tokio::time::sleep(delay).await;

        for member in &members {
            if let Err(e) = context
                .database
                .register_arrival(
                    member.id,
                    member.username.as_deref(),
                    &member.first_name,
                    Utc::now(),
                )
                .await
            {
                log::error!("Failed to register arrival of {}: {e}", member.id);
            }

            let mention = mention_html(member.id, greeting_name(member));
            let text = fill(
                &context.responses.pick(Category::GreetNewMembersDelayed),
                &[("name", &mention)],
            );

            match bot
                .send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .await
            {
                Ok(_) => log::info!("Sent delayed greeting to {}", member.id),
                Err(e) => log::error!("Failed to greet {}: {e}", member.id),
            }
        }
    });
}

/// Answer a question with the LLM. Shows a placeholder while it thinks,
/// then edits the answer into it, or sends it anew if editing fails.
pub async fn ask_oracle(
    bot: &Bot,
    context: &BotContext,
    message: &Message,
    question: &str,
) -> Result<(), RequestError> {
    let Some(llm) = &context.llm else {
        return Ok(());
    };
    let chat_id = message.chat.id;

    let placeholder = bot.send_message(chat_id, ORACLE_PLACEHOLDER).await;
    // No biggie if this fails.
    let _ = bot.typing(chat_id).await;

    let answer = match llm
        .complete(
            &[
                ChatMessage::system(ORACLE_SYSTEM_PROMPT),
                ChatMessage::user(question),
            ],
            0.7,
            150,
        )
        .await
    {
        Ok(answer) => encode_text(&answer).into_owned(),
        Err(e) => {
            log::error!("AI answer failed: {e}");
            fill(&context.responses.pick(Category::FinalFallback), &[])
        }
    };

    match placeholder {
        Ok(placeholder) => {
            let edited = bot
                .edit_message_text(chat_id, placeholder.id, &answer)
                .parse_mode(ParseMode::Html)
                .await;
            match edited {
                Ok(_) => return Ok(()),
                Err(e) => log::warn!("Couldn't edit the oracle placeholder: {e}"),
            }
        }
        Err(e) => log::warn!("Couldn't send the oracle placeholder: {e}"),
    }

    bot.send_message(chat_id, answer)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Text with the contract address in a copyable block.
#[must_use]
pub fn contract_address_text(context: &BotContext) -> String {
    format!(
        "🔗 <b>Contract Address:</b>\n<code>{}</code>",
        encode_text(&context.config.contract_address)
    )
}

/// Text of the "about" button.
pub const ABOUT_TEXT: &str = "🚀 <b>$NPEPE</b> is the next evolution of meme power!
We are a community-driven force born on <b>Pump.fun</b>.

This is 100% pure, unadulterated meme energy. Welcome to the NPEPEVERSE! 🐸";

const WELCOME_TEXT: &str = "🐸 <b>Welcome to the official NextPepe ($NPEPE) Bot!</b> 🔥

I am the spirit of the NPEPEVERSE, here to guide you. Use the buttons below or ask me anything!";

const HOW_TO_BUY_TEXT: &str =
    "💰 You can buy <b>$NPEPE</b> on Pump.fun! The portal to the moon is one click away! 🚀";

/// Reply with the welcome text and the main menu.
pub async fn send_welcome(
    bot: &Bot,
    context: &BotContext,
    message: &Message,
) -> Result<(), RequestError> {
    bot.send_message(message.chat.id, WELCOME_TEXT)
        .parse_mode(ParseMode::Html)
        .reply_markup(main_menu_keyboard(&context.config))
        .reply_to(message.id)
        .await?;
    Ok(())
}

/// Send the contract address.
pub async fn send_contract_address(
    bot: &Bot,
    context: &BotContext,
    chat_id: ChatId,
) -> Result<(), RequestError> {
    let text = format!(
        "Here is the contract address, fren:\n\n<code>{}</code>",
        encode_text(&context.config.contract_address)
    );
    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Send where to buy, with the main menu.
pub async fn send_how_to_buy(
    bot: &Bot,
    context: &BotContext,
    chat_id: ChatId,
) -> Result<(), RequestError> {
    bot.send_message(chat_id, HOW_TO_BUY_TEXT)
        .parse_mode(ParseMode::Html)
        .reply_markup(main_menu_keyboard(&context.config))
        .await?;
    Ok(())
}

/// Send a random line of `category` that has no placeholders.
pub async fn send_canned(
    bot: &Bot,
    context: &BotContext,
    chat_id: ChatId,
    category: Category,
) -> Result<(), RequestError> {
    let text = fill(&context.responses.pick(category), &[]);
    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}

/// Wish the sender of `message` a happy birthday, in reply to it.
pub async fn send_birthday_greeting(
    bot: &Bot,
    context: &BotContext,
    message: &Message,
) -> Result<(), RequestError> {
    let name = message
        .from
        .as_ref()
        .map_or_else(|| "fren".to_string(), |x| encode_text(greeting_name(x)).into_owned());

    let text = fill(
        &context.responses.pick(Category::BirthdayGreeting),
        &[("name", &name)],
    );
    bot.send_message(message.chat.id, text)
        .parse_mode(ParseMode::Html)
        .reply_to(message.id)
        .await?;
    Ok(())
}
