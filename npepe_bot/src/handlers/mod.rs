use std::sync::Arc;

use bot_commons::{is_privileged_in, useful_methods::MessageStuff};
use chrono::Utc;
use teloxide::{
    payloads::{AnswerCallbackQuerySetters, EditMessageTextSetters},
    prelude::*,
    types::{CallbackQuery, Me, MessageEntityKind, ParseMode},
    ApiError, RequestError,
};

use crate::{
    actions::{
        ask_oracle, contract_address_text, delete_message_as_spam, greet_after_delay,
        send_birthday_greeting, send_canned, send_contract_address, send_how_to_buy, send_welcome,
        ABOUT_TEXT,
    },
    context::BotContext,
    misc::{main_menu_keyboard, message_links, CALLBACK_ABOUT, CALLBACK_CA, CALLBACK_HYPE},
    replies::{classify, Reply, ReplyContext},
    responses::Category,
    spam_checker::detect_spam,
};

use self::commands::{parse_command, CommandKind};

pub mod commands;

pub use self::commands::generate_bot_commands;

pub async fn handle_message(
    bot: Bot,
    me: Me,
    message: Message,
    context: Arc<BotContext>,
) -> Result<(), RequestError> {
    if let Some(new_members) = message.new_chat_members() {
        greet_after_delay(bot, context, message.chat.id, new_members);
        return Ok(());
    }

    let in_group = message.is_group_chat();

    if in_group {
        record_sender(&message, &context).await;

        if moderate(&bot, &message, &context).await? {
            return Ok(());
        }
    }

    let Some(text) = message.text_full() else {
        return Ok(());
    };

    if let Some(command) = parse_command(text, me.username()) {
        return handle_command(&bot, &message, &context, command).await;
    }

    let mentions_owner = context.config.group_owner_id.is_some_and(|owner| {
        message
            .parse_entities()
            .unwrap_or_default()
            .iter()
            .any(|x| matches!(x.kind(), MessageEntityKind::TextMention { user } if user.id == owner))
    });

    let reply_context = ReplyContext {
        in_group,
        mentions_owner,
        ai_enabled: context.llm.is_some(),
    };

    let Some(reply) = classify(text, &reply_context) else {
        return Ok(());
    };
    log::debug!("Replying to message {} in {} with {reply:?}", message.id, message.chat.id);

    let chat_id = message.chat.id;
    match reply {
        Reply::ContractAddress => send_contract_address(&bot, &context, chat_id).await,
        Reply::HowToBuy => send_how_to_buy(&bot, &context, chat_id).await,
        Reply::BotIdentity => send_canned(&bot, &context, chat_id, Category::BotIdentity).await,
        Reply::BirthdayGreeting => send_birthday_greeting(&bot, &context, &message).await,
        Reply::Collaboration => {
            send_canned(&bot, &context, chat_id, Category::CollaborationResponse).await
        }
        Reply::AskOracle => ask_oracle(&bot, &context, &message, text).await,
    }
}

/// Keep the member registry aware of whoever talks in the group.
async fn record_sender(message: &Message, context: &BotContext) {
    let Some(user) = &message.from else {
        return;
    };
    if user.is_bot {
        return;
    }

    match context.database.get_member(user.id).await {
        Ok(Some(known))
            if known.username() == user.username.as_deref()
                && known.display_name() == user.first_name =>
        {
            // Nothing new to note.
            return;
        }
        Ok(Some(_)) => {}
        Ok(None) => log::debug!("First sighting of member {}", user.id),
        Err(e) => log::error!("Failed to look up member {}: {e}", user.id),
    }

    if let Err(e) = context
        .database
        .record_member(
            user.id,
            user.username.as_deref(),
            &user.first_name,
            Utc::now(),
        )
        .await
    {
        log::error!("Failed to record member {}: {e}", user.id);
    }
}

/// Delete the message if it's spam from someone who isn't an admin or the
/// owner. Returns `true` if it was deleted.
async fn moderate(
    bot: &Bot,
    message: &Message,
    context: &BotContext,
) -> Result<bool, RequestError> {
    let text = message.text_full().unwrap_or_default();
    let links = message_links(message);

    let Some(reason) = detect_spam(text, &links, &context.config) else {
        return Ok(false);
    };

    // oh no!
    // Check if this is an admin of the chat or not.
    let is_exempt = if let Some(chat) = &message.sender_chat {
        // If it's posted by the chat itself, it's probably an admin.
        // Those still come "from" the anonymous admin bot account.
        chat.id == message.chat.id
    } else if let Some(user) = &message.from {
        context.config.group_owner_id == Some(user.id)
            || is_privileged_in(bot, user.id, message.chat.id).await?
    } else {
        false
    };

    if is_exempt {
        log::debug!("Skipping deleting message from an admin ({reason}).");
        return Ok(false);
    }

    delete_message_as_spam(bot, message, &reason).await?;
    Ok(true)
}

async fn handle_command(
    bot: &Bot,
    message: &Message,
    context: &BotContext,
    command: CommandKind,
) -> Result<(), RequestError> {
    match command {
        CommandKind::Start | CommandKind::Help => send_welcome(bot, context, message).await,
        CommandKind::ContractAddress => send_contract_address(bot, context, message.chat.id).await,
        CommandKind::HowToBuy => send_how_to_buy(bot, context, message.chat.id).await,
    }
}

pub async fn handle_callback_query(
    bot: Bot,
    query: CallbackQuery,
    context: Arc<BotContext>,
) -> Result<(), RequestError> {
    if let Err(e) = respond_to_callback_query(&bot, &query, &context).await {
        log::error!("Error in callback handler: {e}");
        // Fails if the query was already answered. Nothing to do about that.
        let _ = bot
            .answer_callback_query(query.id.clone())
            .text("Sorry, something went wrong!")
            .show_alert(true)
            .await;
    }
    Ok(())
}

async fn respond_to_callback_query(
    bot: &Bot,
    query: &CallbackQuery,
    context: &BotContext,
) -> Result<(), RequestError> {
    let new_text = match query.data.as_deref() {
        Some(CALLBACK_HYPE) => {
            bot.answer_callback_query(query.id.clone())
                .text("LFG! HODL tight, fren!")
                .show_alert(true)
                .await?;
            return Ok(());
        }
        Some(CALLBACK_ABOUT) => ABOUT_TEXT.to_string(),
        Some(CALLBACK_CA) => contract_address_text(context),
        _ => {
            bot.answer_callback_query(query.id.clone())
                .text("Action not recognized.")
                .await?;
            return Ok(());
        }
    };

    bot.answer_callback_query(query.id.clone()).await?;

    let Some(message) = query.regular_message() else {
        // May happen if the message is too old
        return Ok(());
    };

    let edit_result = bot
        .edit_message_text(message.chat.id, message.id, new_text)
        .parse_mode(ParseMode::Html)
        .reply_markup(main_menu_keyboard(&context.config))
        .await;

    match edit_result {
        // Pressed the same button twice. Nothing to change.
        Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use teloxide::types::UserId;
    use wiremock::MockServer;

    use super::*;
    use crate::context::tests::{
        api_calls, api_method, group_json, group_message_json, memory_context, mock_bot,
        mount_chat_member_status, mount_member_status, telegram_ok, user_json,
    };

    const GROUP: i64 = -1_001_234_567_890;
    const SPAM: &str = "DM me for promo, cheap marketing for your coin!";

    async fn mock_moderation(server: &MockServer) {
        mount_chat_member_status(server, "member").await;
        api_method("deleteMessage")
            .respond_with(telegram_ok(json!(true)))
            .mount(server)
            .await;
    }

    fn spam_from(from: serde_json::Value) -> Message {
        serde_json::from_value(group_message_json(GROUP, from, SPAM)).unwrap()
    }

    #[tokio::test]
    async fn spam_from_members_is_deleted() {
        let server = MockServer::start().await;
        mock_moderation(&server).await;
        let bot = mock_bot(&server);
        let context = memory_context(&[]).await;

        let deleted = moderate(&bot, &spam_from(user_json(5, "Spammer")), &context)
            .await
            .unwrap();
        assert!(deleted);

        let deletions = api_calls(&server, "deleteMessage").await;
        assert_eq!(deletions.len(), 1);
        assert_eq!(deletions[0]["chat_id"], json!(GROUP));
        assert_eq!(deletions[0]["message_id"], json!(77));
    }

    #[tokio::test]
    async fn owner_is_exempt_without_asking_telegram() {
        let server = MockServer::start().await;
        mock_moderation(&server).await;
        let bot = mock_bot(&server);
        let context = memory_context(&[("GROUP_OWNER_ID", "5")]).await;
        assert_eq!(context.config.group_owner_id, Some(UserId(5)));

        let deleted = moderate(&bot, &spam_from(user_json(5, "Owner")), &context)
            .await
            .unwrap();
        assert!(!deleted);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn admins_are_exempt() {
        let server = MockServer::start().await;
        mock_moderation(&server).await;
        mount_member_status(&server, 6, "creator").await;
        let bot = mock_bot(&server);
        let context = memory_context(&[]).await;

        let deleted = moderate(&bot, &spam_from(user_json(6, "Admin")), &context)
            .await
            .unwrap();
        assert!(!deleted);
        assert_eq!(api_calls(&server, "getChatMember").await.len(), 1);
        assert!(api_calls(&server, "deleteMessage").await.is_empty());
    }

    #[tokio::test]
    async fn posts_by_the_chat_itself_are_exempt() {
        let server = MockServer::start().await;
        mock_moderation(&server).await;
        let bot = mock_bot(&server);
        let context = memory_context(&[]).await;

        // Anonymous admins post as the group through this bot account.
        let anonymous_admin = json!({
            "id": 1_087_968_824_u64,
            "is_bot": true,
            "first_name": "Group",
            "username": "GroupAnonymousBot",
        });
        let mut message = group_message_json(GROUP, anonymous_admin, SPAM);
        message["sender_chat"] = group_json(GROUP);
        let message: Message = serde_json::from_value(message).unwrap();

        let deleted = moderate(&bot, &message, &context).await.unwrap();
        assert!(!deleted);
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clean_messages_are_left_alone() {
        let server = MockServer::start().await;
        mock_moderation(&server).await;
        let bot = mock_bot(&server);
        let context = memory_context(&[]).await;

        let message: Message = serde_json::from_value(group_message_json(
            GROUP,
            user_json(5, "Fren"),
            "gm frens, ribbit",
        ))
        .unwrap();
        assert!(!moderate(&bot, &message, &context).await.unwrap());
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    fn bot_user() -> serde_json::Value {
        json!({"id": 42, "is_bot": true, "first_name": "NPEPE"})
    }

    fn button_press(data: &str) -> CallbackQuery {
        serde_json::from_value(json!({
            "id": "4382",
            "from": user_json(5, "Fren"),
            "chat_instance": "-555",
            "data": data,
            "message": group_message_json(GROUP, bot_user(), "menu"),
        }))
        .unwrap()
    }

    async fn mock_callbacks(server: &MockServer) {
        api_method("answerCallbackQuery")
            .respond_with(telegram_ok(json!(true)))
            .mount(server)
            .await;
        api_method("editMessageText")
            .respond_with(telegram_ok(group_message_json(GROUP, bot_user(), "edited")))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn menu_buttons_edit_the_message() {
        let server = MockServer::start().await;
        mock_callbacks(&server).await;
        let bot = mock_bot(&server);
        let context = memory_context(&[]).await;

        respond_to_callback_query(&bot, &button_press(CALLBACK_CA), &context)
            .await
            .unwrap();
        respond_to_callback_query(&bot, &button_press(CALLBACK_ABOUT), &context)
            .await
            .unwrap();

        let answers = api_calls(&server, "answerCallbackQuery").await;
        assert_eq!(answers.len(), 2);
        assert!(answers.iter().all(|x| x["callback_query_id"] == json!("4382")));

        let edits = api_calls(&server, "editMessageText").await;
        assert_eq!(edits.len(), 2);
        for edit in &edits {
            assert_eq!(edit["chat_id"], json!(GROUP));
            assert_eq!(edit["message_id"], json!(77));
            assert_eq!(edit["parse_mode"], json!("HTML"));
            assert!(edit["reply_markup"]["inline_keyboard"].is_array());
        }
        assert_eq!(edits[0]["text"], json!(contract_address_text(&context)));
        assert!(edits[0]["text"]
            .as_str()
            .unwrap()
            .contains(&context.config.contract_address));
        assert_eq!(edits[1]["text"], json!(ABOUT_TEXT));
    }

    #[tokio::test]
    async fn unknown_buttons_are_not_recognized() {
        let server = MockServer::start().await;
        mock_callbacks(&server).await;
        let bot = mock_bot(&server);
        let context = memory_context(&[]).await;

        respond_to_callback_query(&bot, &button_press("rug_pull"), &context)
            .await
            .unwrap();

        let answers = api_calls(&server, "answerCallbackQuery").await;
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0]["text"], json!("Action not recognized."));
        assert!(api_calls(&server, "editMessageText").await.is_empty());
    }

    #[tokio::test]
    async fn hype_button_only_answers() {
        let server = MockServer::start().await;
        mock_callbacks(&server).await;
        let bot = mock_bot(&server);
        let context = memory_context(&[]).await;

        respond_to_callback_query(&bot, &button_press(CALLBACK_HYPE), &context)
            .await
            .unwrap();

        let answers = api_calls(&server, "answerCallbackQuery").await;
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0]["show_alert"], json!(true));
        assert!(api_calls(&server, "editMessageText").await.is_empty());
    }
}
