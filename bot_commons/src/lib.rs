//! Common boilerplate shared by the bots in this workspace: logging and
//! runtime startup, chat admin lookups and a couple of message helpers.

pub mod useful_methods;

use std::future::Future;

use teloxide::{
    prelude::*,
    types::{ChatId, ChatMember, UserId},
};

/// Initialize logging and run `closure` to completion in a multithreaded
/// async runtime.
///
/// The log filter is `default_filter` unless overridden by the environment
/// variable `RUST_LOG`. This uses the crate [pretty_env_logger][] internally,
/// see its documentation for the filter syntax. Timestamps are left out when
/// running under systemd, since the journal adds its own.
///
/// Returns an error only if the runtime could not be built.
///
/// [pretty_env_logger]: https://docs.rs/pretty_env_logger
pub fn start_everything(
    default_filter: &str,
    closure: impl Future<Output = ()>,
) -> std::io::Result<()> {
    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| default_filter.to_string());

    let running_as_systemd_service = std::env::var_os("JOURNAL_STREAM").is_some();

    let mut builder = match running_as_systemd_service {
        true => pretty_env_logger::formatted_builder(),
        false => pretty_env_logger::formatted_timed_builder(),
    };

    builder.parse_filters(&log_filter);

    if builder.try_init().is_err() {
        log::error!("Tried to init logger twice!");
    }

    log::info!("hi");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(closure);

    Ok(())
}

/// Returns `true` if the user is the owner or an administrator of the chat.
pub async fn is_privileged_in(
    bot: &Bot,
    user: UserId,
    chat: ChatId,
) -> Result<bool, teloxide::RequestError> {
    let ChatMember { kind, .. } = bot.get_chat_member(chat, user).await?;
    Ok(kind.is_privileged())
}

/// Returns `true` if the user is currently in the chat, be it as a plain
/// member, a restricted one or an admin.
pub async fn is_present_in(
    bot: &Bot,
    user: UserId,
    chat: ChatId,
) -> Result<bool, teloxide::RequestError> {
    Ok(bot.get_chat_member(chat, user).await?.is_present())
}
