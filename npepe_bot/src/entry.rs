use std::{net::SocketAddr, sync::Arc};

use teloxide::{
    dptree::deps, error_handlers::LoggingErrorHandler, prelude::*,
    update_listeners::webhooks,
};

use crate::{
    config::{Config, DEFAULT_PORT},
    context::BotContext,
    handlers::{generate_bot_commands, handle_callback_query, handle_message},
    scheduler::Scheduler,
    server::{bind, router, serve, serve_degraded},
    Error,
};

/// Start the bot. If it can't start, keep serving the liveness routes so
/// the host doesn't restart-loop it while the problem gets fixed.
pub async fn entry() {
    log::info!("ASYNC WOOOO");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Could not load the configuration: {e}");
            let port = std::env::var("PORT")
                .ok()
                .and_then(|x| x.trim().parse().ok())
                .unwrap_or(DEFAULT_PORT);
            if let Err(e) = serve_degraded(port).await {
                log::error!("HTTP server failed: {e}");
            }
            return;
        }
    };

    let port = config.port;

    if let Err(e) = run(config).await {
        log::error!("The bot failed: {e}");
        if let Err(e) = serve_degraded(port).await {
            log::error!("HTTP server failed: {e}");
        }
    }

    log::info!("it appears we have been bonked.");
}

async fn run(config: Config) -> Result<(), Error> {
    let bot = Bot::new(&config.bot_token);

    let context = Arc::new(BotContext::new(config).await?);

    bot.set_my_commands(generate_bot_commands()).await?;

    // Taken before anything runs, so a busy port fails the start.
    let listener = bind(context.config.port).await?;

    let scheduler = Arc::new(Scheduler::new(bot.clone(), context.clone()));
    tokio::spawn(Scheduler::spinloop(Arc::downgrade(&scheduler)));

    log::info!("Creating the handler...");

    let handler = dptree::entry()
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback_query));

    let port = context.config.port;
    let webhook_url = context.config.webhook_url();
    let app = router(Some(scheduler));

    let mut dispatcher = Dispatcher::builder(bot.clone(), handler)
        .default_handler(|_| async {})
        .dependencies(deps![context])
        .enable_ctrlc_handler()
        .build();

    log::info!("Dispatching the dispatcher!");

    let server = if let Some(url) = webhook_url {
        log::info!("Receiving updates by webhook at {url}");

        let address = SocketAddr::from(([0, 0, 0, 0], port));
        let (update_listener, stop_flag, webhook_router) =
            webhooks::axum_to_router(bot, webhooks::Options::new(address, url)).await?;

        let server = tokio::spawn(serve(listener, app.merge(webhook_router), stop_flag));

        dispatcher
            .dispatch_with_listener(
                update_listener,
                LoggingErrorHandler::with_custom_text("An error from the update listener"),
            )
            .await;

        server
    } else {
        log::info!("No WEBHOOK_BASE_URL, long polling for updates.");

        let server = tokio::spawn(serve(listener, app, async {
            let _ = tokio::signal::ctrl_c().await;
        }));

        dispatcher.dispatch().await;

        server
    };

    match server.await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => log::error!("HTTP server failed: {e}"),
        Err(e) => log::error!("HTTP server task died: {e}"),
    }

    Ok(())
}
