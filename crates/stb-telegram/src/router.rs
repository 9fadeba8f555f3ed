use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tracing::{info, warn};

use stb_core::{config::Config, dispatch::SlotBot, messaging::port::MessagingPort};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub slot: Arc<SlotBot>,
    pub messenger: Arc<dyn MessagingPort>,
}

/// Long-poll Telegram until the process is stopped.
///
/// The bot's own username comes from `get_me` so that `/cmd@other_bot` is
/// left to the bot it was addressed to.
///
/// teloxide's dispatcher already processes updates from one chat in order, so
/// replies for a thread never overtake each other.
pub async fn run_polling(cfg: Arc<Config>, slot: SlotBot) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let slot = match bot.get_me().await {
        Ok(me) => {
            info!("stb started: @{}", me.username());
            slot.with_bot_username(me.username())
        }
        Err(e) => {
            warn!("get_me failed, accepting commands for any bot: {e}");
            slot
        }
    };
    match &cfg.state_file {
        Some(path) => info!("Persisting nicknames to {}", path.display()),
        None => info!("Nickname state is in-memory only"),
    }

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let state = Arc::new(AppState {
        cfg,
        slot: Arc::new(slot),
        messenger,
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
