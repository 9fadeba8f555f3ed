//! Telegram update handlers.
//!
//! Only text messages matter; everything else is ignored without a reply.

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use stb_core::dispatch::deliver;

use crate::router::AppState;

mod text;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(event) = text::inbound_event(&msg) else {
        return Ok(());
    };

    let replies = state.slot.handle(&event);
    if !replies.is_empty() {
        deliver(state.messenger.as_ref(), replies).await;
    }
    Ok(())
}
