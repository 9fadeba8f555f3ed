use chrono::{DateTime, Utc};
use teloxide::types::Message;

use stb_core::domain::{ChatId, InboundEvent, MessageId, ThreadId, UserId};

/// Convert a Telegram text message into a core event.
///
/// Messages without text or without a sender (channel posts) yield `None`.
pub(crate) fn inbound_event(msg: &Message) -> Option<InboundEvent> {
    let user = msg.from()?;
    build_event(
        msg.chat.id.0,
        msg.thread_id,
        msg.id.0,
        user.id.0,
        user.username.as_deref(),
        msg.text()?,
        Utc::now(),
    )
}

fn build_event(
    chat_id: i64,
    thread_id: Option<i32>,
    message_id: i32,
    user_id: u64,
    username: Option<&str>,
    text: &str,
    received_at: DateTime<Utc>,
) -> Option<InboundEvent> {
    if text.trim().is_empty() {
        return None;
    }

    Some(InboundEvent {
        chat_id: ChatId(chat_id),
        thread_id: thread_id.map(ThreadId),
        message_id: Some(MessageId(message_id)),
        sender_id: UserId(user_id as i64),
        sender_username: username.filter(|u| !u.is_empty()).map(str::to_string),
        text: text.to_string(),
        timestamp: received_at,
    })
}
