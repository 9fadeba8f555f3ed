use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Telegram user id (numeric, platform-wide).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(pub i64);

/// Forum topic id inside a chat. `0` means "no sub-thread".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ThreadId(pub i32);

impl ThreadId {
    pub const NONE: ThreadId = ThreadId(0);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

/// Telegram message id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageId(pub i32);

/// A stable reference to a sent Telegram message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MessageRef {
    pub chat_id: ChatId,
    pub message_id: MessageId,
}

/// One independent slot: a chat plus an optional forum thread.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChannelKey {
    pub chat: ChatId,
    pub thread: ThreadId,
}

impl ChannelKey {
    pub fn new(chat: ChatId, thread: ThreadId) -> Self {
        Self { chat, thread }
    }
}

/// Where a reply goes: same chat and thread as the triggering event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReplyTarget {
    pub chat: ChatId,
    pub thread: ThreadId,
    pub reply_to: Option<MessageId>,
}

/// Transport-neutral inbound text event.
#[derive(Clone, Debug)]
pub struct InboundEvent {
    pub chat_id: ChatId,
    pub thread_id: Option<ThreadId>,
    pub message_id: Option<MessageId>,
    pub sender_id: UserId,
    pub sender_username: Option<String>,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl InboundEvent {
    pub fn thread(&self) -> ThreadId {
        self.thread_id.unwrap_or(ThreadId::NONE)
    }

    pub fn channel(&self) -> ChannelKey {
        ChannelKey::new(self.chat_id, self.thread())
    }

    pub fn reply_target(&self) -> ReplyTarget {
        ReplyTarget {
            chat: self.chat_id,
            thread: self.thread(),
            reply_to: self.message_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_thread_maps_to_zero() {
        let ev = InboundEvent {
            chat_id: ChatId(-100),
            thread_id: None,
            message_id: Some(MessageId(7)),
            sender_id: UserId(1),
            sender_username: None,
            text: "+".to_string(),
            timestamp: Utc::now(),
        };
        assert_eq!(ev.channel(), ChannelKey::new(ChatId(-100), ThreadId(0)));
        assert!(ev.reply_target().thread.is_none());
        assert_eq!(ev.reply_target().reply_to, Some(MessageId(7)));
    }
}
