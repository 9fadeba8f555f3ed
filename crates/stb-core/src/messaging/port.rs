use async_trait::async_trait;

use crate::{
    domain::{MessageRef, ReplyTarget},
    Result,
};

/// Cross-messenger port for plain-text replies.
///
/// The core never talks to Telegram directly; the adapter crate implements
/// this and the dispatch layer only sees `ReplyTarget`s.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_text(&self, target: ReplyTarget, text: &str) -> Result<MessageRef>;
}
