//! Inbound event → replies.
//!
//! Every event first refreshes the sender's username binding, then goes either
//! to the nickname command or to the slot timer. Nothing here is fatal: each
//! outcome becomes zero or more reply texts and the next event is processed
//! normally.

use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::{
    command::{self, Intent},
    config::Config,
    domain::{ChatId, InboundEvent, ReplyTarget},
    errors::Error,
    formatting,
    identity::IdentityDirectory,
    messaging::port::MessagingPort,
    store::DirectoryStore,
    tracker::SessionTracker,
    Result,
};

/// A reply text plus where it goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub target: ReplyTarget,
    pub text: String,
}

pub struct SlotBot {
    identity: Arc<IdentityDirectory>,
    tracker: SessionTracker,
    // Serializes snapshot writes; the directory itself is sharded per chat.
    store: Option<Mutex<DirectoryStore>>,
    nickname_command: String,
    reply_to_message: bool,
    /// Own Telegram username; commands addressed to other bots are ignored.
    bot_username: Option<String>,
}

impl SlotBot {
    pub fn new(identity: Arc<IdentityDirectory>) -> Self {
        let tracker = SessionTracker::new(identity.clone());
        Self {
            identity,
            tracker,
            store: None,
            nickname_command: "user".to_string(),
            reply_to_message: true,
            bot_username: None,
        }
    }

    /// Wire everything from config, restoring saved bindings if a state file
    /// is configured.
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let store = cfg.state_file.clone().map(DirectoryStore::new);

        let identity = match store.as_ref().map(DirectoryStore::load).transpose()? {
            Some(Some(snapshot)) => {
                info!(chats = snapshot.chats.len(), "Restored identity directory");
                IdentityDirectory::from_snapshot(snapshot)
            }
            _ => IdentityDirectory::new(),
        };

        let mut bot = Self::new(Arc::new(identity))
            .with_nickname_command(&cfg.nickname_command)
            .with_reply_to_message(cfg.reply_to_message);
        if let Some(store) = store {
            bot = bot.with_store(store);
        }
        Ok(bot)
    }

    pub fn with_store(mut self, store: DirectoryStore) -> Self {
        self.store = Some(Mutex::new(store));
        self
    }

    pub fn with_nickname_command(mut self, command: &str) -> Self {
        self.nickname_command = command.to_lowercase();
        self
    }

    pub fn with_reply_to_message(mut self, enabled: bool) -> Self {
        self.reply_to_message = enabled;
        self
    }

    pub fn with_bot_username(mut self, username: &str) -> Self {
        let username = username.trim().trim_start_matches('@').to_lowercase();
        self.bot_username = (!username.is_empty()).then_some(username);
        self
    }

    pub fn identity(&self) -> &IdentityDirectory {
        &self.identity
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    pub fn handle(&self, ev: &InboundEvent) -> Vec<Reply> {
        info!(
            chat = ev.chat_id.0,
            thread = ev.thread().0,
            "Received message: {:?} from user_id: {}",
            ev.text,
            ev.sender_id.0
        );

        let mut dirty = false;
        if let Some(username) = ev.sender_username.as_deref() {
            dirty |= self.identity.observe(ev.chat_id, username, ev.sender_id);
        }

        let texts = match command::parse_command(&ev.text) {
            Some(cmd) if !cmd.is_for(self.bot_username.as_deref()) => {
                debug!(command = %cmd.name, to = ?cmd.addressee, "ignoring command for another bot");
                Vec::new()
            }
            Some(cmd) if cmd.name == self.nickname_command => {
                let (text, changed) = self.set_nickname(ev.chat_id, &cmd.args);
                dirty |= changed;
                vec![text]
            }
            Some(cmd) => {
                debug!(command = %cmd.name, "ignoring unknown command");
                Vec::new()
            }
            None => self.handle_intent(ev),
        };

        if dirty {
            self.persist();
        }

        let mut target = ev.reply_target();
        if !self.reply_to_message {
            target.reply_to = None;
        }
        texts
            .into_iter()
            .map(|text| Reply { target, text })
            .collect()
    }

    fn handle_intent(&self, ev: &InboundEvent) -> Vec<String> {
        let key = ev.channel();
        match command::classify(&command::normalize(&ev.text)) {
            Intent::Acquire => self.tracker.acquire(key, ev.sender_id, ev.timestamp),
            Intent::Release => vec![self.tracker.release(key, ev.timestamp)],
            Intent::Status => vec![self.tracker.status(key, ev.timestamp)],
            Intent::None => Vec::new(),
        }
    }

    /// Returns the reply text and whether the directory changed.
    fn set_nickname(&self, chat: ChatId, args: &str) -> (String, bool) {
        let parsed = match command::parse_set_nickname(args) {
            Ok(p) => p,
            Err(e) => {
                debug!(chat = chat.0, "nickname usage error: {e}");
                return (formatting::nickname_usage(&self.nickname_command), false);
            }
        };

        match self
            .identity
            .set_nickname(chat, &parsed.username, &parsed.nickname)
        {
            Ok(ack) => (formatting::nickname_set(&ack.username, &ack.nickname), true),
            Err(Error::UnknownUser { username }) => {
                warn!(chat = chat.0, "User @{username} not found in mapping");
                (formatting::unknown_user(&username), false)
            }
            Err(e) => {
                warn!(chat = chat.0, "nickname assignment failed: {e}");
                (formatting::unknown_user(&parsed.username), false)
            }
        }
    }

    fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        let store = store.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Err(e) = store.save(&self.identity.snapshot()) {
            warn!(path = %store.path().display(), "Failed to persist identity directory: {e}");
        }
    }
}

/// Send replies in order. A failed send is logged and the rest still go out.
///
/// Returns how many were delivered.
pub async fn deliver(messenger: &dyn MessagingPort, replies: Vec<Reply>) -> usize {
    let mut sent = 0usize;
    for reply in replies {
        match messenger.send_text(reply.target, &reply.text).await {
            Ok(_) => sent += 1,
            Err(e) => warn!(chat = reply.target.chat.0, "Failed to send reply: {e}"),
        }
    }
    sent
}
