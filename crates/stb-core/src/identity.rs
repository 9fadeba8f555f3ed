//! Chat-scoped identity directory.
//!
//! Two mappings, both keyed by chat:
//! - `username → user id`, refreshed from every observed message
//! - `user id → nickname`, set explicitly via the nickname command
//!
//! Each chat is one entry of a sharded map, so a read-modify-write on one chat
//! holds only that chat's shard lock and unrelated chats proceed in parallel.
//! Bindings are never deleted.

use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    domain::{ChatId, UserId},
    errors::Error,
    Result,
};

#[derive(Clone, Copy, Debug)]
struct UsernameBinding {
    user_id: UserId,
    /// Monotonic observation stamp; the newest username wins the display fallback.
    seen: u64,
}

#[derive(Debug, Default)]
struct ChatDirectory {
    usernames: HashMap<String, UsernameBinding>,
    nicknames: HashMap<UserId, String>,
}

/// Confirmation of a nickname assignment.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NicknameAck {
    pub user_id: UserId,
    pub username: String,
    pub nickname: String,
}

#[derive(Debug, Default)]
pub struct IdentityDirectory {
    chats: DashMap<ChatId, ChatDirectory>,
    clock: AtomicU64,
}

impl IdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `username` spoke in `chat` as `user_id`.
    ///
    /// Returns `true` when the binding was created or re-pointed to a new id.
    pub fn observe(&self, chat: ChatId, username: &str, user_id: UserId) -> bool {
        let username = normalize_username(username);
        if username.is_empty() {
            return false;
        }

        let mut entry = self.chats.entry(chat).or_default();
        // Stamp under the shard lock so stamps within a chat follow commit order.
        let seen = self.tick();
        let dir = &mut *entry;

        let previous = match dir.usernames.get_mut(&username) {
            Some(binding) if binding.user_id == user_id => {
                binding.seen = seen;
                return false;
            }
            Some(binding) => Some(binding.user_id),
            None => None,
        };

        dir.usernames
            .insert(username.clone(), UsernameBinding { user_id, seen });

        match previous {
            Some(old) => info!(
                chat = chat.0,
                "Updated user mapping: @{username} -> {} (was {})", user_id.0, old.0
            ),
            None => info!(chat = chat.0, "Updated user mapping: @{username} -> {}", user_id.0),
        }
        true
    }

    /// Assign `nickname` to whoever last spoke in `chat` as `username`.
    ///
    /// Fails with [`Error::UnknownUser`] if the username was never observed in
    /// this chat; nothing is mutated in that case.
    pub fn set_nickname(&self, chat: ChatId, username: &str, nickname: &str) -> Result<NicknameAck> {
        let username = normalize_username(username);
        let unknown = || Error::UnknownUser {
            username: username.clone(),
        };

        let mut entry = self.chats.get_mut(&chat).ok_or_else(unknown)?;
        let dir = &mut *entry;
        let user_id = dir
            .usernames
            .get(&username)
            .map(|b| b.user_id)
            .ok_or_else(unknown)?;

        dir.nicknames.insert(user_id, nickname.to_string());
        info!(
            chat = chat.0,
            "Nickname set for user_id {} (@{username}): {nickname}", user_id.0
        );

        Ok(NicknameAck {
            user_id,
            username,
            nickname: nickname.to_string(),
        })
    }

    /// Display name for `user_id` in `chat`. Never fails.
    ///
    /// Order: explicit nickname, then the most recently observed username
    /// (`@name`), then a placeholder built from the id's last four digits.
    pub fn nickname_of(&self, chat: ChatId, user_id: UserId) -> String {
        if let Some(dir) = self.chats.get(&chat) {
            if let Some(nick) = dir.nicknames.get(&user_id) {
                return nick.clone();
            }

            let latest = dir
                .usernames
                .iter()
                .filter(|(_, b)| b.user_id == user_id)
                .max_by_key(|(_, b)| b.seen)
                .map(|(name, _)| name);
            if let Some(name) = latest {
                return format!("@{name}");
            }
        }

        debug!(chat = chat.0, user_id = user_id.0, "no binding, using placeholder");
        placeholder_nickname(user_id)
    }

    /// Copy of every binding, sorted for stable serialization.
    pub fn snapshot(&self) -> DirectorySnapshot {
        let mut chats: Vec<ChatSnapshot> = self
            .chats
            .iter()
            .map(|entry| {
                let dir = entry.value();
                let mut usernames: Vec<UsernameEntry> = dir
                    .usernames
                    .iter()
                    .map(|(name, b)| UsernameEntry {
                        username: name.clone(),
                        user_id: b.user_id,
                        seen: b.seen,
                    })
                    .collect();
                usernames.sort_by(|a, b| a.username.cmp(&b.username));

                let mut nicknames: Vec<NicknameEntry> = dir
                    .nicknames
                    .iter()
                    .map(|(user_id, nickname)| NicknameEntry {
                        user_id: *user_id,
                        nickname: nickname.clone(),
                    })
                    .collect();
                nicknames.sort_by_key(|n| n.user_id);

                ChatSnapshot {
                    chat_id: *entry.key(),
                    usernames,
                    nicknames,
                }
            })
            .collect();
        chats.sort_by_key(|c| c.chat_id);

        DirectorySnapshot { chats }
    }

    pub fn from_snapshot(snapshot: DirectorySnapshot) -> Self {
        let directory = Self::new();
        let mut max_seen = 0u64;

        for chat in snapshot.chats {
            let mut dir = ChatDirectory::default();
            for u in chat.usernames {
                max_seen = max_seen.max(u.seen);
                dir.usernames.insert(
                    normalize_username(&u.username),
                    UsernameBinding {
                        user_id: u.user_id,
                        seen: u.seen,
                    },
                );
            }
            for n in chat.nicknames {
                dir.nicknames.insert(n.user_id, n.nickname);
            }
            directory.chats.insert(chat.chat_id, dir);
        }

        directory.clock.store(max_seen, Ordering::SeqCst);
        directory
    }

    fn tick(&self) -> u64 {
        self.clock.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// `игрок 5678` for id `12345678`; shorter ids are used whole.
pub fn placeholder_nickname(user_id: UserId) -> String {
    let digits = user_id.0.unsigned_abs().to_string();
    let tail = &digits[digits.len().saturating_sub(4)..];
    format!("игрок {tail}")
}

fn normalize_username(username: &str) -> String {
    username.trim().trim_start_matches('@').to_lowercase()
}

/// Serializable form of the whole directory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectorySnapshot {
    pub chats: Vec<ChatSnapshot>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatSnapshot {
    pub chat_id: ChatId,
    #[serde(default)]
    pub usernames: Vec<UsernameEntry>,
    #[serde(default)]
    pub nicknames: Vec<NicknameEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsernameEntry {
    pub username: String,
    pub user_id: UserId,
    #[serde(default)]
    pub seen: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicknameEntry {
    pub user_id: UserId,
    pub nickname: String,
}
