//! Free-form text → intent classification.

use crate::{errors::Error, Result};

const ACQUIRE_WORDS: &[&str] = &["встал", "стал", "+"];
const RELEASE_WORDS: &[&str] = &["слёт", "слет", "слетел", "-"];
const STATUS_WORDS: &[&str] = &["статус"];

/// What a plain (non-slash) chat message asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    Acquire,
    Release,
    Status,
    None,
}

/// Parsed `/user @username nickname...` arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SetNickname {
    /// Lowercased, without the leading `@`.
    pub username: String,
    pub nickname: String,
}

pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Classify already-normalized text. Anything unrecognized is `Intent::None`.
pub fn classify(normalized: &str) -> Intent {
    if ACQUIRE_WORDS.contains(&normalized) {
        Intent::Acquire
    } else if RELEASE_WORDS.contains(&normalized) {
        Intent::Release
    } else if STATUS_WORDS.contains(&normalized) {
        Intent::Status
    } else {
        Intent::None
    }
}

/// A slash command split into its parts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashCommand {
    /// Lowercased, without `/`.
    pub name: String,
    /// Lowercased `@botname` suffix, if the command was addressed to a bot.
    pub addressee: Option<String>,
    pub args: String,
}

impl SlashCommand {
    /// Whether this command is meant for the bot named `own_username`.
    ///
    /// Unaddressed commands are for every bot. With an unknown own username,
    /// any addressee is accepted.
    pub fn is_for(&self, own_username: Option<&str>) -> bool {
        match (&self.addressee, own_username) {
            (None, _) | (Some(_), None) => true,
            (Some(to), Some(own)) => to.eq_ignore_ascii_case(own.trim_start_matches('@')),
        }
    }
}

/// Split a slash command into name, `@botname` suffix and arguments.
///
/// Telegram may send `/cmd@botname arg1 ...`. Returns `None` for text that is
/// not a command.
pub fn parse_command(text: &str) -> Option<SlashCommand> {
    let text = text.trim();
    let head = text.strip_prefix('/')?;

    let mut parts = head.splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("");
    let args = parts.next().unwrap_or("").trim().to_string();

    let (name, addressee) = match first.split_once('@') {
        Some((name, to)) => (name, Some(to.to_lowercase())),
        None => (first, None),
    };

    Some(SlashCommand {
        name: name.to_lowercase(),
        addressee,
        args,
    })
}

/// Parse the argument string of the nickname command.
pub fn parse_set_nickname(args: &str) -> Result<SetNickname> {
    let mut words = args.split_whitespace();
    let (Some(first), Some(second)) = (words.next(), words.next()) else {
        return Err(Error::Usage(format!(
            "expected at least two arguments, got {:?}",
            args.trim()
        )));
    };

    let username = first.trim_start_matches('@').to_lowercase();
    if username.is_empty() {
        return Err(Error::Usage("empty username".to_string()));
    }

    let nickname = std::iter::once(second)
        .chain(words)
        .collect::<Vec<_>>()
        .join(" ");

    Ok(SetNickname { username, nickname })
}
