use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, Result};

/// Typed configuration, read from the environment (plus an optional `.env`).
#[derive(Clone, Debug)]
pub struct Config {
    pub telegram_bot_token: String,

    /// When set, username/nickname bindings are persisted here as JSON.
    pub state_file: Option<PathBuf>,

    /// Reply to the triggering message instead of posting standalone.
    pub reply_to_message: bool,

    /// Slash command used to assign nicknames (`/user @name nick`).
    pub nickname_command: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the process env in production).
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").unwrap_or_default();
        if telegram_bot_token.trim().is_empty() {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        }

        let state_file = get("STATE_FILE").and_then(non_empty).map(PathBuf::from);
        let reply_to_message = get("REPLY_TO_MESSAGE")
            .and_then(|s| parse_bool(&s))
            .unwrap_or(true);

        let nickname_command = get("NICKNAME_COMMAND")
            .and_then(non_empty)
            .map(|s| s.trim().trim_start_matches('/').to_lowercase())
            .unwrap_or_else(|| "user".to_string());
        if nickname_command.is_empty() || nickname_command.contains(char::is_whitespace) {
            return Err(Error::Config(format!(
                "NICKNAME_COMMAND must be a single word, got {nickname_command:?}"
            )));
        }

        Ok(Self {
            telegram_bot_token: telegram_bot_token.trim().to_string(),
            state_file,
            reply_to_message,
            nickname_command,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let Some((key, val)) = parse_dotenv_line(raw) else {
            continue;
        };
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv_line(raw: &str) -> Option<(String, String)> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let (k, v) = line.split_once('=')?;
    let key = k.trim();
    if key.is_empty() {
        return None;
    }

    let mut val = v.trim();
    // Strip optional surrounding quotes.
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        val = &val[1..val.len() - 1];
    }

    Some((key.to_string(), val.to_string()))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
