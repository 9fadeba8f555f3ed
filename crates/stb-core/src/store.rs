//! Optional JSON persistence for the identity directory.
//!
//! Hold sessions are never written; only username and nickname bindings
//! survive a restart.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, identity::DirectorySnapshot, Result};

#[derive(Clone, Debug)]
pub struct DirectoryStore {
    path: PathBuf,
}

impl DirectoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot. A missing file is not an error.
    pub fn load(&self) -> Result<Option<DirectorySnapshot>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| Error::InvalidState {
                path: self.path.clone(),
                reason: e.to_string(),
            })
    }

    /// Write via a temp file + rename so a crash never leaves a torn file.
    pub fn save(&self, snapshot: &DirectorySnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let json = serde_json::to_string_pretty(snapshot)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{ChatId, UserId},
        identity::IdentityDirectory,
    };

    fn tmp(prefix: &str) -> PathBuf {
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let pid = std::process::id();
        PathBuf::from(format!("/tmp/{prefix}-{pid}-{ts}"))
    }

    #[test]
    fn missing_file_loads_as_none() {
        let store = DirectoryStore::new(tmp("stb-missing").join("state.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn saves_and_loads_directory() {
        let root = tmp("stb-store");
        let store = DirectoryStore::new(root.join("nested/state.json"));

        let dir = IdentityDirectory::new();
        dir.observe(ChatId(-5), "alice", UserId(10));
        dir.set_nickname(ChatId(-5), "alice", "Eagle").unwrap();
        store.save(&dir.snapshot()).unwrap();

        let loaded = store.load().unwrap().unwrap();
        let restored = IdentityDirectory::from_snapshot(loaded);
        assert_eq!(restored.nickname_of(ChatId(-5), UserId(10)), "Eagle");

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let root = tmp("stb-corrupt");
        fs::create_dir_all(&root).unwrap();
        let path = root.join("state.json");
        fs::write(&path, "{not json").unwrap();

        let err = DirectoryStore::new(&path).load().unwrap_err();
        assert!(matches!(err, Error::InvalidState { .. }));

        let _ = fs::remove_dir_all(&root);
    }
}
