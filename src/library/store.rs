use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, anyhow};

use super::session::Session;

/// Load/save port for session state. Load once at start, save on change.
pub trait SessionStore {
    fn load(&self) -> Result<Session>;
    fn save(&self, session: &Session) -> Result<()>;
}

/// Session persisted as a JSON document on disk.
#[derive(Clone, Debug)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for JsonFileStore {
    fn load(&self) -> Result<Session> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no session file, starting fresh");
                return Ok(Session::default());
            }
            Err(error) => {
                return Err(error)
                    .with_context(|| format!("failed to read session {}", self.path.display()));
            }
        };

        serde_json::from_str(&raw)
            .with_context(|| format!("invalid session JSON in {}", self.path.display()))
    }

    fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let raw = serde_json::to_string_pretty(session).context("failed to encode session")?;
        fs::write(&self.path, raw)
            .with_context(|| format!("failed to write session {}", self.path.display()))
    }
}

/// In-process store, used when nothing should touch the disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    session: Mutex<Session>,
}

impl MemoryStore {
    pub fn new(session: Session) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }
}

impl SessionStore for MemoryStore {
    fn load(&self) -> Result<Session> {
        self.session
            .lock()
            .map(|session| session.clone())
            .map_err(|_| anyhow!("memory store lock poisoned"))
    }

    fn save(&self, session: &Session) -> Result<()> {
        let mut stored = self
            .session
            .lock()
            .map_err(|_| anyhow!("memory store lock poisoned"))?;
        *stored = session.clone();
        Ok(())
    }
}
