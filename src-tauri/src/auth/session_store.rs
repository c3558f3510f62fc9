//! Session persistence
//!
//! Keeps the provider's refresh token between launches so an existing
//! session can be resumed on cold start. The desktop build stores it in the
//! OS credential store through `keyring`.

use crate::error::{AppError, Result};
use keyring::Entry;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

const SERVICE_NAME: &str = "Aranya";
const SESSION_KEY: &str = "session";

/// What is needed to resume a session without asking for credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredSession {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub refresh_token: String,
}

pub trait SessionStore: Send + Sync {
    fn load(&self) -> Result<Option<StoredSession>>;
    fn save(&self, session: &StoredSession) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Session kept in the OS credential store
pub struct KeyringSessionStore;

impl KeyringSessionStore {
    fn entry() -> Result<Entry> {
        Ok(Entry::new(SERVICE_NAME, SESSION_KEY)?)
    }
}

impl SessionStore for KeyringSessionStore {
    fn load(&self) -> Result<Option<StoredSession>> {
        match Self::entry()?.get_password() {
            Ok(json) => Ok(Some(serde_json::from_str(&json)?)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(AppError::Credential(e)),
        }
    }

    fn save(&self, session: &StoredSession) -> Result<()> {
        Self::entry()?.set_password(&serde_json::to_string(session)?)?;

        tracing::info!("Session stored in credential manager");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match Self::entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => {
                tracing::info!("Session removed from credential manager");
                Ok(())
            }
            Err(e) => Err(AppError::Credential(e)),
        }
    }
}

/// Session kept for the lifetime of the process only
#[derive(Clone, Default)]
pub struct MemorySessionStore {
    session: Arc<Mutex<Option<StoredSession>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<StoredSession>> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<StoredSession>> {
        Ok(self.slot().clone())
    }

    fn save(&self, session: &StoredSession) -> Result<()> {
        *self.slot() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemorySessionStore::new();
        assert_eq!(store.load().unwrap(), None);

        let session = StoredSession {
            uid: "u1".to_string(),
            email: Some("ranger@example.org".to_string()),
            display_name: None,
            refresh_token: "refresh".to_string(),
        };
        store.save(&session).unwrap();
        assert_eq!(store.load().unwrap(), Some(session));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }
}
