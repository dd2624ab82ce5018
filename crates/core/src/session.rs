//! Session Identifier Provider
//!
//! Derives a stable, per-user conversation identifier and keeps it in a
//! client-local key-value store for the lifetime of the browser session.

use crate::error::PortalError;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// Storage key the session identifier lives under.
pub const SESSION_STORAGE_KEY: &str = "ask-ray-session-id";

/// NLU session identifiers must stay below 36 bytes.
const SESSION_ID_LEN: usize = 32;

/// A scoped, client-local key-value store (the host's session storage).
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, PortalError>;
    fn set(&self, key: &str, value: &str) -> Result<(), PortalError>;
}

/// In-process store whose lifetime matches one client session.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, PortalError> {
        let values = self
            .values
            .lock()
            .map_err(|e| PortalError::Storage(format!("store lock poisoned: {}", e)))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PortalError> {
        let mut values = self
            .values
            .lock()
            .map_err(|e| PortalError::Storage(format!("store lock poisoned: {}", e)))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Hands out the conversation identifier for the current user.
#[derive(Clone)]
pub struct SessionIdProvider {
    store: Arc<dyn KeyValueStore>,
}

impl SessionIdProvider {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Returns the stored identifier, creating and storing one on first use.
    ///
    /// Repeated calls within the same store scope return the same value.
    pub fn get_or_create(&self, user_identity: &str) -> Result<String, PortalError> {
        if let Some(existing) = self.store.get(SESSION_STORAGE_KEY)? {
            if !existing.is_empty() {
                return Ok(existing);
            }
        }

        let session_id = build_session_id(user_identity);
        self.store.set(SESSION_STORAGE_KEY, &session_id)?;
        debug!(%session_id, "Created new conversation session id");
        Ok(session_id)
    }
}

/// Combines the user's identity with a random salt into an opaque identifier.
pub fn build_session_id(user_identity: &str) -> String {
    let salt = Uuid::new_v4();
    let mut hasher = Sha256::new();
    hasher.update(format!("{user_identity}:{salt}").as_bytes());
    let mut id = hex::encode(hasher.finalize());
    id.truncate(SESSION_ID_LEN);
    id
}
