// ABOUTME: Host services injected into mounted components as the `$mvt` global
// ABOUTME: Current user lookup and a JSON key-value store, with an in-memory default

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostUser {
    pub id: String,
    pub name: String,
}

impl Default for HostUser {
    fn default() -> Self {
        Self {
            id: "test-user".to_string(),
            name: "Test User".to_string(),
        }
    }
}

#[async_trait]
pub trait HostServices: Send + Sync {
    fn current_user(&self) -> HostUser;

    /// Stored value for `key`; `None` when missing or unreadable
    async fn get_item(&self, key: &str) -> Option<Value>;

    async fn set_item(&self, key: &str, value: &Value) -> anyhow::Result<()>;
}

/// Process-local host services. Values are kept as JSON text, the same shape
/// a browser storage backend would hold.
#[derive(Debug, Default)]
pub struct MemoryHostServices {
    user: HostUser,
    items: RwLock<HashMap<String, String>>,
}

impl MemoryHostServices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(user: HostUser) -> Self {
        Self {
            user,
            items: RwLock::new(HashMap::new()),
        }
    }

    /// Store raw text under `key`, bypassing serialization
    pub fn insert_raw(&self, key: impl Into<String>, raw: impl Into<String>) {
        if let Ok(mut items) = self.items.write() {
            items.insert(key.into(), raw.into());
        }
    }
}

#[async_trait]
impl HostServices for MemoryHostServices {
    fn current_user(&self) -> HostUser {
        self.user.clone()
    }

    async fn get_item(&self, key: &str) -> Option<Value> {
        let raw = match self.items.read() {
            Ok(items) => items.get(key).cloned()?,
            Err(e) => {
                error!("Error getting item from store: {}", e);
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                error!("Error getting item from store: {}", e);
                None
            }
        }
    }

    async fn set_item(&self, key: &str, value: &Value) -> anyhow::Result<()> {
        let raw = serde_json::to_string(value)
            .with_context(|| format!("Failed to serialize value for '{}'", key))?;

        let mut items = self
            .items
            .write()
            .map_err(|e| anyhow::anyhow!("Error setting item in store: {}", e))?;
        items.insert(key.to_string(), raw);
        debug!("Stored item '{}'", key);
        Ok(())
    }
}
