//! Plugin storage
//!
//! Every plugin receives a storage handle logically partitioned into three
//! namespaces: typed settings, encrypted credentials (optionally sub-keyed
//! by catalog id), and a blob cache with optional expiry. Isolation is
//! enforced by key prefixing inside the backend: no plugin can read or
//! enumerate another plugin's keys through its handle.
//!
//! The host supplies the persistence through a `StorageFactory`; the
//! in-memory implementation here backs tests and embedded use.

use crate::core::crypto;
use crate::core::error::{QuireError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Per-plugin storage handle
#[async_trait]
pub trait PluginStorage: Send + Sync {
    // Settings: typed key/value

    async fn get_setting(&self, key: &str) -> Result<Option<Value>>;
    async fn set_setting(&self, key: &str, value: Value) -> Result<()>;
    async fn remove_setting(&self, key: &str) -> Result<()>;
    /// Keys in this plugin's settings namespace only
    async fn setting_keys(&self) -> Result<Vec<String>>;

    // Credentials: encrypted key/value, optionally per catalog

    async fn get_credential(&self, catalog_id: Option<&str>, key: &str)
        -> Result<Option<String>>;
    async fn set_credential(
        &self,
        catalog_id: Option<&str>,
        key: &str,
        value: &str,
    ) -> Result<()>;
    async fn remove_credential(&self, catalog_id: Option<&str>, key: &str) -> Result<()>;

    // Cache: blobs with optional expiry

    async fn cache_get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn cache_put(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<std::time::Duration>,
    ) -> Result<()>;
    async fn cache_remove(&self, key: &str) -> Result<()>;
    /// Clear this plugin's cache namespace
    async fn cache_clear(&self) -> Result<()>;
}

/// Builds a storage handle for a plugin id
#[async_trait]
pub trait StorageFactory: Send + Sync {
    async fn create(&self, plugin_id: &str) -> Result<Arc<dyn PluginStorage>>;
}

/// Cache record with optional expiry
#[derive(Debug, Clone)]
struct CacheEntry {
    data: Vec<u8>,
    expires_at: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

/// Shared in-memory backend behind all handles of one factory
#[derive(Default)]
struct MemoryBackend {
    settings: RwLock<HashMap<String, Value>>,
    credentials: RwLock<HashMap<String, String>>,
    cache: RwLock<HashMap<String, CacheEntry>>,
}

/// In-memory storage factory
///
/// Credentials are sealed with AES-256-GCM before they reach the backend,
/// so even the in-memory map never holds plaintext.
pub struct MemoryStorageFactory {
    backend: Arc<MemoryBackend>,
    key: [u8; 32],
}

impl MemoryStorageFactory {
    pub fn new(encryption_key: [u8; 32]) -> Self {
        Self {
            backend: Arc::new(MemoryBackend::default()),
            key: encryption_key,
        }
    }

    /// Factory with a key derived from a passphrase
    pub fn with_passphrase(passphrase: &str) -> Self {
        Self::new(crypto::derive_key(passphrase))
    }
}

#[async_trait]
impl StorageFactory for MemoryStorageFactory {
    async fn create(&self, plugin_id: &str) -> Result<Arc<dyn PluginStorage>> {
        if plugin_id.is_empty() {
            return Err(QuireError::Storage("plugin id must not be empty".into()));
        }
        Ok(Arc::new(NamespacedStorage {
            backend: self.backend.clone(),
            plugin_id: plugin_id.to_string(),
            key: self.key,
        }))
    }
}

/// Handle that prefixes every key with the owning plugin id
struct NamespacedStorage {
    backend: Arc<MemoryBackend>,
    plugin_id: String,
    key: [u8; 32],
}

impl NamespacedStorage {
    fn setting_key(&self, key: &str) -> String {
        format!("{}:{}", self.plugin_id, key)
    }

    fn credential_key(&self, catalog_id: Option<&str>, key: &str) -> String {
        match catalog_id {
            Some(catalog) => format!("{}:{}:{}", self.plugin_id, catalog, key),
            None => format!("{}::{}", self.plugin_id, key),
        }
    }

    fn cache_key(&self, key: &str) -> String {
        format!("{}:{}", self.plugin_id, key)
    }
}

#[async_trait]
impl PluginStorage for NamespacedStorage {
    async fn get_setting(&self, key: &str) -> Result<Option<Value>> {
        let settings = self.backend.settings.read().await;
        Ok(settings.get(&self.setting_key(key)).cloned())
    }

    async fn set_setting(&self, key: &str, value: Value) -> Result<()> {
        let mut settings = self.backend.settings.write().await;
        settings.insert(self.setting_key(key), value);
        Ok(())
    }

    async fn remove_setting(&self, key: &str) -> Result<()> {
        let mut settings = self.backend.settings.write().await;
        settings.remove(&self.setting_key(key));
        Ok(())
    }

    async fn setting_keys(&self) -> Result<Vec<String>> {
        let prefix = format!("{}:", self.plugin_id);
        let settings = self.backend.settings.read().await;
        Ok(settings
            .keys()
            .filter_map(|k| k.strip_prefix(&prefix))
            .map(String::from)
            .collect())
    }

    async fn get_credential(
        &self,
        catalog_id: Option<&str>,
        key: &str,
    ) -> Result<Option<String>> {
        let credentials = self.backend.credentials.read().await;
        match credentials.get(&self.credential_key(catalog_id, key)) {
            Some(sealed) => Ok(Some(crypto::open(sealed, &self.key)?)),
            None => Ok(None),
        }
    }

    async fn set_credential(
        &self,
        catalog_id: Option<&str>,
        key: &str,
        value: &str,
    ) -> Result<()> {
        let sealed = crypto::seal(value, &self.key)?;
        let mut credentials = self.backend.credentials.write().await;
        credentials.insert(self.credential_key(catalog_id, key), sealed);
        Ok(())
    }

    async fn remove_credential(&self, catalog_id: Option<&str>, key: &str) -> Result<()> {
        let mut credentials = self.backend.credentials.write().await;
        credentials.remove(&self.credential_key(catalog_id, key));
        Ok(())
    }

    async fn cache_get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let full_key = self.cache_key(key);
        let now = Utc::now();
        {
            let cache = self.backend.cache.read().await;
            match cache.get(&full_key) {
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.data.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }
        // Expired: drop it on the way out
        let mut cache = self.backend.cache.write().await;
        cache.remove(&full_key);
        Ok(None)
    }

    async fn cache_put(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl: Option<std::time::Duration>,
    ) -> Result<()> {
        let expires_at = match ttl {
            Some(ttl) => {
                let ttl = Duration::from_std(ttl)
                    .map_err(|e| QuireError::Storage(format!("cache ttl out of range: {}", e)))?;
                Some(Utc::now() + ttl)
            }
            None => None,
        };
        let mut cache = self.backend.cache.write().await;
        cache.insert(
            self.cache_key(key),
            CacheEntry {
                data: value,
                expires_at,
            },
        );
        Ok(())
    }

    async fn cache_remove(&self, key: &str) -> Result<()> {
        let mut cache = self.backend.cache.write().await;
        cache.remove(&self.cache_key(key));
        Ok(())
    }

    async fn cache_clear(&self) -> Result<()> {
        let prefix = format!("{}:", self.plugin_id);
        let mut cache = self.backend.cache.write().await;
        cache.retain(|k, _| !k.starts_with(&prefix));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn factory() -> MemoryStorageFactory {
        MemoryStorageFactory::with_passphrase("test-secret")
    }

    #[tokio::test]
    async fn test_settings_roundtrip() {
        let factory = factory();
        let storage = factory.create("app.quire.comic").await.unwrap();

        storage.set_setting("page_fit", json!("width")).await.unwrap();
        assert_eq!(
            storage.get_setting("page_fit").await.unwrap(),
            Some(json!("width"))
        );

        storage.remove_setting("page_fit").await.unwrap();
        assert_eq!(storage.get_setting("page_fit").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_plugins_cannot_see_each_other() {
        let factory = factory();
        let a = factory.create("app.quire.comic").await.unwrap();
        let b = factory.create("app.quire.opds").await.unwrap();

        a.set_setting("shared_name", json!(1)).await.unwrap();
        b.set_setting("own_name", json!(2)).await.unwrap();

        assert_eq!(b.get_setting("shared_name").await.unwrap(), None);
        assert_eq!(a.setting_keys().await.unwrap(), vec!["shared_name"]);
        assert_eq!(b.setting_keys().await.unwrap(), vec!["own_name"]);

        a.set_credential(None, "token", "secret-a").await.unwrap();
        assert_eq!(b.get_credential(None, "token").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_credentials_are_scoped_by_catalog() {
        let factory = factory();
        let storage = factory.create("app.quire.opds").await.unwrap();

        storage
            .set_credential(Some("catalog-1"), "password", "pw1")
            .await
            .unwrap();
        storage
            .set_credential(Some("catalog-2"), "password", "pw2")
            .await
            .unwrap();
        storage.set_credential(None, "password", "global").await.unwrap();

        assert_eq!(
            storage
                .get_credential(Some("catalog-1"), "password")
                .await
                .unwrap()
                .as_deref(),
            Some("pw1")
        );
        assert_eq!(
            storage
                .get_credential(Some("catalog-2"), "password")
                .await
                .unwrap()
                .as_deref(),
            Some("pw2")
        );
        assert_eq!(
            storage
                .get_credential(None, "password")
                .await
                .unwrap()
                .as_deref(),
            Some("global")
        );

        storage
            .remove_credential(Some("catalog-1"), "password")
            .await
            .unwrap();
        assert_eq!(
            storage
                .get_credential(Some("catalog-1"), "password")
                .await
                .unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn test_credentials_not_stored_in_plaintext() {
        let factory = factory();
        let storage = factory.create("app.quire.opds").await.unwrap();
        storage
            .set_credential(None, "token", "very-secret-token")
            .await
            .unwrap();

        let raw = factory.backend.credentials.read().await;
        for value in raw.values() {
            assert!(!value.contains("very-secret-token"));
        }
    }

    #[tokio::test]
    async fn test_cache_roundtrip_and_clear() {
        let factory = factory();
        let storage = factory.create("app.quire.comic").await.unwrap();

        storage
            .cache_put("cover:1", vec![1, 2, 3], None)
            .await
            .unwrap();
        assert_eq!(
            storage.cache_get("cover:1").await.unwrap(),
            Some(vec![1, 2, 3])
        );

        storage.cache_clear().await.unwrap();
        assert_eq!(storage.cache_get("cover:1").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_cache_expiry() {
        let factory = factory();
        let storage = factory.create("app.quire.comic").await.unwrap();

        storage
            .cache_put(
                "ephemeral",
                vec![9],
                Some(std::time::Duration::from_millis(10)),
            )
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        assert_eq!(storage.cache_get("ephemeral").await.unwrap(), None);

        storage
            .cache_put("durable", vec![7], Some(std::time::Duration::from_secs(3600)))
            .await
            .unwrap();
        assert_eq!(storage.cache_get("durable").await.unwrap(), Some(vec![7]));
    }

    #[tokio::test]
    async fn test_cache_clear_leaves_other_plugins_alone() {
        let factory = factory();
        let a = factory.create("a").await.unwrap();
        let b = factory.create("b").await.unwrap();

        a.cache_put("k", vec![1], None).await.unwrap();
        b.cache_put("k", vec![2], None).await.unwrap();

        a.cache_clear().await.unwrap();
        assert_eq!(a.cache_get("k").await.unwrap(), None);
        assert_eq!(b.cache_get("k").await.unwrap(), Some(vec![2]));
    }

    #[tokio::test]
    async fn test_empty_plugin_id_rejected() {
        let factory = factory();
        assert!(factory.create("").await.is_err());
    }
}
