//! JSON value cache over a key-value store.
//!
//! [`Cache`] encodes values with [`encoder::to_string`](crate::encoder::to_string)
//! on the way in and parses JSON on the way out. The transport sits behind
//! the [`Store`] trait: [`MemoryStore`] for in-process use and tests,
//! `RedisStore` (feature `redis`) for a real server.

use crate::encoder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::Debug;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Error type returned by [`Store`] implementations.
pub type StoreError = Box<dyn Error + Send + Sync>;

/// Synchronous key-value transport used by [`Cache`].
pub trait Store: Send {
    /// Connectivity probe, called once when a [`Cache`] is built.
    fn ping(&mut self) -> std::result::Result<(), StoreError>;

    /// Store `value` under `key`, expiring after `expire_secs` if given.
    fn set(&mut self, key: &str, value: &str, expire_secs: Option<u64>) -> std::result::Result<(), StoreError>;

    /// `Ok(None)` when the key is not set.
    fn get(&mut self, key: &str) -> std::result::Result<Option<String>, StoreError>;

    fn delete(&mut self, key: &str) -> std::result::Result<(), StoreError>;

    /// Remove every key in the store's database.
    fn clear(&mut self) -> std::result::Result<(), StoreError>;
}

/// Errors surfaced by [`Cache`]. Transport failures are passed through,
/// tagged with the operation and key; nothing is retried here.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("failed to connect to cache store: {0}")]
    Connection(#[source] StoreError),

    #[error("failed to set key {key}: {source}")]
    Set {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to get key {key}: {source}")]
    Get {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to delete key {key}: {source}")]
    Delete {
        key: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to clear cache: {0}")]
    Clear(#[source] StoreError),

    #[error("value stored under {key} is not valid JSON: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, CacheError>;

/// Thin synchronous cache façade.
///
/// ```
/// use tracing_callwrap::cache::{Cache, MemoryStore};
///
/// let cache = Cache::new(MemoryStore::new()).unwrap();
/// cache.set("greeting", "hello", Some(60)).unwrap();
/// assert_eq!(cache.get_as::<String>("greeting").unwrap().as_deref(), Some("hello"));
/// ```
#[derive(Debug)]
pub struct Cache<S> {
    store: Mutex<S>,
}

impl<S: Store> Cache<S> {
    /// Wrap `store`, probing it first so an unreachable store is reported
    /// here rather than on first use.
    pub fn new(mut store: S) -> Result<Self> {
        store.ping().map_err(CacheError::Connection)?;
        Ok(Self {
            store: Mutex::new(store),
        })
    }

    fn store(&self) -> MutexGuard<'_, S> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `value` as JSON, with an optional time-to-live in seconds.
    pub fn set<T>(&self, key: &str, value: &T, expire: Option<u64>) -> Result<()>
    where
        T: Serialize + Debug + ?Sized,
    {
        let encoded = encoder::to_string(value);
        self.store()
            .set(key, &encoded, expire)
            .map_err(|source| CacheError::Set {
                key: key.to_string(),
                source,
            })
    }

    /// The parsed value, or `None` if the key is not set. A stored JSON
    /// `null` comes back as `Some(Value::Null)`.
    pub fn get(&self, key: &str) -> Result<Option<Value>> {
        let raw = self.store().get(key).map_err(|source| CacheError::Get {
            key: key.to_string(),
            source,
        })?;
        raw.map(|text| {
            serde_json::from_str(&text).map_err(|source| CacheError::Decode {
                key: key.to_string(),
                source,
            })
        })
        .transpose()
    }

    /// Like [`get`](Self::get), deserialized into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|source| CacheError::Decode {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        self.store()
            .delete(key)
            .map_err(|source| CacheError::Delete {
                key: key.to_string(),
                source,
            })
    }

    pub fn clear(&self) -> Result<()> {
        self.store().clear().map_err(CacheError::Clear)
    }

    pub fn into_inner(self) -> S {
        self.store.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

/// In-process [`Store`] that honours expiry times.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, (String, Option<Instant>)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Store for MemoryStore {
    fn ping(&mut self) -> std::result::Result<(), StoreError> {
        Ok(())
    }

    fn set(&mut self, key: &str, value: &str, expire_secs: Option<u64>) -> std::result::Result<(), StoreError> {
        let expires_at = expire_secs.map(|secs| Instant::now() + Duration::from_secs(secs));
        self.entries.insert(key.to_string(), (value.to_string(), expires_at));
        Ok(())
    }

    fn get(&mut self, key: &str) -> std::result::Result<Option<String>, StoreError> {
        let expired = match self.entries.get(key) {
            Some((_, Some(expires_at))) => Instant::now() >= *expires_at,
            Some((_, None)) => false,
            None => return Ok(None),
        };
        if expired {
            self.entries.remove(key);
            return Ok(None);
        }
        Ok(self.entries.get(key).map(|(value, _)| value.clone()))
    }

    fn delete(&mut self, key: &str) -> std::result::Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> std::result::Result<(), StoreError> {
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    /// Store whose every operation fails, optionally including the probe.
    #[derive(Debug)]
    struct BrokenStore {
        reachable: bool,
    }

    impl Store for BrokenStore {
        fn ping(&mut self) -> std::result::Result<(), StoreError> {
            if self.reachable {
                Ok(())
            } else {
                Err("connection refused".into())
            }
        }

        fn set(&mut self, _: &str, _: &str, _: Option<u64>) -> std::result::Result<(), StoreError> {
            Err("write timeout".into())
        }

        fn get(&mut self, _: &str) -> std::result::Result<Option<String>, StoreError> {
            Err("read timeout".into())
        }

        fn delete(&mut self, _: &str) -> std::result::Result<(), StoreError> {
            Err("read-only replica".into())
        }

        fn clear(&mut self) -> std::result::Result<(), StoreError> {
            Err("FLUSHDB disabled".into())
        }
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Session {
        user: String,
        roles: Vec<String>,
    }

    #[test]
    fn set_then_get_roundtrips() {
        let cache = Cache::new(MemoryStore::new()).unwrap();
        let session = Session {
            user: "ada".into(),
            roles: vec!["admin".into()],
        };
        cache.set("session:1", &session, Some(60)).unwrap();

        assert_eq!(
            cache.get("session:1").unwrap(),
            Some(json!({"user": "ada", "roles": ["admin"]}))
        );
        assert_eq!(cache.get_as::<Session>("session:1").unwrap(), Some(session));
    }

    #[test]
    fn absent_is_distinct_from_null() {
        let cache = Cache::new(MemoryStore::new()).unwrap();
        cache.set("nothing", &Option::<u8>::None, None).unwrap();

        assert_eq!(cache.get("nothing").unwrap(), Some(Value::Null));
        assert_eq!(cache.get("missing").unwrap(), None);
    }

    #[test]
    fn delete_and_clear_remove_keys() {
        let cache = Cache::new(MemoryStore::new()).unwrap();
        cache.set("a", &1, None).unwrap();
        cache.set("b", &2, None).unwrap();

        cache.delete("a").unwrap();
        assert_eq!(cache.get("a").unwrap(), None);
        assert_eq!(cache.get("b").unwrap(), Some(json!(2)));

        cache.clear().unwrap();
        assert_eq!(cache.get("b").unwrap(), None);
        assert!(cache.into_inner().is_empty());
    }

    #[test]
    fn expired_entries_read_as_absent() {
        let cache = Cache::new(MemoryStore::new()).unwrap();
        cache.set("flash", "gone", Some(0)).unwrap();
        assert_eq!(cache.get("flash").unwrap(), None);
    }

    #[test]
    fn unreachable_store_fails_at_construction() {
        let err = Cache::new(BrokenStore { reachable: false }).unwrap_err();
        assert!(matches!(err, CacheError::Connection(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn transport_failures_carry_operation_and_key() {
        let cache = Cache::new(BrokenStore { reachable: true }).unwrap();

        let err = cache.set("k", &1, None).unwrap_err();
        assert!(matches!(err, CacheError::Set { ref key, .. } if key == "k"));
        assert_eq!(err.to_string(), "failed to set key k: write timeout");

        assert!(matches!(cache.get("k").unwrap_err(), CacheError::Get { .. }));
        assert!(matches!(cache.delete("k").unwrap_err(), CacheError::Delete { .. }));
        assert!(matches!(cache.clear().unwrap_err(), CacheError::Clear(_)));
    }

    #[test]
    fn non_json_payload_is_a_decode_error() {
        let mut store = MemoryStore::new();
        store.set("raw", "not json", None).unwrap();
        let cache = Cache::new(store).unwrap();
        assert!(matches!(cache.get("raw").unwrap_err(), CacheError::Decode { .. }));
    }
}
