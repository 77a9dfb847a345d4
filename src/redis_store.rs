use crate::cache::{Cache, CacheError, Store, StoreError};
use redis::{Client, Connection};

/// Connection settings for [`RedisStore`].
#[derive(Clone, Debug)]
pub struct RedisConfig {
    pub host: String,
    pub port: u16,
    pub db: i64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 6379,
            db: 0,
        }
    }
}

impl RedisConfig {
    pub fn url(&self) -> String {
        format!("redis://{}:{}/{}", self.host, self.port, self.db)
    }
}

/// Redis implementation of [`Store`] over a single synchronous connection.
pub struct RedisStore {
    connection: Connection,
}

impl std::fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisStore").finish_non_exhaustive()
    }
}

impl RedisStore {
    /// Open a connection. Reachability is checked by [`Store::ping`],
    /// which [`Cache::new`] calls.
    pub fn open(config: &RedisConfig) -> Result<Self, StoreError> {
        let client = Client::open(config.url())?;
        let connection = client.get_connection()?;
        Ok(Self { connection })
    }
}

impl Store for RedisStore {
    fn ping(&mut self) -> Result<(), StoreError> {
        let _: String = redis::cmd("PING").query(&mut self.connection)?;
        Ok(())
    }

    fn set(&mut self, key: &str, value: &str, expire_secs: Option<u64>) -> Result<(), StoreError> {
        let mut cmd = redis::cmd("SET");
        cmd.arg(key).arg(value);
        if let Some(secs) = expire_secs {
            cmd.arg("EX").arg(secs);
        }
        let _: () = cmd.query(&mut self.connection)?;
        Ok(())
    }

    fn get(&mut self, key: &str) -> Result<Option<String>, StoreError> {
        let value: Option<String> = redis::cmd("GET").arg(key).query(&mut self.connection)?;
        Ok(value)
    }

    fn delete(&mut self, key: &str) -> Result<(), StoreError> {
        let _: i64 = redis::cmd("DEL").arg(key).query(&mut self.connection)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StoreError> {
        let _: () = redis::cmd("FLUSHDB").query(&mut self.connection)?;
        Ok(())
    }
}

impl Cache<RedisStore> {
    /// Connect to `host:port`, select `db` and ping it.
    ///
    /// **Returns**
    /// - `Err(CacheError::Connection)` if the server cannot be reached.
    pub fn connect(host: &str, port: u16, db: i64) -> Result<Self, CacheError> {
        let config = RedisConfig {
            host: host.to_string(),
            port,
            db,
        };
        Self::connect_with(&config)
    }

    pub fn connect_with(config: &RedisConfig) -> Result<Self, CacheError> {
        let store = RedisStore::open(config).map_err(CacheError::Connection)?;
        Cache::new(store)
    }
}
