// store.rs - Persistence Adapter
// Per-user records kept as hashes in a key-value store under "user:<id>".
//
// Key Features:
// - HashStore trait over the two hash operations the bot needs (read all, set fields)
// - RedisStore: the production backend (redis crate, tokio connection manager)
// - UserStore: get_user / set_user / record_post on top of any HashStore
//
// A hash whose username field is empty is treated as a missing user.
// Nothing here is transactional: the existence check and the write that follows it
// are separate round trips, so a concurrent delete or a concurrent post from the same
// user can slip in between. That race is accepted.
//
// Used by: main.rs (startup), session.rs (post counting), commands/posts.rs

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, ConnectionInfo, IntoConnectionInfo};

use crate::context::Author;
use crate::error::StoreError;

const FIELD_USERNAME: &str = "username";
const FIELD_IS_BOT: &str = "isBot";
const FIELD_POSTS: &str = "posts";
const FIELD_LAST_SEEN: &str = "lastSeen";

pub fn user_key(id: u64) -> String {
    format!("user:{}", id)
}

// ============================================================================
// BACKENDS
// ============================================================================

#[async_trait]
pub trait HashStore: Send + Sync {
    /// All fields of a hash; an empty map when the key doesn't exist
    async fn get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    /// Set the given fields, leaving any others untouched
    async fn set_fields(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError>;
}

/// Redis-backed hash store
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    /// Connect and PING once. `url` may be a bare host:port or a redis:// URL.
    pub async fn connect(url: &str, password: Option<&str>) -> Result<Self, StoreError> {
        let info = connection_info(url, password)?;
        // addr is host:port only, never the credentials
        debug!("[STORE] Connecting to Redis at {}", info.addr);

        let client = redis::Client::open(info)?;
        let mut conn = ConnectionManager::new(client).await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        debug!("[STORE] Connected to Redis: {}", pong);

        Ok(RedisStore { conn })
    }
}

/// Parse REDIS_URL, adding the redis:// scheme when missing. REDIS_PASSWORD wins
/// over any password in the URL.
fn connection_info(url: &str, password: Option<&str>) -> Result<ConnectionInfo, StoreError> {
    let url = if url.contains("://") {
        url.to_string()
    } else {
        format!("redis://{}", url)
    };
    let mut info = url.into_connection_info()?;
    if let Some(password) = password {
        info.redis.password = Some(password.to_string());
    }
    Ok(info)
}

#[async_trait]
impl HashStore for RedisStore {
    async fn get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let mut conn = self.conn.clone();
        let hash: HashMap<String, String> = conn.hgetall(key).await?;
        Ok(hash)
    }

    async fn set_fields(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.hset_multiple(key, fields).await?;
        Ok(())
    }
}

/// In-memory hash store for tests
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    hashes: std::sync::Mutex<HashMap<String, HashMap<String, String>>>,
    pub writes: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
#[async_trait]
impl HashStore for MemoryStore {
    async fn get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        Ok(self.hashes.lock().unwrap().get(key).cloned().unwrap_or_default())
    }

    async fn set_fields(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError> {
        self.writes.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        let mut hashes = self.hashes.lock().unwrap();
        let hash = hashes.entry(key.to_string()).or_default();
        for (field, value) in fields {
            hash.insert(field.clone(), value.clone());
        }
        Ok(())
    }
}

// ============================================================================
// USER RECORDS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct UserRecord {
    pub id: u64,
    pub username: String,
    pub bot: bool,
    pub posts: u64,
    pub last_seen: Option<DateTime<Utc>>,
}

impl UserRecord {
    fn from_hash(id: u64, hash: &HashMap<String, String>) -> Result<Self, StoreError> {
        let username = hash.get(FIELD_USERNAME).cloned().unwrap_or_default();
        if username.is_empty() {
            return Err(StoreError::NotFound);
        }

        let bot = match hash.get(FIELD_IS_BOT).map(String::as_str) {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => {
                return Err(StoreError::Malformed { field: FIELD_IS_BOT, value: other.to_string() });
            }
        };

        let posts = match hash.get(FIELD_POSTS) {
            None => 0,
            Some(raw) => raw
                .parse()
                .map_err(|_| StoreError::Malformed { field: FIELD_POSTS, value: raw.clone() })?,
        };

        // An unreadable timestamp is not worth failing the whole record over
        let last_seen = hash
            .get(FIELD_LAST_SEEN)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(UserRecord { id, username, bot, posts, last_seen })
    }
}

/// Partial update for a user record. Unset fields are left alone.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub bot: Option<bool>,
    pub posts: Option<u64>,
    pub last_seen: Option<DateTime<Utc>>,
}

impl UserUpdate {
    fn into_fields(self) -> Vec<(String, String)> {
        let mut fields = Vec::new();
        if let Some(username) = self.username {
            fields.push((FIELD_USERNAME.to_string(), username));
        }
        if let Some(bot) = self.bot {
            fields.push((FIELD_IS_BOT.to_string(), bool_field(bot)));
        }
        if let Some(posts) = self.posts {
            fields.push((FIELD_POSTS.to_string(), posts.to_string()));
        }
        if let Some(last_seen) = self.last_seen {
            fields.push((FIELD_LAST_SEEN.to_string(), last_seen.to_rfc3339()));
        }
        fields
    }
}

fn bool_field(value: bool) -> String {
    let raw = if value { "1" } else { "0" };
    raw.to_string()
}

/// Persistence adapter. Only constructed when a store is configured.
#[derive(Clone)]
pub struct UserStore {
    backend: Arc<dyn HashStore>,
}

impl UserStore {
    pub fn new(backend: Arc<dyn HashStore>) -> Self {
        UserStore { backend }
    }

    /// Read a user. A missing user is created with default fields (posts = 1) when
    /// `create_if_missing` is set, otherwise StoreError::NotFound is returned and
    /// nothing is written.
    pub async fn get_user(&self, user: &Author, create_if_missing: bool) -> Result<UserRecord, StoreError> {
        let key = user_key(user.id);
        let hash = self.backend.get_all(&key).await?;

        match UserRecord::from_hash(user.id, &hash) {
            Err(StoreError::NotFound) if create_if_missing => {
                debug!("[STORE] Adding {} ({}) to database", user.username, user.id);
                self.create_user(user).await?;
                let hash = self.backend.get_all(&key).await?;
                UserRecord::from_hash(user.id, &hash)
            }
            Err(StoreError::NotFound) => {
                debug!("[STORE] User {} does not exist; not creating", user.id);
                Err(StoreError::NotFound)
            }
            other => other,
        }
    }

    /// Read by id alone, never creating
    pub async fn find_user(&self, id: u64) -> Result<UserRecord, StoreError> {
        let hash = self.backend.get_all(&user_key(id)).await?;
        UserRecord::from_hash(id, &hash)
    }

    /// Apply a partial update to an existing user. Does not create users.
    pub async fn set_user(&self, id: u64, update: UserUpdate) -> Result<(), StoreError> {
        self.find_user(id).await?;

        let fields = update.into_fields();
        if fields.is_empty() {
            return Ok(());
        }
        self.backend.set_fields(&user_key(id), &fields).await?;
        debug!("[STORE] User {} modified: {:?}", id, fields);
        Ok(())
    }

    /// Count one post for this author, creating the record on first sight.
    pub async fn record_post(&self, user: &Author) -> Result<UserRecord, StoreError> {
        match self.find_user(user.id).await {
            Ok(record) => {
                let posts = record.posts.saturating_add(1);
                let now = Utc::now();
                self.set_user(
                    user.id,
                    UserUpdate {
                        username: Some(user.username.clone()),
                        posts: Some(posts),
                        last_seen: Some(now),
                        ..Default::default()
                    },
                )
                .await?;
                Ok(UserRecord {
                    username: user.username.clone(),
                    posts,
                    last_seen: Some(now),
                    ..record
                })
            }
            Err(StoreError::NotFound) => self.get_user(user, true).await,
            Err(e) => Err(e),
        }
    }

    async fn create_user(&self, user: &Author) -> Result<(), StoreError> {
        let fields = UserUpdate {
            username: Some(user.username.clone()),
            bot: Some(user.bot),
            posts: Some(1),
            last_seen: Some(Utc::now()),
        }
        .into_fields();
        self.backend.set_fields(&user_key(user.id), &fields).await
    }
}
