use crate::error::CacheError;
use crate::ports::LocalCache;
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

pub const TEMPLATES_KEY: &str = "notify_manager_templates";
pub const GROUPS_KEY: &str = "notify_manager_groups";

pub fn default_db_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("io", "notify-manager", "NotifyManager")?;
    Some(proj.data_dir().join("cache.sqlite"))
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

// Local copy of templates and groups so edits survive an unreachable hub
pub struct SqliteCache {
    conn: Mutex<Connection>,
}

impl SqliteCache {
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        let _ = ensure_dir(path);
        Self::init(Connection::open(path)?)
    }

    pub fn open_default() -> Result<Self, CacheError> {
        let path = default_db_path().ok_or_else(|| CacheError::Unavailable("no data dir".into()))?;
        Self::open(&path)
    }

    pub fn in_memory() -> Result<Self, CacheError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, CacheError> {
        conn.execute_batch(
            r#"
            PRAGMA journal_mode = WAL;
            CREATE TABLE IF NOT EXISTS cache (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, CacheError> {
        self.conn
            .lock()
            .map_err(|_| CacheError::Unavailable("cache lock poisoned".into()))
    }

    pub fn updated_at(&self, key: &str) -> Result<Option<i64>, CacheError> {
        let conn = self.lock()?;
        let ts = conn
            .query_row("SELECT updated_at FROM cache WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(ts)
    }
}

impl LocalCache for SqliteCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let conn = self.lock()?;
        let value = conn
            .query_row("SELECT value FROM cache WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| CacheError::Unavailable(e.to_string()))?
            .as_secs() as i64;
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO cache (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value=excluded.value,
                updated_at=excluded.updated_at
            "#,
            params![key, value, now],
        )?;
        Ok(())
    }
}

/// Process-lifetime cache for sessions that should leave nothing on disk.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalCache for MemoryCache {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Unavailable("cache lock poisoned".into()))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), CacheError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| CacheError::Unavailable("cache lock poisoned".into()))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_roundtrips_and_overwrites() {
        let cache = SqliteCache::in_memory().unwrap();
        assert_eq!(cache.get(TEMPLATES_KEY).unwrap(), None);

        cache.set(TEMPLATES_KEY, "[]").unwrap();
        cache.set(TEMPLATES_KEY, r#"[{"id":"tpl_1"}]"#).unwrap();

        assert_eq!(cache.get(TEMPLATES_KEY).unwrap().as_deref(), Some(r#"[{"id":"tpl_1"}]"#));
        assert!(cache.updated_at(TEMPLATES_KEY).unwrap().is_some());
        assert_eq!(cache.get(GROUPS_KEY).unwrap(), None);
    }

    #[test]
    fn memory_cache_is_keyed() {
        let cache = MemoryCache::new();
        cache.set(GROUPS_KEY, "a").unwrap();
        assert_eq!(cache.get(GROUPS_KEY).unwrap().as_deref(), Some("a"));
        assert_eq!(cache.get(TEMPLATES_KEY).unwrap(), None);
    }
}
