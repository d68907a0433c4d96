//! Remote-first, cache-backed list of records.
//!
//! The hub is authoritative when reachable. Every mutation is written to the
//! local cache before the remote push is attempted, so a failed push never
//! loses an edit. There is no versioning: the last write wins.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, warn};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CacheError;
use crate::ports::{Confirm, LocalCache, RemoteCollection};

pub const DELETE_PROMPT: &str = "Really delete?";

/// A persisted item with an opaque id of the form `<prefix>_<n>`.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const ID_PREFIX: &'static str;

    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
}

/// Hands out `<prefix>_<millis>` ids, bumping past the last issued value so
/// two saves within the same millisecond still differ.
#[derive(Debug)]
pub struct IdGenerator {
    prefix: &'static str,
    last: u64,
}

impl IdGenerator {
    pub fn new(prefix: &'static str) -> Self {
        Self { prefix, last: 0 }
    }

    pub fn next(&mut self) -> String {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        self.last = now.max(self.last.saturating_add(1));
        format!("{}_{}", self.prefix, self.last)
    }

    /// Never issue anything at or below an id already in use.
    fn observe(&mut self, id: &str) {
        let n = id
            .strip_prefix(self.prefix)
            .and_then(|rest| rest.strip_prefix('_'))
            .and_then(|n| n.parse::<u64>().ok());
        if let Some(n) = n {
            self.last = self.last.max(n);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Declined,
    Removed,
    NotFound,
}

pub struct PersistentCollection<T: Record> {
    items: Vec<T>,
    loaded: bool,
    cache_key: &'static str,
    remote: Arc<dyn RemoteCollection<T>>,
    cache: Arc<dyn LocalCache>,
    ids: IdGenerator,
}

impl<T: Record> PersistentCollection<T> {
    /// `seed` is the state used until something is loaded or saved. It is not
    /// written to the cache by construction.
    pub fn new(
        cache_key: &'static str,
        seed: Vec<T>,
        remote: Arc<dyn RemoteCollection<T>>,
        cache: Arc<dyn LocalCache>,
    ) -> Self {
        let mut this = Self {
            items: Vec::new(),
            loaded: false,
            cache_key,
            remote,
            cache,
            ids: IdGenerator::new(T::ID_PREFIX),
        };
        this.adopt(seed);
        this
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Pulls the remote copy, falling back to the local cache. A cached set is
    /// pushed back once to repair the hub. The seed is only pushed when the hub
    /// could not be read at all; an empty hub keeps it local until a save.
    pub async fn load(&mut self) {
        if self.loaded {
            return;
        }
        let unreachable = match self.remote.fetch().await {
            Ok(items) if !items.is_empty() => {
                debug!("{}: loaded {} items from hub", self.cache_key, items.len());
                self.adopt(items);
                self.loaded = true;
                return;
            }
            Ok(_) => {
                debug!("{}: hub copy is empty", self.cache_key);
                false
            }
            Err(e) => {
                debug!("{}: hub unavailable: {}", self.cache_key, e);
                true
            }
        };

        let cached = self.read_cache();
        let restored = cached.is_some();
        if let Some(cached) = cached {
            debug!("{}: using {} cached items", self.cache_key, cached.len());
            self.adopt(cached);
        }
        if !self.items.is_empty() && (restored || unreachable) {
            self.push_remote().await;
        }
    }

    /// Upserts `item` and returns the stored copy, which carries the assigned
    /// id when the item was new.
    pub async fn save(&mut self, mut item: T) -> T {
        match self.position(item.id()) {
            Some(idx) => self.items[idx] = item.clone(),
            None => {
                item.set_id(self.ids.next());
                self.items.push(item.clone());
            }
        }
        self.persist().await;
        item
    }

    pub async fn delete(&mut self, id: &str, confirm: &dyn Confirm) -> DeleteOutcome {
        if !confirm.confirm(DELETE_PROMPT) {
            return DeleteOutcome::Declined;
        }
        let Some(idx) = self.position(id) else {
            return DeleteOutcome::NotFound;
        };
        self.items.remove(idx);
        self.persist().await;
        DeleteOutcome::Removed
    }

    fn position(&self, id: &str) -> Option<usize> {
        if id.is_empty() {
            return None;
        }
        self.items.iter().position(|item| item.id() == id)
    }

    fn adopt(&mut self, items: Vec<T>) {
        for item in &items {
            self.ids.observe(item.id());
        }
        self.items = items;
    }

    fn read_cache(&self) -> Option<Vec<T>> {
        let raw = match self.cache.get(self.cache_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                debug!("{}: cache unreadable: {}", self.cache_key, e);
                return None;
            }
        };
        match serde_json::from_str::<Vec<T>>(&raw) {
            Ok(items) if !items.is_empty() => Some(items),
            Ok(_) => None,
            Err(e) => {
                warn!("{}: discarding corrupt cache entry: {}", self.cache_key, e);
                None
            }
        }
    }

    async fn persist(&self) {
        let written = serde_json::to_string(&self.items)
            .map_err(CacheError::from)
            .and_then(|raw| self.cache.set(self.cache_key, &raw));
        if let Err(e) = written {
            warn!("{}: cache write failed: {}", self.cache_key, e);
        }
        self.push_remote().await;
    }

    async fn push_remote(&self) {
        if let Err(e) = self.remote.push(&self.items).await {
            debug!("{}: hub sync failed: {}", self.cache_key, e);
        }
    }
}
