//! Collaborators the core depends on. The hub adapter in [`crate::api`] and
//! the caches in [`crate::storage`] implement these; tests use fakes.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{CacheError, RemoteError};

/// Authoritative remote copy of a persisted collection.
#[async_trait]
pub trait RemoteCollection<T: Send + Sync>: Send + Sync {
    async fn fetch(&self) -> Result<Vec<T>, RemoteError>;

    /// Replaces the remote collection with `items`.
    async fn push(&self, items: &[T]) -> Result<(), RemoteError>;
}

/// Invokes a hub service, e.g. `notify_manager.send_notification`.
#[async_trait]
pub trait ServiceCaller: Send + Sync {
    async fn call(&self, domain: &str, service: &str, payload: &Value) -> Result<(), RemoteError>;
}

/// Enumerates the device ids that can receive notifications.
#[async_trait]
pub trait DeviceDirectory: Send + Sync {
    async fn devices(&self) -> Result<Vec<String>, RemoteError>;
}

/// Best-effort key/value string store surviving restarts.
pub trait LocalCache: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, CacheError>;
    fn set(&self, key: &str, value: &str) -> Result<(), CacheError>;
}

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> Confirm for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}
