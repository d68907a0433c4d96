//! In-process stand-ins for the hub used by unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use crate::error::RemoteError;
use crate::ports::{RemoteCollection, ServiceCaller};

pub struct FakeRemote<T> {
    items: Mutex<Option<Vec<T>>>,
    pushes: Mutex<Vec<Vec<T>>>,
    fetches: Mutex<usize>,
    push_fails: bool,
}

impl<T: Clone> FakeRemote<T> {
    /// Fetch and push both fail.
    pub fn unreachable() -> Self {
        Self {
            items: Mutex::new(None),
            pushes: Mutex::new(Vec::new()),
            fetches: Mutex::new(0),
            push_fails: true,
        }
    }

    pub fn with_items(items: Vec<T>) -> Self {
        Self {
            items: Mutex::new(Some(items)),
            pushes: Mutex::new(Vec::new()),
            fetches: Mutex::new(0),
            push_fails: false,
        }
    }

    pub fn set_items(&self, items: Vec<T>) {
        *self.items.lock().unwrap() = Some(items);
    }

    pub fn push_count(&self) -> usize {
        self.pushes.lock().unwrap().len()
    }

    pub fn last_push(&self) -> Option<Vec<T>> {
        self.pushes.lock().unwrap().last().cloned()
    }

    pub fn fetch_count(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> RemoteCollection<T> for FakeRemote<T> {
    async fn fetch(&self) -> Result<Vec<T>, RemoteError> {
        *self.fetches.lock().unwrap() += 1;
        self.items
            .lock()
            .unwrap()
            .clone()
            .ok_or(RemoteError::Status(503))
    }

    async fn push(&self, items: &[T]) -> Result<(), RemoteError> {
        self.pushes.lock().unwrap().push(items.to_vec());
        if self.push_fails {
            return Err(RemoteError::Status(503));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub domain: String,
    pub service: String,
    pub payload: Value,
}

/// Records service calls. Optionally fails, or parks each call until
/// [`FakeCaller::release`] is called.
#[derive(Default)]
pub struct FakeCaller {
    calls: Mutex<Vec<RecordedCall>>,
    failure: Option<String>,
    gate: Option<Arc<Notify>>,
}

impl FakeCaller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::default()
        }
    }

    pub fn gated() -> Self {
        Self {
            gate: Some(Arc::new(Notify::new())),
            ..Self::default()
        }
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ServiceCaller for FakeCaller {
    async fn call(&self, domain: &str, service: &str, payload: &Value) -> Result<(), RemoteError> {
        self.calls.lock().unwrap().push(RecordedCall {
            domain: domain.to_string(),
            service: service.to_string(),
            payload: payload.clone(),
        });
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        match &self.failure {
            Some(message) => Err(RemoteError::Protocol(message.clone())),
            None => Ok(()),
        }
    }
}
