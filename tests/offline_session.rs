use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use notify_manager::api::models::{Group, NotificationType, Priority, Template};
use notify_manager::error::RemoteError;
use notify_manager::manager::composer;
use notify_manager::ports::{RemoteCollection, ServiceCaller};
use notify_manager::storage::SqliteCache;
use notify_manager::{NotifyManager, SendOutcome};
use serde_json::{json, Value};

/// A hub that can be switched off and on between sessions.
struct Hub<T> {
    online: Mutex<bool>,
    stored: Mutex<Vec<T>>,
    pushes: Mutex<usize>,
}

impl<T> Hub<T> {
    fn new(online: bool) -> Self {
        Self {
            online: Mutex::new(online),
            stored: Mutex::new(Vec::new()),
            pushes: Mutex::new(0),
        }
    }

    fn set_online(&self, online: bool) {
        *self.online.lock().unwrap() = online;
    }

    fn is_online(&self) -> bool {
        *self.online.lock().unwrap()
    }
}

#[async_trait]
impl<T: Clone + Send + Sync> RemoteCollection<T> for Hub<T> {
    async fn fetch(&self) -> Result<Vec<T>, RemoteError> {
        if !self.is_online() {
            return Err(RemoteError::Status(502));
        }
        Ok(self.stored.lock().unwrap().clone())
    }

    async fn push(&self, items: &[T]) -> Result<(), RemoteError> {
        *self.pushes.lock().unwrap() += 1;
        if !self.is_online() {
            return Err(RemoteError::Status(502));
        }
        *self.stored.lock().unwrap() = items.to_vec();
        Ok(())
    }
}

#[derive(Default)]
struct Calls(Mutex<Vec<(String, Value)>>);

#[async_trait]
impl ServiceCaller for Calls {
    async fn call(&self, _domain: &str, service: &str, payload: &Value) -> Result<(), RemoteError> {
        self.0.lock().unwrap().push((service.to_string(), payload.clone()));
        Ok(())
    }
}

fn session(
    templates: &Arc<Hub<Template>>,
    groups: &Arc<Hub<Group>>,
    calls: &Arc<Calls>,
    cache: &Arc<SqliteCache>,
) -> NotifyManager {
    NotifyManager::new(templates.clone(), groups.clone(), calls.clone(), cache.clone())
}

#[tokio::test]
async fn offline_edits_survive_restart_and_repair_the_hub() {
    let templates = Arc::new(Hub::<Template>::new(false));
    let groups = Arc::new(Hub::<Group>::new(false));
    let calls = Arc::new(Calls::default());
    let cache = Arc::new(SqliteCache::in_memory().unwrap());

    let first = session(&templates, &groups, &calls, &cache);
    first.load().await;
    assert_eq!(first.templates().await.len(), 3);

    let family = first
        .save_group(Group::new("Family").toggled("pixel").toggled("iphone"))
        .await
        .unwrap();
    first.update_draft(|d| {
        let d = composer::set_title(d, "Laundry");
        let d = composer::set_message(d, "Washer finished");
        composer::set_priority(d, Priority::Low)
    });
    let saved = first.save_draft_as_template("🧺 Laundry").await.unwrap();
    assert!(templates.stored.lock().unwrap().is_empty());

    templates.set_online(true);
    groups.set_online(true);
    *templates.stored.lock().unwrap() = Vec::new();

    let second = session(&templates, &groups, &calls, &cache);
    second.load().await;

    let names: Vec<String> = second.templates().await.into_iter().map(|t| t.name).collect();
    assert!(names.contains(&"🧺 Laundry".to_string()));
    assert_eq!(second.groups().await[0].id, family.id);
    assert!(templates.stored.lock().unwrap().iter().any(|t| t.id == saved.id));
    assert_eq!(groups.stored.lock().unwrap()[0].name, "Family");
}

#[tokio::test]
async fn template_applied_to_group_target_is_dispatched() {
    let templates = Arc::new(Hub::<Template>::new(true));
    let groups = Arc::new(Hub::<Group>::new(true));
    let calls = Arc::new(Calls::default());
    let cache = Arc::new(SqliteCache::in_memory().unwrap());
    let nm = session(&templates, &groups, &calls, &cache);
    nm.load().await;

    let kids = nm.save_group(Group::new("Kids").toggled("tablet")).await.unwrap();
    nm.update_draft(|d| composer::select_group(d, &kids.id));
    assert!(nm.apply_template("alarm").await);

    assert_eq!(nm.send().await.unwrap(), SendOutcome::Sent);
    let (service, payload) = calls.0.lock().unwrap()[0].clone();
    assert_eq!(service, "send_actionable");
    assert_eq!(payload["target"], json!(["tablet"]));
    assert_eq!(payload["priority"], "critical");
    assert_eq!(payload["actions"].as_array().unwrap().len(), 2);

    nm.update_draft(|d| composer::set_type(d, NotificationType::Tts));
    nm.send().await.unwrap();
    let (service, payload) = calls.0.lock().unwrap()[1].clone();
    assert_eq!(service, "send_tts");
    assert_eq!(
        payload,
        json!({"tts_text": "Motion detected", "media_stream": "alarm_stream_max", "target": ["tablet"]})
    );
}
