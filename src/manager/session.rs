use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, info};
use tokio::sync::Mutex as AsyncMutex;

use crate::api::models::{Draft, Group, Template};
use crate::manager::collection::DeleteOutcome;
use crate::manager::composer::{self, NotificationComposer};
use crate::manager::dispatch::{self, DOMAIN};
use crate::manager::groups::GroupCatalog;
use crate::manager::status::{Status, StatusLine};
use crate::manager::templates::{self, TemplateCatalog};
use crate::error::{Error, Result};
use crate::ports::{Confirm, LocalCache, RemoteCollection, ServiceCaller};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// Nothing to send: the message is empty.
    EmptyMessage,
    /// Another send is still in flight.
    Busy,
}

/// Holds the busy flag for the duration of one send.
struct SendPermit<'a>(&'a AtomicBool);

impl<'a> SendPermit<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for SendPermit<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Everything a presentation layer needs: the draft, both catalogs, sending
/// and the status line.
pub struct NotifyManager {
    composer: Mutex<NotificationComposer>,
    templates: AsyncMutex<TemplateCatalog>,
    groups: AsyncMutex<GroupCatalog>,
    caller: Arc<dyn ServiceCaller>,
    busy: AtomicBool,
    status: StatusLine,
}

impl NotifyManager {
    pub fn new(
        template_remote: Arc<dyn RemoteCollection<Template>>,
        group_remote: Arc<dyn RemoteCollection<Group>>,
        caller: Arc<dyn ServiceCaller>,
        cache: Arc<dyn LocalCache>,
    ) -> Self {
        Self {
            composer: Mutex::new(NotificationComposer::new()),
            templates: AsyncMutex::new(TemplateCatalog::new(template_remote, cache.clone())),
            groups: AsyncMutex::new(GroupCatalog::new(group_remote, cache)),
            caller,
            busy: AtomicBool::new(false),
            status: StatusLine::new(),
        }
    }

    fn composer(&self) -> MutexGuard<'_, NotificationComposer> {
        // A poisoned lock still holds a valid draft.
        self.composer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub async fn load(&self) {
        self.templates.lock().await.load().await;
        self.groups.lock().await.load().await;
    }

    pub fn draft(&self) -> Draft {
        self.composer().draft().clone()
    }

    pub fn update_draft(&self, f: impl FnOnce(Draft) -> Draft) -> Draft {
        self.composer().update(f).clone()
    }

    pub fn status(&self) -> Option<Status> {
        self.status.current()
    }

    pub fn is_sending(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub async fn templates(&self) -> Vec<Template> {
        self.templates.lock().await.templates().to_vec()
    }

    pub async fn groups(&self) -> Vec<Group> {
        self.groups.lock().await.groups().to_vec()
    }

    pub fn apply_button_preset(&self, name: &str) -> Draft {
        self.update_draft(|d| composer::apply_button_preset(d, name))
    }

    pub fn toggle_device_target(&self, device: &str) -> Draft {
        self.update_draft(|d| composer::toggle_device_target(d, device))
    }

    /// Returns `false` when no template has that id.
    pub async fn apply_template(&self, id: &str) -> bool {
        let template = self.templates.lock().await.get(id).cloned();
        match template {
            Some(template) => {
                self.update_draft(|d| templates::apply(&template, d));
                true
            }
            None => false,
        }
    }

    pub async fn save_template(&self, template: Template) -> Result<Template> {
        Ok(self.templates.lock().await.save(template).await?)
    }

    pub async fn save_draft_as_template(&self, name: &str) -> Result<Template> {
        let draft = self.draft();
        let saved = self.templates.lock().await.save_draft_as(name, &draft).await?;
        self.status.set(Status::TemplateSaved);
        Ok(saved)
    }

    pub async fn delete_template(&self, id: &str, confirm: &dyn Confirm) -> DeleteOutcome {
        self.templates.lock().await.delete(id, confirm).await
    }

    pub async fn save_group(&self, group: Group) -> Result<Group> {
        Ok(self.groups.lock().await.save(group).await?)
    }

    pub async fn toggle_group_membership(&self, group_id: &str, device: &str) -> Result<Group> {
        self.groups.lock().await.toggle_membership(group_id, device).await
    }

    pub async fn delete_group(&self, id: &str, confirm: &dyn Confirm) -> DeleteOutcome {
        self.groups.lock().await.delete(id, confirm).await
    }

    /// Sends the current draft. An empty message or a send already in flight
    /// is skipped without touching the hub. A hub failure is reported both as
    /// the returned error and on the status line.
    pub async fn send(&self) -> Result<SendOutcome> {
        let validated = self.composer().validated();
        let Ok(draft) = validated else {
            return Ok(SendOutcome::EmptyMessage);
        };
        let Some(_permit) = SendPermit::acquire(&self.busy) else {
            debug!("send ignored: another send is in flight");
            return Ok(SendOutcome::Busy);
        };
        self.status.clear();

        let groups = self.groups().await;
        let dispatch = dispatch::route(&draft, &groups);
        match self.caller.call(DOMAIN, dispatch.service, &dispatch.payload).await {
            Ok(()) => {
                info!("{}.{} delivered", DOMAIN, dispatch.service);
                self.status.set(Status::Sent);
                Ok(SendOutcome::Sent)
            }
            Err(e) => {
                self.status.set(Status::Error(e.to_string()));
                Err(Error::Dispatch(e))
            }
        }
    }
}
