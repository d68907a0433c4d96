use std::sync::Arc;

use crate::api::models::{ButtonAction, Draft, NotificationType, Priority, Template};
use crate::manager::collection::{DeleteOutcome, PersistentCollection, Record};
use crate::error::ValidationError;
use crate::ports::{Confirm, LocalCache, RemoteCollection};
use crate::storage::TEMPLATES_KEY;

impl Record for Template {
    const ID_PREFIX: &'static str = "tpl";

    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// Shown when neither the hub nor the cache has any templates.
pub fn builtin_templates() -> Vec<Template> {
    vec![
        Template {
            id: "doorbell".into(),
            name: "🚪 Doorbell".into(),
            title: "Doorbell".into(),
            message: "Someone is at the door!".into(),
            kind: NotificationType::Simple,
            priority: Priority::High,
            buttons: vec![
                ButtonAction::new("DOOR_OPEN", "🔓 Open"),
                ButtonAction::new("DOOR_IGNORE", "Ignore"),
            ],
        },
        Template {
            id: "alarm".into(),
            name: "🚨 Alarm".into(),
            title: "Alarm!".into(),
            message: "Motion detected".into(),
            kind: NotificationType::Buttons,
            priority: Priority::Critical,
            buttons: vec![
                ButtonAction::new("ALARM_OK", "✅ OK"),
                ButtonAction::new("ALARM_EMERGENCY", "🆘 Emergency"),
            ],
        },
        Template {
            id: "reminder".into(),
            name: "⏰ Reminder".into(),
            title: "Reminder".into(),
            message: String::new(),
            kind: NotificationType::Simple,
            priority: Priority::Normal,
            buttons: Vec::new(),
        },
    ]
}

pub struct TemplateCatalog {
    store: PersistentCollection<Template>,
}

impl TemplateCatalog {
    pub fn new(remote: Arc<dyn RemoteCollection<Template>>, cache: Arc<dyn LocalCache>) -> Self {
        Self {
            store: PersistentCollection::new(TEMPLATES_KEY, builtin_templates(), remote, cache),
        }
    }

    pub fn templates(&self) -> &[Template] {
        self.store.items()
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.store.get(id)
    }

    pub fn is_loaded(&self) -> bool {
        self.store.is_loaded()
    }

    pub async fn load(&mut self) {
        self.store.load().await;
    }

    pub async fn save(&mut self, template: Template) -> Result<Template, ValidationError> {
        if template.name.trim().is_empty() {
            return Err(ValidationError::MissingName);
        }
        Ok(self.store.save(template).await)
    }

    /// Stores the composer's current content as a new template.
    pub async fn save_draft_as(
        &mut self,
        name: &str,
        draft: &Draft,
    ) -> Result<Template, ValidationError> {
        self.save(Template {
            id: String::new(),
            name: name.to_string(),
            title: draft.title.clone(),
            message: draft.message.clone(),
            kind: draft.kind,
            priority: draft.priority,
            buttons: draft.buttons.clone(),
        })
        .await
    }

    pub async fn delete(&mut self, id: &str, confirm: &dyn Confirm) -> DeleteOutcome {
        self.store.delete(id, confirm).await
    }
}

/// Copies a template's content into `draft`. The target is left as is.
pub fn apply(template: &Template, draft: Draft) -> Draft {
    Draft {
        title: template.title.clone(),
        message: template.message.clone(),
        kind: template.kind,
        priority: template.priority,
        buttons: template.buttons.clone(),
        ..draft
    }
}
