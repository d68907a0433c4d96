//! Transient notification state. Every operation takes a [`Draft`] by value
//! and returns the updated one, so no callback can observe a half-edited
//! draft or mutate a template through a shared reference.

use indexmap::IndexSet;

use crate::api::models::{ButtonAction, Draft, NotificationType, Priority, TargetMode};
use crate::error::ValidationError;

pub const BUTTON_PRESETS: [&str; 5] = [
    "confirm_dismiss",
    "yes_no",
    "alarm_response",
    "door_response",
    "reply",
];

/// Fixed button sets. Unknown names give an empty list.
pub fn button_preset(name: &str) -> Vec<ButtonAction> {
    match name {
        "confirm_dismiss" => vec![
            ButtonAction::new("CONFIRM", "✅ Confirm"),
            ButtonAction::new("DISMISS", "❌ Dismiss"),
        ],
        "yes_no" => vec![
            ButtonAction::new("YES", "👍 Yes"),
            ButtonAction::new("NO", "👎 No"),
        ],
        "alarm_response" => vec![
            ButtonAction::new("ALARM_CONFIRM", "✅ All OK"),
            ButtonAction::new("ALARM_SNOOZE", "⏰ Later"),
            ButtonAction::new("ALARM_EMERGENCY", "🆘 Emergency!"),
        ],
        "door_response" => vec![
            ButtonAction::new("DOOR_UNLOCK", "🔓 Open"),
            ButtonAction::new("DOOR_IGNORE", "🚪 Ignore"),
            ButtonAction::new("DOOR_SPEAK", "🔊 Speak"),
        ],
        "reply" => vec![ButtonAction {
            behavior: Some("textInput".into()),
            text_input_button_title: Some("Send".into()),
            text_input_placeholder: Some("Message...".into()),
            ..ButtonAction::new("REPLY", "💬 Reply")
        }],
        _ => Vec::new(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonField {
    Action,
    Title,
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn set_title(draft: Draft, title: &str) -> Draft {
    Draft { title: title.to_string(), ..draft }
}

pub fn set_message(draft: Draft, message: &str) -> Draft {
    Draft { message: message.to_string(), ..draft }
}

/// Buttons are kept whatever the type, so they come back when switching
/// back to [`NotificationType::Buttons`].
pub fn set_type(draft: Draft, kind: NotificationType) -> Draft {
    Draft { kind, ..draft }
}

pub fn set_priority(draft: Draft, priority: Priority) -> Draft {
    Draft { priority, ..draft }
}

pub fn set_camera(mut draft: Draft, camera: &str) -> Draft {
    draft.target.camera = non_empty(camera);
    draft
}

pub fn set_click_action(mut draft: Draft, click_action: &str) -> Draft {
    draft.target.click_action = non_empty(click_action);
    draft
}

pub fn apply_button_preset(draft: Draft, name: &str) -> Draft {
    Draft { buttons: button_preset(name), ..draft }
}

pub fn add_button(mut draft: Draft) -> Draft {
    draft.buttons.push(ButtonAction::default());
    draft
}

pub fn remove_button(mut draft: Draft, index: usize) -> Draft {
    if index < draft.buttons.len() {
        draft.buttons.remove(index);
    }
    draft
}

pub fn update_button(mut draft: Draft, index: usize, field: ButtonField, value: &str) -> Draft {
    if let Some(button) = draft.buttons.get_mut(index) {
        match field {
            ButtonField::Action => button.action = value.to_string(),
            ButtonField::Title => button.title = value.to_string(),
        }
    }
    draft
}

/// Adds or removes one device. Picking devices drops any selected group, and
/// an empty selection means all devices again.
pub fn toggle_device_target(mut draft: Draft, device: &str) -> Draft {
    let mut devices = match draft.target.mode {
        TargetMode::Devices(devices) => devices,
        TargetMode::All | TargetMode::Group(_) => Vec::new(),
    };
    match devices.iter().position(|d| d == device) {
        Some(idx) => {
            devices.remove(idx);
        }
        None => devices.push(device.to_string()),
    }
    draft.target.mode = if devices.is_empty() {
        TargetMode::All
    } else {
        TargetMode::Devices(devices)
    };
    draft
}

pub fn select_group(mut draft: Draft, group_id: &str) -> Draft {
    draft.target.mode = TargetMode::Group(group_id.to_string());
    draft
}

pub fn select_all_devices(mut draft: Draft) -> Draft {
    draft.target.mode = TargetMode::All;
    draft
}

/// Targets exactly `devices`, in first-seen order. Repeats count once, so
/// naming a device twice never deselects it. An empty list targets all.
pub fn select_devices<'a>(mut draft: Draft, devices: impl IntoIterator<Item = &'a str>) -> Draft {
    let devices: IndexSet<&str> = devices.into_iter().collect();
    draft.target.mode = if devices.is_empty() {
        TargetMode::All
    } else {
        TargetMode::Devices(devices.into_iter().map(str::to_string).collect())
    };
    draft
}

/// Owns the draft being edited.
#[derive(Debug, Clone, Default)]
pub struct NotificationComposer {
    draft: Draft,
}

impl NotificationComposer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// Replaces the draft with `f(current)`.
    pub fn update(&mut self, f: impl FnOnce(Draft) -> Draft) -> &Draft {
        let current = std::mem::take(&mut self.draft);
        self.draft = f(current);
        &self.draft
    }

    /// The only hard precondition for sending is a message.
    pub fn validated(&self) -> Result<Draft, ValidationError> {
        if self.draft.message.is_empty() {
            return Err(ValidationError::MissingMessage);
        }
        Ok(self.draft.clone())
    }
}
