use clap::ValueEnum;
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    #[default]
    Simple,
    Buttons,
    Image,
    Tts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Normal,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Normal => "normal",
            Priority::High => "high",
            Priority::Critical => "critical",
        }
    }
}

/// One actionable button on a notification. Order within a list is the
/// order the device renders them in.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ButtonAction {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub behavior: Option<String>,
    #[serde(
        default,
        rename = "textInputButtonTitle",
        skip_serializing_if = "Option::is_none"
    )]
    pub text_input_button_title: Option<String>,
    #[serde(
        default,
        rename = "textInputPlaceholder",
        skip_serializing_if = "Option::is_none"
    )]
    pub text_input_placeholder: Option<String>,
}

impl ButtonAction {
    pub fn new(action: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            action: action.into(),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Buttons missing either field are dropped before dispatch.
    pub fn is_complete(&self) -> bool {
        !self.action.is_empty() && !self.title.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, rename = "type")]
    pub kind: NotificationType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub buttons: Vec<ButtonAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Group {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub devices: IndexSet<String>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds `device` when absent and removes it when present. Used by both the
    /// editor working copy and the device grid so they converge.
    pub fn toggled(mut self, device: &str) -> Self {
        if !self.devices.shift_remove(device) {
            self.devices.insert(device.to_string());
        }
        self
    }

    pub fn contains(&self, device: &str) -> bool {
        self.devices.contains(device)
    }
}

/// Which devices a draft is addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TargetMode {
    #[default]
    All,
    Group(String),
    Devices(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Target {
    pub mode: TargetMode,
    pub camera: Option<String>,
    pub click_action: Option<String>,
}

/// A notification being composed. Never persisted and never carries an id.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Draft {
    pub title: String,
    pub message: String,
    pub kind: NotificationType,
    pub priority: Priority,
    pub buttons: Vec<ButtonAction>,
    pub target: Target,
}
