//! Turns a draft into the one hub service call that delivers it.

use serde_json::{json, Map, Value};

use crate::api::models::{Draft, Group, NotificationType, Priority, TargetMode};

pub const DOMAIN: &str = "notify_manager";
pub const DEFAULT_TITLE: &str = "Home Assistant";

#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub service: &'static str,
    pub payload: Value,
}

/// Devices the draft resolves to at send time. A selected group is read from
/// `groups` now, so edits made after it was picked are honoured. `None`
/// means every device.
pub fn resolve_targets(draft: &Draft, groups: &[Group]) -> Option<Vec<String>> {
    let devices: Vec<String> = match &draft.target.mode {
        TargetMode::All => return None,
        TargetMode::Group(id) => groups
            .iter()
            .find(|g| &g.id == id)
            .map(|g| g.devices.iter().cloned().collect())
            .unwrap_or_default(),
        TargetMode::Devices(devices) => devices.clone(),
    };
    (!devices.is_empty()).then_some(devices)
}

fn media_stream(priority: Priority) -> &'static str {
    if priority == Priority::Critical {
        "alarm_stream_max"
    } else {
        "music_stream"
    }
}

/// Pure routing, first match wins. Performs no I/O.
pub fn route(draft: &Draft, groups: &[Group]) -> Dispatch {
    let targets = resolve_targets(draft, groups);

    if draft.kind == NotificationType::Tts {
        let mut payload = Map::new();
        payload.insert("tts_text".into(), json!(draft.message));
        payload.insert("media_stream".into(), json!(media_stream(draft.priority)));
        if let Some(targets) = targets {
            payload.insert("target".into(), json!(targets));
        }
        return Dispatch { service: "send_tts", payload: Value::Object(payload) };
    }

    let title = if draft.title.is_empty() { DEFAULT_TITLE } else { draft.title.as_str() };
    let mut payload = Map::new();
    payload.insert("title".into(), json!(title));
    payload.insert("message".into(), json!(draft.message));
    payload.insert("priority".into(), json!(draft.priority.as_str()));
    if let Some(click_action) = &draft.target.click_action {
        payload.insert("clickAction".into(), json!(click_action));
    }
    if let Some(targets) = targets {
        payload.insert("target".into(), json!(targets));
    }

    let service = match draft.kind {
        NotificationType::Buttons if !draft.buttons.is_empty() => {
            let actions: Vec<_> = draft.buttons.iter().filter(|b| b.is_complete()).collect();
            payload.insert("actions".into(), json!(actions));
            "send_actionable"
        }
        NotificationType::Image if draft.target.camera.is_some() => {
            payload.insert("camera_entity".into(), json!(draft.target.camera));
            "send_with_image"
        }
        _ => "send_notification",
    };
    Dispatch { service, payload: Value::Object(payload) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{ButtonAction, Target};
    use crate::manager::composer;

    fn draft(kind: NotificationType, message: &str) -> Draft {
        Draft { kind, message: message.into(), ..Draft::default() }
    }

    fn group(id: &str, devices: &[&str]) -> Group {
        let mut g = Group::new("g");
        g.id = id.into();
        for d in devices {
            g.devices.insert(d.to_string());
        }
        g
    }

    #[test]
    fn buttons_route_to_actionable() {
        let d = Draft {
            buttons: vec![ButtonAction::new("A", "B")],
            ..draft(NotificationType::Buttons, "m")
        };
        let dispatch = route(&d, &[]);
        assert_eq!(dispatch.service, "send_actionable");
        assert_eq!(
            dispatch.payload,
            json!({
                "title": "Home Assistant",
                "message": "m",
                "priority": "normal",
                "actions": [{"action": "A", "title": "B"}],
            })
        );
    }

    #[test]
    fn incomplete_buttons_are_filtered() {
        let d = Draft {
            buttons: vec![
                ButtonAction::new("", "no action"),
                ButtonAction::new("KEEP", "Keep"),
                ButtonAction::new("NO_TITLE", ""),
            ],
            ..draft(NotificationType::Buttons, "m")
        };
        let dispatch = route(&d, &[]);
        assert_eq!(dispatch.payload["actions"], json!([{"action": "KEEP", "title": "Keep"}]));
    }

    #[test]
    fn buttons_type_without_buttons_falls_back() {
        let dispatch = route(&draft(NotificationType::Buttons, "m"), &[]);
        assert_eq!(dispatch.service, "send_notification");
        assert!(dispatch.payload.get("actions").is_none());
    }

    #[test]
    fn tts_replaces_base_fields() {
        let d = Draft {
            title: "ignored".into(),
            priority: Priority::Critical,
            ..draft(NotificationType::Tts, "hello")
        };
        let dispatch = route(&d, &[]);
        assert_eq!(dispatch.service, "send_tts");
        assert_eq!(
            dispatch.payload,
            json!({"tts_text": "hello", "media_stream": "alarm_stream_max"})
        );
    }

    #[test]
    fn tts_keeps_target() {
        let d = composer::toggle_device_target(draft(NotificationType::Tts, "hi"), "pixel");
        let dispatch = route(&d, &[]);
        assert_eq!(
            dispatch.payload,
            json!({"tts_text": "hi", "media_stream": "music_stream", "target": ["pixel"]})
        );
    }

    #[test]
    fn image_needs_a_camera() {
        let without = route(&draft(NotificationType::Image, "m"), &[]);
        assert_eq!(without.service, "send_notification");

        let d = composer::set_camera(draft(NotificationType::Image, "m"), "camera.door");
        let with = route(&d, &[]);
        assert_eq!(with.service, "send_with_image");
        assert_eq!(with.payload["camera_entity"], "camera.door");
    }

    #[test]
    fn simple_includes_optional_fields() {
        let d = Draft {
            title: "Hi".into(),
            priority: Priority::High,
            target: Target {
                mode: TargetMode::Devices(vec!["pixel".into(), "iphone".into()]),
                camera: Some("camera.unused".into()),
                click_action: Some("/lovelace/cams".into()),
            },
            ..draft(NotificationType::Simple, "m")
        };
        let dispatch = route(&d, &[]);
        assert_eq!(dispatch.service, "send_notification");
        assert_eq!(
            dispatch.payload,
            json!({
                "title": "Hi",
                "message": "m",
                "priority": "high",
                "clickAction": "/lovelace/cams",
                "target": ["pixel", "iphone"],
            })
        );
    }

    #[test]
    fn group_is_expanded_from_current_state() {
        let d = composer::select_group(draft(NotificationType::Simple, "m"), "grp_1");
        let before = [group("grp_1", &["pixel"])];
        let after = [group("grp_1", &["pixel", "ipad"])];

        assert_eq!(resolve_targets(&d, &before), Some(vec!["pixel".to_string()]));
        assert_eq!(route(&d, &after).payload["target"], json!(["pixel", "ipad"]));
    }

    #[test]
    fn missing_group_targets_everyone() {
        let d = composer::select_group(draft(NotificationType::Simple, "m"), "grp_gone");
        assert_eq!(resolve_targets(&d, &[]), None);
        assert!(route(&d, &[]).payload.get("target").is_none());
    }
}
