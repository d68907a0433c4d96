use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const STATUS_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Sent,
    TemplateSaved,
    Error(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Sent => write!(f, "✅ Notification sent!"),
            Status::TemplateSaved => write!(f, "✅ Template saved!"),
            Status::Error(message) => write!(f, "❌ Error: {message}"),
        }
    }
}

#[derive(Default)]
struct Slot {
    generation: u64,
    current: Option<Status>,
}

/// Latest user-facing status. Each message clears itself after
/// [`STATUS_TTL`] unless replaced in the meantime.
#[derive(Clone, Default)]
pub struct StatusLine {
    slot: Arc<Mutex<Slot>>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Status> {
        self.slot.lock().ok().and_then(|slot| slot.current.clone())
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.slot.lock() {
            slot.generation += 1;
            slot.current = None;
        }
    }

    /// Must be called from within a tokio runtime.
    pub fn set(&self, status: Status) {
        let generation = match self.slot.lock() {
            Ok(mut slot) => {
                slot.generation += 1;
                slot.current = Some(status);
                slot.generation
            }
            Err(_) => return,
        };
        let slot = self.slot.clone();
        tokio::spawn(async move {
            tokio::time::sleep(STATUS_TTL).await;
            if let Ok(mut slot) = slot.lock() {
                if slot.generation == generation {
                    slot.current = None;
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn status_expires_after_ttl() {
        let status = StatusLine::new();
        status.set(Status::Sent);
        assert_eq!(status.current(), Some(Status::Sent));

        tokio::time::sleep(STATUS_TTL - Duration::from_millis(1)).await;
        assert_eq!(status.current(), Some(Status::Sent));

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(status.current(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_status_outlives_older_timer() {
        let status = StatusLine::new();
        status.set(Status::Sent);
        tokio::time::sleep(Duration::from_secs(2)).await;
        status.set(Status::Error("boom".into()));

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(status.current(), Some(Status::Error("boom".into())));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(status.current(), None);
    }

    #[test]
    fn error_text_includes_cause() {
        assert_eq!(Status::Error("HTTP 500".into()).to_string(), "❌ Error: HTTP 500");
    }
}
