//! Transient success/error banner.
//!
//! A banner clears itself after [`NOTIFICATION_TTL`]. Posting a new banner
//! replaces the current one, and the older banner's timer leaves it alone.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use tokio::sync::watch;

pub const NOTIFICATION_TTL: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum NotificationKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    pub posted_at: String,
}

#[derive(Clone)]
pub struct Notifier {
    current: Arc<watch::Sender<Option<Notification>>>,
    generation: Arc<AtomicU64>,
    ttl: Duration,
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier {
    pub fn new() -> Self {
        Self::with_ttl(NOTIFICATION_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        let (current, _) = watch::channel(None);
        Self {
            current: Arc::new(current),
            generation: Arc::new(AtomicU64::new(0)),
            ttl,
        }
    }

    pub fn current(&self) -> Option<Notification> {
        self.current.borrow().clone()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.show(NotificationKind::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.show(NotificationKind::Error, message.into());
    }

    /// Replace the banner and arm its clear timer. Must run inside a tokio runtime.
    pub fn show(&self, kind: NotificationKind, message: String) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.current.send_replace(Some(Notification {
            kind,
            message,
            posted_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }));

        let current = Arc::clone(&self.current);
        let latest = Arc::clone(&self.generation);
        let ttl = self.ttl;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            current.send_if_modified(|banner| {
                if latest.load(Ordering::SeqCst) == generation && banner.is_some() {
                    *banner = None;
                    true
                } else {
                    false
                }
            });
        });
    }
}
