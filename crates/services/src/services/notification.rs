use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use ts_rs::TS;

pub const CHANGES_SAVED_MESSAGE: &str = "Changes Saved";
pub const GENERAL_ERROR_MESSAGE: &str = "Something went wrong, please try again.";
pub const USER_NOT_FOUND_MESSAGE: &str = "User Not Found!";

const DEFAULT_CAPACITY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Success,
    Error,
}

/// A transient alert shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct Notification {
    pub message: String,
    pub severity: Severity,
    pub created_at: DateTime<Utc>,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str, severity: Severity);
}

/// Alert sink for one profile page. Keeps the most recent notifications
/// until the page's user drains them.
pub struct NotificationCenter {
    capacity: usize,
    pending: Mutex<VecDeque<Notification>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            pending: Mutex::new(VecDeque::new()),
        }
    }

    pub async fn drain(&self) -> Vec<Notification> {
        self.pending.lock().await.drain(..).collect()
    }

    pub async fn pending(&self) -> Vec<Notification> {
        self.pending.lock().await.iter().cloned().collect()
    }
}

impl Default for NotificationCenter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for NotificationCenter {
    async fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Success => tracing::info!(message, "notification"),
            Severity::Error => tracing::warn!(message, "notification"),
        }

        let mut pending = self.pending.lock().await;
        if pending.len() == self.capacity {
            pending.pop_front();
        }
        pending.push_back(Notification {
            message: message.to_owned(),
            severity,
            created_at: Utc::now(),
        });
    }
}
