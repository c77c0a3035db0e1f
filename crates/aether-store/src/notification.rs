//! 通知旁路
//!
//! 归约器产生的提示消息，只用于展示，从不影响状态。

use serde::{Deserialize, Serialize};
use std::sync::Mutex;

/// 通知类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

/// 通知
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub detail: Option<String>,
}

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, title)
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, title)
    }
}

/// 通知接收端
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// 把通知写入日志
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn notify(&self, notification: &Notification) {
        let detail = notification.detail.as_deref().unwrap_or("");
        match notification.kind {
            NotificationKind::Info | NotificationKind::Success => {
                tracing::info!(kind = ?notification.kind, "{} {}", notification.title, detail)
            }
            NotificationKind::Warning => tracing::warn!("{} {}", notification.title, detail),
            NotificationKind::Error => tracing::error!("{} {}", notification.title, detail),
        }
    }
}

/// 在内存中收集通知
#[derive(Debug, Default)]
pub struct MemorySink {
    received: Mutex<Vec<Notification>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// 取出已收集的通知
    pub fn drain(&self) -> Vec<Notification> {
        match self.received.lock() {
            Ok(mut received) => std::mem::take(&mut *received),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl NotificationSink for MemorySink {
    fn notify(&self, notification: &Notification) {
        match self.received.lock() {
            Ok(mut received) => received.push(notification.clone()),
            Err(poisoned) => poisoned.into_inner().push(notification.clone()),
        }
    }
}
