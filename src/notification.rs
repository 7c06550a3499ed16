use serde::Serialize;
use std::fmt;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warning,
    Error,
}

/// A transient, user-facing message. Import and generation failures all end up here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn error(message: impl fmt::Display) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.to_string(),
        }
    }

    pub fn warning(message: impl fmt::Display) -> Self {
        Self {
            level: NotificationLevel::Warning,
            message: message.to_string(),
        }
    }

    pub fn info(message: impl fmt::Display) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.to_string(),
        }
    }
}

pub type NotificationSender = mpsc::UnboundedSender<Notification>;
pub type NotificationReceiver = mpsc::UnboundedReceiver<Notification>;

/// Creates the single notification channel shared by the canvas and the pipeline.
pub fn channel() -> (NotificationSender, NotificationReceiver) {
    mpsc::unbounded_channel()
}
