//! User-visible notifications (toasts).
//!
//! The core never draws anything. It hands a `Notice` to whatever `Notifier`
//! the shell supplies; the default just logs it.

use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }

    /// Shown on every forced logout
    pub fn session_expired() -> Self {
        Self::new(NoticeLevel::Error, "Session expired", "Please log in again.")
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: &Notice);
}

/// Notifier that writes notices to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: &Notice) {
        match notice.level {
            NoticeLevel::Error => error!(title = %notice.title, "{}", notice.message),
            NoticeLevel::Success | NoticeLevel::Info => {
                info!(title = %notice.title, "{}", notice.message)
            }
        }
    }
}
