use log::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// Surface for user-facing messages. Every public synchronizer operation ends
/// in either a state update or a notice, never an unhandled error.
pub trait NoticeSink: Send + Sync {
    fn notify(&self, level: NoticeLevel, message: &str);
}

/// Default sink that routes notices through the logger.
pub struct LogNotices;

impl NoticeSink for LogNotices {
    fn notify(&self, level: NoticeLevel, message: &str) {
        match level {
            NoticeLevel::Error => error!("{}", message),
            NoticeLevel::Info | NoticeLevel::Success => info!("{}", message),
        }
    }
}
