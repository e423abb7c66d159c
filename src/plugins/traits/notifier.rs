use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::utils::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

impl NotificationResult {
    pub fn delivered(message_id: Option<String>) -> Self {
        Self {
            success: true,
            message_id,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message_id: None,
            error: Some(error.into()),
        }
    }
}

/// Trait for implementing notification methods (Telegram, etc.)
///
/// Rejections by the remote side come back as an unsuccessful
/// `NotificationResult`; transport failures as `Err`. Neither is retried.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &'static str;

    /// Send `text` to `destination` (a chat id for Telegram).
    async fn send(&self, destination: &str, text: &str) -> Result<NotificationResult, AppError>;
}
