use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::Order;

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
}

/// Trait for implementing delivery channels (Telegram, log output, etc.)
#[async_trait]
pub trait NotifierPlugin: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &str;
    fn plugin_type(&self) -> &str;

    /// Sends one order. Called sequentially, oldest order first.
    async fn deliver(&self, order: &Order) -> crate::Result<NotificationResult>;
}
