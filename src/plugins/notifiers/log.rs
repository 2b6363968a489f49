use crate::models::Order;
use crate::plugins::traits::{NotificationResult, NotifierPlugin};
use async_trait::async_trait;

/// Dry-run delivery: logs each order, or prints it as one JSON line.
pub struct LogNotifier {
    json: bool,
}

impl LogNotifier {
    pub fn new(json: bool) -> Self {
        Self { json }
    }
}

#[async_trait]
impl NotifierPlugin for LogNotifier {
    fn name(&self) -> &str {
        "Log Notifier"
    }

    fn plugin_type(&self) -> &str {
        "log"
    }

    async fn deliver(&self, order: &Order) -> crate::Result<NotificationResult> {
        if self.json {
            println!("{}", serde_json::to_string(order)?);
        } else {
            tracing::info!(
                "[{}] {} | {} | {} | {} | {}",
                order.source(),
                order.title(),
                order.price(),
                order.category(),
                order.published(),
                order.url()
            );
        }
        Ok(NotificationResult::delivered(Some(order.id().to_string())))
    }
}
