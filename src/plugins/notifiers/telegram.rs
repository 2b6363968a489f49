use crate::config::TelegramConfig;
use crate::models::Order;
use crate::plugins::traits::{NotificationResult, NotifierPlugin};
use crate::utils::error::AppError;
use async_trait::async_trait;
use html_escape::encode_text;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

/// Posts each order to a chat through the Bot API `sendMessage` method.
pub struct TelegramNotifier {
    client: Client,
    config: TelegramConfig,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> crate::Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { client, config })
    }

    fn source_emoji(order: &Order) -> &'static str {
        if order.source().to_lowercase().contains("freelancespace") {
            "🔹"
        } else {
            "🔸"
        }
    }

    fn format_message(&self, order: &Order) -> String {
        format!(
            "🆕 <b>New order on {source}</b> {emoji}\n\n\
             📋 <b>{title}</b>\n\n\
             💰 <b>Price:</b> {price}\n\
             📂 <b>Category:</b> {category}\n\
             👤 <b>Author:</b> {author}\n\
             🕐 <b>Published:</b> {published}\n\n\
             📝 <b>Description:</b>\n{description}",
            source = encode_text(order.source()),
            emoji = Self::source_emoji(order),
            title = encode_text(order.title()),
            price = encode_text(order.price()),
            category = encode_text(order.category()),
            author = encode_text(order.author()),
            published = encode_text(order.published()),
            description = encode_text(order.description()),
        )
    }

    fn create_payload(&self, order: &Order) -> serde_json::Value {
        let mut payload = json!({
            "chat_id": self.config.chat_id,
            "text": self.format_message(order),
            "parse_mode": "HTML",
            "disable_web_page_preview": true
        });

        if !order.url().is_empty() {
            payload["reply_markup"] = json!({
                "inline_keyboard": [[
                    { "text": "🔗 Open order", "url": order.url() }
                ]]
            });
        }

        payload
    }

    fn failure(&self, message: impl Into<String>) -> AppError {
        AppError::Notification {
            notifier: self.plugin_type().to_string(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl NotifierPlugin for TelegramNotifier {
    fn name(&self) -> &str {
        "Telegram Notifier"
    }

    fn plugin_type(&self) -> &str {
        "telegram"
    }

    async fn deliver(&self, order: &Order) -> crate::Result<NotificationResult> {
        let payload = self.create_payload(order);

        let response = self
            .client
            .post(self.config.send_message_url())
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body: serde_json::Value = response.json().await.unwrap_or_default();

        if !status.is_success() || body["ok"] != json!(true) {
            let description = body["description"]
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| format!("status {}", status.as_u16()));
            return Err(self.failure(description));
        }

        let message_id = body["result"]["message_id"].as_i64().map(|id| id.to_string());
        Ok(NotificationResult::delivered(message_id))
    }
}
