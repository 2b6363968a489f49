use super::*;
use order_watcher::AppError;
use order_watcher::models::{NewOrder, Order};
use order_watcher::plugins::notifiers::TelegramNotifier;
use order_watcher::plugins::traits::NotifierPlugin;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_order() -> Order {
    Order::new(NewOrder {
        id: "4521".to_string(),
        title: "Бот <для> записи & оплаты".to_string(),
        url: "https://freelancespace.ru/order?id=4521".to_string(),
        source: "freelancespace.ru".to_string(),
        author: "Мария".to_string(),
        category: "Разработка".to_string(),
        price: "8 000 ₽".to_string(),
        published: "3 часа назад".to_string(),
        description: "Нужен бот".to_string(),
    })
}

fn create_test_notifier(server: &MockServer) -> TelegramNotifier {
    let config = TelegramConfig::new(TEST_BOT_TOKEN, TEST_CHAT_ID).with_api_base_url(server.uri());
    TelegramNotifier::new(config).unwrap()
}

#[tokio::test]
async fn test_deliver_posts_send_message() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(send_message_path()))
        .and(body_partial_json(json!({
            "chat_id": TEST_CHAT_ID,
            "parse_mode": "HTML",
            "reply_markup": {
                "inline_keyboard": [[{ "url": "https://freelancespace.ru/order?id=4521" }]]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": { "message_id": 42 }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = create_test_notifier(&server).deliver(&create_test_order()).await?;
    assert!(result.success);
    assert_eq!(result.message_id.as_deref(), Some("42"));

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body)?;
    let text = body["text"].as_str().unwrap();
    assert!(text.contains("Бот &lt;для&gt; записи &amp; оплаты"));
    assert!(text.contains("8 000 ₽"));

    Ok(())
}

#[tokio::test]
async fn test_deliver_reports_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(send_message_path()))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "ok": false,
            "error_code": 400,
            "description": "Bad Request: chat not found"
        })))
        .mount(&server)
        .await;

    let result = create_test_notifier(&server).deliver(&create_test_order()).await;
    match result {
        Err(AppError::Notification { notifier, message }) => {
            assert_eq!(notifier, "telegram");
            assert!(message.contains("chat not found"));
        }
        other => panic!("expected notification error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_deliver_rejects_not_ok_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(send_message_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": false })))
        .mount(&server)
        .await;

    let result = create_test_notifier(&server).deliver(&create_test_order()).await;
    assert!(matches!(result, Err(AppError::Notification { .. })));
}
