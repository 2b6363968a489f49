use super::*;
use order_watcher::plugins::{Delivery, build_watcher};
use order_watcher::scheduler::CycleScheduler;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

async fn mount_telegram(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(send_message_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "result": { "message_id": 1 }
        })))
        .mount(server)
        .await;
}

async fn mount_listing(server: &MockServer, first_page: String) {
    Mock::given(method("POST"))
        .and(path("/ajax/filter_orders.php"))
        .and(body_string_contains("page=1"))
        .respond_with(html(first_page))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ajax/filter_orders.php"))
        .respond_with(html(listing_page(&[])))
        .mount(server)
        .await;
}

/// Titles of every message the Telegram mock received, in arrival order.
async fn delivered_texts(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path() == send_message_path())
        .map(|request| {
            let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
            body["text"].as_str().unwrap().to_string()
        })
        .collect()
}

#[tokio::test]
async fn test_cycle_skips_malformed_block_and_delivers_oldest_first() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_telegram(&server).await;
    mount_listing(
        &server,
        listing_page(&[
            order_card(1, "Свежий заказ", "5 минут назад"),
            MALFORMED_CARD.to_string(),
            order_card(2, "Старый заказ", "2 часа назад"),
        ]),
    )
    .await;

    let config = get_test_config(&server.uri(), vec![paginated_source(&server.uri())]);
    let mut watcher = build_watcher(&config, Delivery::Telegram)?;

    let summary = watcher.run_cycle().await;
    assert_eq!(summary.sources[0].candidates, 3);
    assert_eq!(summary.sources[0].skipped, 1);
    assert_eq!(summary.merged, 2);
    assert_eq!(summary.delivered, 2);
    assert_eq!(summary.failed_deliveries, 0);

    let texts = delivered_texts(&server).await;
    assert_eq!(texts.len(), 2);
    assert!(texts[0].contains("Старый заказ"));
    assert!(texts[1].contains("Свежий заказ"));

    // Nothing new on the next cycle.
    let second = watcher.run_cycle().await;
    assert_eq!(second.delivered, 0);
    assert_eq!(delivered_texts(&server).await.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_cycle_merges_two_sources() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_telegram(&server).await;
    mount_listing(
        &server,
        listing_page(&[order_card(1, "Заказ с биржи", "30 минут назад")]),
    )
    .await;

    let index = r#"<html><body>
        <div><h2><a href="/projects/7001/bot.html">Бот</a></h2></div>
    </body></html>"#;
    Mock::given(method("GET"))
        .and(path("/projects/category/programmirovanie/"))
        .respond_with(html(index.to_string()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/7001/bot.html"))
        .respond_with(html(detail_page("Бот для салона", "20 000 ₽", "1 час назад")))
        .mount(&server)
        .await;

    let config = get_test_config(
        &server.uri(),
        vec![paginated_source(&server.uri()), index_detail_source(&server.uri())],
    );
    let mut watcher = build_watcher(&config, Delivery::Telegram)?;

    let summary = watcher.run_cycle().await;
    assert_eq!(summary.sources.len(), 2);
    assert_eq!(summary.delivered, 2);

    let texts = delivered_texts(&server).await;
    assert!(texts[0].contains("Бот для салона"));
    assert!(texts[1].contains("Заказ с биржи"));

    assert_eq!(watcher.delivered_by_source()["fl.ru"], 1);
    assert_eq!(watcher.delivered_by_source()["freelancespace.ru"], 1);

    Ok(())
}

#[tokio::test]
async fn test_failed_delivery_does_not_abort_cycle() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(send_message_path()))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_listing(
        &server,
        listing_page(&[
            order_card(1, "Первый", "5 минут назад"),
            order_card(2, "Второй", "10 минут назад"),
        ]),
    )
    .await;

    let config = get_test_config(&server.uri(), vec![paginated_source(&server.uri())]);
    let mut watcher = build_watcher(&config, Delivery::Telegram)?;

    let summary = watcher.run_cycle().await;
    assert_eq!(summary.merged, 2);
    assert_eq!(summary.delivered, 0);
    assert_eq!(summary.failed_deliveries, 2);

    Ok(())
}

#[tokio::test]
async fn test_scheduler_trigger_runs_full_cycle() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    mount_telegram(&server).await;
    mount_listing(&server, listing_page(&[order_card(5, "Заказ", "1 минуту назад")])).await;

    let config = get_test_config(&server.uri(), vec![paginated_source(&server.uri())]);
    let watcher = build_watcher(&config, Delivery::DryRun { json: false })?;
    let mut scheduler = CycleScheduler::new(watcher, &config.scheduler).await?;
    scheduler.start().await?;

    let summary = scheduler.trigger_now().await?;
    assert_eq!(summary.delivered, 1);

    let status = scheduler.status().await;
    assert_eq!(status.stats.completed_cycles, 1);
    assert_eq!(status.stats.orders_delivered, 1);
    // Dry run: nothing reaches the Telegram mock.
    assert!(delivered_texts(&server).await.is_empty());

    scheduler.shutdown().await?;
    Ok(())
}
