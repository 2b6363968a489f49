use super::*;
use order_watcher::plugins::build_sources;
use order_watcher::plugins::traits::{CycleOutcome, CycleState};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_paginated_source_walks_pages_until_empty() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/ajax/filter_orders.php"))
        .and(header("X-Requested-With", "XMLHttpRequest"))
        .and(header("cookie", "session=test"))
        .and(body_string_contains("page=1"))
        .respond_with(html(listing_page(&[
            order_card(11, "Верстка лендинга", "10 минут назад"),
            order_card(12, "Настройка CRM", "2 часа назад"),
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ajax/filter_orders.php"))
        .and(body_string_contains("page=2"))
        .respond_with(html(listing_page(&[order_card(13, "Логотип", "1 день назад")])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/ajax/filter_orders.php"))
        .and(body_string_contains("page=3"))
        .respond_with(html(listing_page(&[])))
        .expect(1)
        .mount(&server)
        .await;

    let config = get_test_config(&server.uri(), vec![paginated_source(&server.uri())]);
    let mut sources = build_sources(&config)?;
    let source = &mut sources[0];

    let report = source.fetch_new_orders().await;
    assert_eq!(report.outcome, CycleOutcome::Success);
    assert_eq!(report.pages_fetched, 3);
    assert_eq!(report.candidates, 3);

    let ids: Vec<&str> = report.new_orders.iter().map(|o| o.id()).collect();
    assert_eq!(ids, vec!["11", "12", "13"]);
    assert_eq!(report.new_orders[0].url(), format!("{}/order?id=11", server.uri()));
    assert_eq!(report.new_orders[0].price(), "12 000 ₽");
    assert_eq!(report.new_orders[1].recency_ordinal(), 120);
    assert_eq!(report.new_orders[2].recency_ordinal(), 24 * 60);
    assert_eq!(source.state(), &CycleState::Done(CycleOutcome::Success));
    assert_eq!(source.seen().len(), 3);

    Ok(())
}

#[tokio::test]
async fn test_paginated_source_keeps_orders_before_failure() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("page=1"))
        .respond_with(html(listing_page(&[order_card(21, "Парсер", "5 минут назад")])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(body_string_contains("page=2"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let config = get_test_config(&server.uri(), vec![paginated_source(&server.uri())]);
    let mut sources = build_sources(&config)?;

    let report = sources[0].fetch_new_orders().await;
    assert!(matches!(report.outcome, CycleOutcome::Partial { .. }));
    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.new_orders.len(), 1);
    assert_eq!(report.new_orders[0].id(), "21");

    Ok(())
}

#[tokio::test]
async fn test_index_detail_source_follows_links() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    let index = r#"<html><body>
        <h2><a href="/projects/category/programmirovanie/">Программирование</a></h2>
        <div><h2><a href="/projects/7001/bot.html">Телеграм-бот</a></h2></div>
        <div><h2><a href="/projects/7002/shop.html">Интернет-магазин</a></h2></div>
    </body></html>"#;

    Mock::given(method("GET"))
        .and(path("/projects/category/programmirovanie/"))
        .respond_with(html(index.to_string()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/7001/bot.html"))
        .respond_with(html(detail_page("Телеграм-бот для салона", "20 000 ₽", "3 часа назад")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/7002/shop.html"))
        .respond_with(html(detail_page("Интернет-магазин на Tilda", "50 000 ₽", "40 минут назад")))
        .expect(1)
        .mount(&server)
        .await;

    let config = get_test_config(&server.uri(), vec![index_detail_source(&server.uri())]);
    let mut sources = build_sources(&config)?;

    let report = sources[0].fetch_new_orders().await;
    assert_eq!(report.outcome, CycleOutcome::Success);
    assert_eq!(report.pages_fetched, 3);

    let ids: Vec<&str> = report.new_orders.iter().map(|o| o.id()).collect();
    assert_eq!(ids, vec!["fl_7001", "fl_7002"]);

    let bot = &report.new_orders[0];
    assert_eq!(bot.title(), "Телеграм-бот для салона");
    assert_eq!(bot.url(), format!("{}/projects/7001/bot.html", server.uri()));
    assert_eq!(bot.price(), "20 000 ₽");
    assert_eq!(bot.source(), "fl.ru");
    assert_eq!(bot.recency_ordinal(), 180);
    assert_eq!(report.new_orders[1].recency_ordinal(), 40);

    // Same pages again: nothing new for this source.
    let second = sources[0].fetch_new_orders().await;
    assert!(second.new_orders.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_index_failure_ends_cycle() -> anyhow::Result<()> {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let config = get_test_config(&server.uri(), vec![index_detail_source(&server.uri())]);
    let mut sources = build_sources(&config)?;

    let report = sources[0].fetch_new_orders().await;
    assert!(matches!(report.outcome, CycleOutcome::Partial { .. }));
    assert_eq!(report.pages_fetched, 0);
    assert!(report.new_orders.is_empty());

    Ok(())
}
