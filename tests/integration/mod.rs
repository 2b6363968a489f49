// Integration tests for Order Watcher
// These tests run adapters, the Telegram notifier and whole cycles against local HTTP servers

pub mod adapter_tests;
pub mod config_tests;
pub mod cycle_tests;
pub mod telegram_tests;

use std::collections::BTreeMap;
use order_watcher::{
    AppConfig,
    config::{LoggingConfig, SchedulerConfig, ScraperConfig, SourceConfig, SourceKind, TelegramConfig},
};

pub const TEST_BOT_TOKEN: &str = "123:abc";
pub const TEST_CHAT_ID: &str = "-100200";

/// A listing card the locator accepts.
pub fn order_card(id: u32, title: &str, published: &str) -> String {
    format!(
        r#"<div class="border border-gray-300 rounded-lg p-4">
            <div class="flex items-start gap-2"><span class="hidden sm:inline">Анна</span></div>
            <h2><a href="/order?id={id}">{title}</a></h2>
            <div class="mb-4 gap-4"><p>Разработка</p><p>12 000 ₽</p></div>
            <p class="text-gray-700 break-words">Подробное описание задачи для исполнителя, сроки и требования к результату.</p>
            <div class="flex gap-1"><span class="material-symbols-outlined">schedule</span><span>{published}</span></div>
            <button>Откликнуться</button>
        </div>"#
    )
}

/// Looks like a card but has neither a heading nor a link.
pub const MALFORMED_CARD: &str = r#"
    <div class="shadow p-4">
        <p>Срочно нужен помощник на проект, оплата 3000 ₽ в день, подробности в личке</p>
        <button>Откликнуться</button>
    </div>"#;

pub fn listing_page(cards: &[String]) -> String {
    format!(
        "<html><head><title>Заказы | FreelanceSpace</title></head><body><main>{}</main></body></html>",
        cards.concat()
    )
}

pub fn detail_page(title: &str, budget: &str, published: &str) -> String {
    format!(
        r#"<html><head><title>{title} - FL.ru</title></head><body>
            <h1>{title}</h1>
            <div class="b-layout">Бюджет: {budget}</div>
            <div>Нужен исполнитель на проект, подробности задачи и требования в описании ниже.</div>
            <div class="text-gray-opacity-4">Опубликован: {published}</div>
        </body></html>"#
    )
}

pub fn paginated_source(server_uri: &str) -> SourceConfig {
    SourceConfig {
        name: "freelancespace.ru".to_string(),
        kind: SourceKind::PaginatedApi,
        enabled: true,
        url: format!("{server_uri}/ajax/filter_orders.php"),
        base_url: format!("{server_uri}/"),
        listing_pattern: r"order\?id=\d+".to_string(),
        search: String::new(),
        headers: BTreeMap::from([("X-Requested-With".to_string(), "XMLHttpRequest".to_string())]),
        cookies: BTreeMap::new(),
        default_category: None,
        id_prefix: None,
    }
}

pub fn index_detail_source(server_uri: &str) -> SourceConfig {
    SourceConfig {
        name: "fl.ru".to_string(),
        kind: SourceKind::IndexDetail,
        enabled: true,
        url: format!("{server_uri}/projects/category/programmirovanie/"),
        base_url: format!("{server_uri}/"),
        listing_pattern: r"/projects/\d+/".to_string(),
        search: String::new(),
        headers: BTreeMap::new(),
        cookies: BTreeMap::new(),
        default_category: Some("Программирование".to_string()),
        id_prefix: Some("fl_".to_string()),
    }
}

/// Test configuration pointing every endpoint at `server_uri`.
pub fn get_test_config(server_uri: &str, sources: Vec<SourceConfig>) -> AppConfig {
    AppConfig {
        telegram: TelegramConfig::new(TEST_BOT_TOKEN, TEST_CHAT_ID).with_api_base_url(server_uri),
        scheduler: SchedulerConfig {
            interval_secs: 60,
            enabled: true,
        },
        scraper: ScraperConfig {
            user_agent: "OrderWatcher-Test/1.0".to_string(),
            cookies: BTreeMap::from([("session".to_string(), "test".to_string())]),
            request_timeout_secs: 5,
            max_pages: 5,
            max_detail_items: 5,
            page_delay_ms: 0,
        },
        sources,
        logging: LoggingConfig::default(),
    }
}

pub fn send_message_path() -> String {
    format!("/bot{TEST_BOT_TOKEN}/sendMessage")
}
