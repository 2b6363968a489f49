use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use super::notifiers::{LogNotifier, TelegramNotifier};
use super::sources::{IndexDetailSource, PaginatedApiSource};
use super::traits::{NotifierPlugin, SourceAdapter};
use crate::config::{AppConfig, SourceConfig, SourceKind};
use crate::extract::SourceProfile;
use crate::fetcher::HttpFetcher;
use crate::watcher::OrderWatcher;

pub type SourceAdapterBox = Box<dyn SourceAdapter>;

/// How delivered orders leave the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Telegram,
    /// Log each order instead of sending it; `json` prints JSON lines.
    DryRun { json: bool },
}

pub fn build_profile(source: &SourceConfig) -> crate::Result<SourceProfile> {
    Ok(
        SourceProfile::new(&source.name, &source.base_url, &source.listing_pattern)?
            .with_default_category(source.default_category.clone())
            .with_id_prefix(source.id_prefix.clone()),
    )
}

/// One adapter per enabled source, each with its own `HttpFetcher`.
pub fn build_sources(config: &AppConfig) -> crate::Result<Vec<SourceAdapterBox>> {
    let scraper = &config.scraper;
    let timeout = Duration::from_secs(scraper.request_timeout_secs);
    let page_delay = Duration::from_millis(scraper.page_delay_ms);

    let mut sources: Vec<SourceAdapterBox> = Vec::new();
    for source in config.enabled_sources() {
        let mut cookies: HashMap<String, String> = scraper.cookies.clone().into_iter().collect();
        cookies.extend(source.cookies.clone());
        let headers: HashMap<String, String> = source.headers.clone().into_iter().collect();

        let fetcher = Arc::new(HttpFetcher::new(&scraper.user_agent, &cookies, timeout)?);
        let profile = build_profile(source)?;

        let adapter: SourceAdapterBox = match source.kind {
            SourceKind::PaginatedApi => Box::new(
                PaginatedApiSource::new(profile, fetcher, source.url.clone())
                    .with_search(source.search.clone())
                    .with_headers(headers)
                    .with_max_pages(scraper.max_pages)
                    .with_page_delay(page_delay),
            ),
            SourceKind::IndexDetail => Box::new(
                IndexDetailSource::new(profile, fetcher, source.url.clone())
                    .with_headers(headers)
                    .with_max_items(scraper.max_detail_items)
                    .with_page_delay(page_delay),
            ),
        };

        tracing::info!("Registered source {} ({:?})", source.name, source.kind);
        sources.push(adapter);
    }

    Ok(sources)
}

pub fn build_notifier(config: &AppConfig, delivery: Delivery) -> crate::Result<Arc<dyn NotifierPlugin>> {
    let notifier: Arc<dyn NotifierPlugin> = match delivery {
        Delivery::Telegram => {
            config.validate_delivery()?;
            Arc::new(TelegramNotifier::new(config.telegram.clone())?)
        }
        Delivery::DryRun { json } => Arc::new(LogNotifier::new(json)),
    };

    tracing::info!("Delivering through {}", notifier.name());
    Ok(notifier)
}

pub fn build_watcher(config: &AppConfig, delivery: Delivery) -> crate::Result<OrderWatcher> {
    let sources = build_sources(config)?;
    let notifier = build_notifier(config, delivery)?;
    Ok(OrderWatcher::new(sources, notifier))
}
