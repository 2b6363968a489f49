//! Heuristic order extraction from marketplace pages.
//!
//! Parsing is synchronous: `scraper::Html` is not `Send`, so every function here
//! takes raw text and returns owned results before the caller awaits anything.

pub mod dom;
pub mod fields;
pub mod lexicon;
pub mod locator;
pub mod recency;

use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

use crate::models::Order;
use crate::utils::error::{AppError, ExtractionError};

pub use fields::{extract_order, order_id};
pub use locator::locate_blocks;
pub use recency::minutes_ago;

static HEADING_ANCHORS: LazyLock<Selector> = LazyLock::new(|| dom::css("h2 a[href]"));
static ANCHORS: LazyLock<Selector> = LazyLock::new(|| dom::css("a[href]"));
static BODY: LazyLock<Selector> = LazyLock::new(|| dom::css("body"));

/// What the extractor needs to know about the site a page came from.
#[derive(Debug, Clone)]
pub struct SourceProfile {
    pub name: String,
    pub base_url: Url,
    pub listing_link: Regex,
    pub default_category: Option<String>,
    pub id_prefix: Option<String>,
}

impl SourceProfile {
    pub fn new(name: &str, base_url: &str, listing_pattern: &str) -> crate::Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            AppError::Config(config::ConfigError::Message(format!(
                "source {name}: invalid base url {base_url}: {e}"
            )))
        })?;
        let listing_link = Regex::new(listing_pattern).map_err(|e| {
            AppError::Config(config::ConfigError::Message(format!(
                "source {name}: invalid listing pattern: {e}"
            )))
        })?;

        Ok(Self {
            name: name.to_string(),
            base_url,
            listing_link,
            default_category: None,
            id_prefix: None,
        })
    }

    pub fn with_default_category(mut self, category: Option<String>) -> Self {
        self.default_category = category.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn with_id_prefix(mut self, prefix: Option<String>) -> Self {
        self.id_prefix = prefix.filter(|p| !p.is_empty());
        self
    }

    pub fn is_listing_href(&self, href: &str) -> bool {
        self.listing_link.is_match(href)
    }

    pub fn resolve(&self, href: &str) -> Option<Url> {
        self.base_url.join(href.trim()).ok()
    }
}

/// Result of running the locator and extractor over one listing page.
#[derive(Debug, Default)]
pub struct PageExtraction {
    pub candidates: usize,
    pub orders: Vec<Order>,
    pub skipped: usize,
}

/// Locates every candidate block on a listing page and extracts an order from each.
/// Blocks that fail extraction are logged and skipped.
pub fn extract_listing_page(html: &str, profile: &SourceProfile) -> PageExtraction {
    let document = Html::parse_document(html);
    let page_title = dom::page_title(&document);
    let blocks = locate_blocks(&document, profile);

    let mut extraction = PageExtraction {
        candidates: blocks.len(),
        ..Default::default()
    };

    for block in blocks {
        match extract_order(block, page_title.as_deref(), None, profile) {
            Ok(order) => {
                tracing::debug!("Extracted order {} from {}", order.id(), profile.name);
                extraction.orders.push(order);
            }
            Err(e) => {
                tracing::warn!("Skipping block on {}: {}", profile.name, e);
                extraction.skipped += 1;
            }
        }
    }

    extraction
}

/// Extracts the single order a detail page describes. The whole page body is the block.
pub fn extract_detail_page(
    html: &str,
    url: &Url,
    profile: &SourceProfile,
) -> Result<Order, ExtractionError> {
    let document = Html::parse_document(html);
    let page_title = dom::page_title(&document);
    let block = document
        .select(&BODY)
        .next()
        .unwrap_or_else(|| document.root_element());

    extract_order(block, page_title.as_deref(), Some(url), profile)
}

/// Listing links on an index page: heading anchors matching the listing pattern,
/// falling back to any matching anchor. Category links are never followed.
pub fn listing_links(html: &str, profile: &SourceProfile, limit: usize) -> Vec<Url> {
    let document = Html::parse_document(html);

    let collect = |selector: &Selector| -> Vec<Url> {
        let mut seen = HashSet::new();
        document
            .select(selector)
            .filter_map(|a| a.value().attr("href"))
            .filter(|href| profile.is_listing_href(href) && !href.contains("category"))
            .filter_map(|href| profile.resolve(href))
            .filter(|url| seen.insert(url.clone()))
            .take(limit)
            .collect()
    };

    let links = collect(&HEADING_ANCHORS);
    if links.is_empty() {
        collect(&ANCHORS)
    } else {
        links
    }
}
