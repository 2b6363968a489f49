use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::extract::recency::minutes_ago;

pub const UNTITLED: &str = "untitled";
pub const AUTHOR_NOT_SPECIFIED: &str = "not specified";
pub const CATEGORY_UNSPECIFIED: &str = "unspecified";
pub const PRICE_UNSPECIFIED: &str = "unspecified";
pub const PRICE_BY_AGREEMENT: &str = "by agreement";
pub const PUBLISHED_RECENT: &str = "recent";

/// One listing extracted from a marketplace page.
///
/// Fields are private: an order never changes after extraction, and its
/// `recency_ordinal` is always the one derived from `published`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Order {
    id: String,
    title: String,
    url: String,
    source: String,
    author: String,
    category: String,
    price: String,
    published: String,
    description: String,
    #[serde(skip)]
    recency_ordinal: u64,
    retrieved_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewOrder {
    pub id: String,
    pub title: String,
    pub url: String,
    pub source: String,
    pub author: String,
    pub category: String,
    pub price: String,
    pub published: String,
    pub description: String,
}

impl Order {
    pub fn new(new_order: NewOrder) -> Self {
        let recency_ordinal = minutes_ago(&new_order.published);
        Self {
            id: new_order.id,
            title: new_order.title,
            url: new_order.url,
            source: new_order.source,
            author: new_order.author,
            category: new_order.category,
            price: new_order.price,
            published: new_order.published,
            description: new_order.description,
            recency_ordinal,
            retrieved_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Absolute listing url, empty when the page exposed none.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn price(&self) -> &str {
        &self.price
    }

    pub fn published(&self) -> &str {
        &self.published
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Minutes since publication, used only to order deliveries.
    pub fn recency_ordinal(&self) -> u64 {
        self.recency_ordinal
    }

    pub fn retrieved_at(&self) -> DateTime<Utc> {
        self.retrieved_at
    }
}
