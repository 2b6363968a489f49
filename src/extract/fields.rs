//! Per-field fallback chains.
//!
//! Every chain is a slice of plain functions over a shared [`FieldContext`]; the
//! first function returning `Some` wins, and the chain's sentinel is used when all
//! of them give up. Later chains may read what earlier ones produced.

use regex::Regex;
use scraper::{ElementRef, Selector};
use sha2::{Digest, Sha256};
use std::sync::LazyLock;
use url::Url;

use super::SourceProfile;
use super::dom::{
    block_text, clean_text, css, has_class, next_sibling_text, normalize_whitespace, own_text,
    parent_element, text_leaves, truncate_chars,
};
use super::lexicon::{
    BOILERPLATE, CATEGORY_VOCABULARY, CURRENCY_TOKENS, NEGOTIABLE_TOKENS, PUBLISHED_EXCLUDED,
    SCHEDULE_ICON, STATUS_MARKERS, STATUS_TIME_WORDS, contains_any, contains_word_start,
};
use super::recency::looks_like_recency;
use crate::models::{
    AUTHOR_NOT_SPECIFIED, CATEGORY_UNSPECIFIED, NewOrder, Order, PRICE_BY_AGREEMENT,
    PRICE_UNSPECIFIED, PUBLISHED_RECENT, UNTITLED,
};
use crate::utils::error::ExtractionError;

const TITLE_MAX_CHARS: usize = 200;
const PRICE_MAX_CHARS: usize = 100;
const DESCRIPTION_MAX_CHARS: usize = 200;
const NAME_MAX_CHARS: usize = 50;
const SHORT_LEAF_MAX_CHARS: usize = 50;
const LONG_PARAGRAPH_MIN_CHARS: usize = 50;
const HASH_ID_MODULUS: u64 = 1_000_000_000;

const LISTING_HEADINGS: &[&str] = &["h2 a", "h1", "h2", "h3"];
/// A detail page's own heading comes before links to related listings.
const DETAIL_HEADINGS: &[&str] = &["h1", "h2 a", "h2", "h3"];

static HEADING_SELECTORS: LazyLock<Vec<(&'static str, Selector)>> = LazyLock::new(|| {
    DETAIL_HEADINGS.iter().map(|s| (*s, css(s))).collect()
});
static HEADING_LINKS: LazyLock<Selector> =
    LazyLock::new(|| css("h1 a[href], h2 a[href], h3 a[href]"));
static LINKS: LazyLock<Selector> = LazyLock::new(|| css("a[href]"));
static META_ROW: LazyLock<Selector> = LazyLock::new(|| css("div.mb-4.gap-4"));
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| css("p"));
static PARTICIPANT: LazyLock<Selector> = LazyLock::new(|| css("div.items-start"));
static HIDDEN_SPANS: LazyLock<Selector> = LazyLock::new(|| css("span.hidden"));
static SEMIBOLD_SPANS: LazyLock<Selector> = LazyLock::new(|| css("span.font-semibold"));
static ICONS: LazyLock<Selector> = LazyLock::new(|| {
    css("span.material-symbols-outlined, span.material-icons, i.material-icons")
});
static BODY_PARAGRAPHS: LazyLock<Selector> = LazyLock::new(|| css("p.text-gray-700, p.break-words"));
static TEXT_CONTAINERS: LazyLock<Selector> = LazyLock::new(|| css("p, div"));

static ID_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [r"order\?id=(\d+)", r"/projects/(\d+)", r"/(\d+)/?(?:[?#].*)?$"]
        .into_iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
});
static NEGOTIABLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)по\s+договор[её]нност|договорн|negotiable|by agreement").unwrap()
});
static BUDGET_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(?:бюджет|budget)\s*:\s*([^\n\r]+)").unwrap());
static CURRENCY_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:(?:от|до|from|up to)\s+)?(?:[$€]\s?\d[\d \u{a0}\u{202f}]*|\d[\d \u{a0}\u{202f}]*\s?(?:₽|руб\.?|rub|usd|eur|\$|€))",
    )
    .unwrap()
});
static AUTHOR_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:заказчик|автор|client|author)\b\s*:?\s*([^\n\r]+)").unwrap()
});
static PUBLISHED_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:опубликован[оа]?|размещен[оа]?|published|posted)\b\s*:?\s*([^\n\r]+)")
        .unwrap()
});
static RELATIVE_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\d+\s+\S+\s+(?:назад|ago)").unwrap());

/// Everything a field function may look at.
pub struct FieldContext<'a> {
    pub block: ElementRef<'a>,
    /// Block text, one text node per line.
    pub text: String,
    /// Block text collapsed to single spaces.
    pub flat: String,
    pub page_title: Option<&'a str>,
    /// Url of the page when the block is a whole detail page.
    pub page_url: Option<&'a Url>,
    pub profile: &'a SourceProfile,
    pub title: String,
    pub price: String,
    pub category: String,
}

pub type Extractor = fn(&FieldContext<'_>) -> Option<String>;

pub const TITLE_CHAIN: &[Extractor] = &[heading_title, page_title_without_suffix];
pub const URL_CHAIN: &[Extractor] = &[page_url, listing_anchor_url, heading_anchor_url];
pub const PRICE_CHAIN: &[Extractor] = &[negotiable_price, labelled_budget, currency_amount];
pub const CATEGORY_CHAIN: &[Extractor] = &[meta_row_category, vocabulary_scan, profile_category];
pub const AUTHOR_CHAIN: &[Extractor] = &[participant_author, labelled_author];
pub const PUBLISHED_CHAIN: &[Extractor] = &[
    schedule_icon_sibling,
    short_recency_leaf,
    schedule_icon_paragraph,
    status_line,
    labelled_published,
];
pub const DESCRIPTION_CHAIN: &[Extractor] = &[body_paragraph, long_paragraph];

pub fn first_success(chain: &[Extractor], ctx: &FieldContext<'_>) -> Option<String> {
    chain.iter().find_map(|extract| extract(ctx))
}

/// Builds an order out of one block. Only a block with no text, or with neither
/// a heading nor a url, is rejected.
pub fn extract_order(
    block: ElementRef<'_>,
    page_title: Option<&str>,
    page_url: Option<&Url>,
    profile: &SourceProfile,
) -> Result<Order, ExtractionError> {
    let text = block_text(block);
    let flat = normalize_whitespace(&text);
    if flat.is_empty() {
        return Err(ExtractionError::EmptyBlock);
    }

    let mut ctx = FieldContext {
        block,
        text,
        flat,
        page_title,
        page_url,
        profile,
        title: String::new(),
        price: String::new(),
        category: String::new(),
    };

    let heading = heading_title(&ctx);
    let url = first_success(URL_CHAIN, &ctx);
    if heading.is_none() && url.is_none() {
        return Err(ExtractionError::Unidentifiable);
    }
    let url = url.unwrap_or_default();

    ctx.title = heading
        .or_else(|| first_success(TITLE_CHAIN, &ctx))
        .unwrap_or_else(|| UNTITLED.to_string());
    ctx.price = first_success(PRICE_CHAIN, &ctx).unwrap_or_else(|| PRICE_UNSPECIFIED.to_string());
    ctx.category =
        first_success(CATEGORY_CHAIN, &ctx).unwrap_or_else(|| CATEGORY_UNSPECIFIED.to_string());
    let author =
        first_success(AUTHOR_CHAIN, &ctx).unwrap_or_else(|| AUTHOR_NOT_SPECIFIED.to_string());
    let published =
        first_success(PUBLISHED_CHAIN, &ctx).unwrap_or_else(|| PUBLISHED_RECENT.to_string());
    let description = first_success(DESCRIPTION_CHAIN, &ctx).unwrap_or_else(|| ctx.title.clone());

    let id = order_id(&url, &ctx.title, profile.id_prefix.as_deref());

    Ok(Order::new(NewOrder {
        id,
        title: ctx.title,
        url,
        source: profile.name.clone(),
        author,
        category: ctx.category,
        price: ctx.price,
        published,
        description: shorten_description(&description),
    }))
}

/// Numeric id from the url, or a stable hash of title and url.
pub fn order_id(url: &str, title: &str, prefix: Option<&str>) -> String {
    let numeric = ID_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(url))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string());

    let id = numeric.unwrap_or_else(|| hashed_id(title, url).to_string());
    match prefix {
        Some(prefix) => format!("{prefix}{id}"),
        None => id,
    }
}

fn hashed_id(title: &str, url: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(b"\n");
    hasher.update(url.as_bytes());
    let digest = hasher.finalize();

    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(head) % HASH_ID_MODULUS
}

fn shorten_description(text: &str) -> String {
    if text.chars().count() > DESCRIPTION_MAX_CHARS {
        format!("{}...", truncate_chars(text, DESCRIPTION_MAX_CHARS))
    } else {
        text.to_string()
    }
}

fn capture(regex: &Regex, text: &str) -> Option<String> {
    regex
        .captures(text)?
        .get(1)
        .map(|m| m.as_str().trim().to_string())
        .filter(|value| !value.is_empty())
}

fn resolve(profile: &SourceProfile, href: &str) -> Option<String> {
    profile.base_url.join(href.trim()).ok().map(String::from)
}

// Title

fn heading_title(ctx: &FieldContext<'_>) -> Option<String> {
    let order = if ctx.page_url.is_some() {
        DETAIL_HEADINGS
    } else {
        LISTING_HEADINGS
    };
    order.iter().find_map(|wanted| {
        let (_, selector) = HEADING_SELECTORS.iter().find(|(name, _)| name == wanted)?;
        ctx.block
            .select(selector)
            .map(clean_text)
            .find(|text| !text.is_empty())
            .map(|text| truncate_chars(&text, TITLE_MAX_CHARS))
    })
}

fn page_title_without_suffix(ctx: &FieldContext<'_>) -> Option<String> {
    let title = ctx.page_title?;
    let stripped = [" | ", " - "]
        .iter()
        .find_map(|sep| title.rsplit_once(sep).map(|(head, _)| head))
        .unwrap_or(title)
        .trim();
    (!stripped.is_empty()).then(|| truncate_chars(stripped, TITLE_MAX_CHARS))
}

// Url

fn page_url(ctx: &FieldContext<'_>) -> Option<String> {
    ctx.page_url.map(|url| url.to_string())
}

fn listing_anchor_url(ctx: &FieldContext<'_>) -> Option<String> {
    ctx.block
        .select(&LINKS)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| ctx.profile.is_listing_href(href))
        .and_then(|href| resolve(ctx.profile, href))
}

fn heading_anchor_url(ctx: &FieldContext<'_>) -> Option<String> {
    ctx.block
        .select(&HEADING_LINKS)
        .filter_map(|a| a.value().attr("href"))
        .find(|href| !href.trim().is_empty() && !href.starts_with('#'))
        .and_then(|href| resolve(ctx.profile, href))
}

// Price

fn negotiable_price(ctx: &FieldContext<'_>) -> Option<String> {
    NEGOTIABLE
        .is_match(&ctx.text)
        .then(|| PRICE_BY_AGREEMENT.to_string())
}

fn labelled_budget(ctx: &FieldContext<'_>) -> Option<String> {
    capture(&BUDGET_LABEL, &ctx.text).map(|value| truncate_chars(&value, PRICE_MAX_CHARS))
}

fn currency_amount(ctx: &FieldContext<'_>) -> Option<String> {
    let found = CURRENCY_AMOUNT.find(&ctx.flat)?;
    let amount = normalize_whitespace(found.as_str());
    (!amount.is_empty()).then(|| truncate_chars(&amount, PRICE_MAX_CHARS))
}

// Category

fn meta_row_category(ctx: &FieldContext<'_>) -> Option<String> {
    let row = ctx.block.select(&META_ROW).next()?;
    let candidate = clean_text(row.select(&PARAGRAPH).next()?);
    let lower = candidate.to_lowercase();
    if contains_any(&lower, CURRENCY_TOKENS) || contains_any(&lower, NEGOTIABLE_TOKENS) {
        return None;
    }
    CATEGORY_VOCABULARY
        .contains(&candidate.as_str())
        .then_some(candidate)
}

fn vocabulary_scan(ctx: &FieldContext<'_>) -> Option<String> {
    CATEGORY_VOCABULARY
        .iter()
        .find(|entry| ctx.flat.contains(*entry))
        .map(|entry| entry.to_string())
}

fn profile_category(ctx: &FieldContext<'_>) -> Option<String> {
    ctx.profile.default_category.clone()
}

// Author

fn participant_author(ctx: &FieldContext<'_>) -> Option<String> {
    for participant in ctx.block.select(&PARTICIPANT) {
        let hidden = participant
            .select(&HIDDEN_SPANS)
            .filter(|span| has_class(*span, "sm:inline"));
        let semibold = participant.select(&SEMIBOLD_SPANS);

        if let Some(name) = hidden
            .chain(semibold)
            .map(clean_text)
            .find_map(|text| name_shaped(&text, &ctx.title))
        {
            return Some(name);
        }
    }
    None
}

fn labelled_author(ctx: &FieldContext<'_>) -> Option<String> {
    capture(&AUTHOR_LABEL, &ctx.text).and_then(|text| name_shaped(&text, &ctx.title))
}

/// Accepts text that reads like a person's name, collapsing doubled renderings
/// such as "IvanIvan".
fn name_shaped(text: &str, title: &str) -> Option<String> {
    let text = text.trim();
    let length = text.chars().count();
    if text.is_empty()
        || length >= NAME_MAX_CHARS
        || text == title
        || text.contains("...")
        || text.contains('…')
    {
        return None;
    }
    Some(collapse_doubled(text))
}

fn collapse_doubled(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let half = chars.len() / 2;
    if chars.len() % 2 == 0 && half > 0 && chars[..half] == chars[half..] {
        chars[..half].iter().collect()
    } else {
        text.to_string()
    }
}

// Published

fn schedule_icons<'a>(ctx: &FieldContext<'a>) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    ctx.block
        .select(&ICONS)
        .filter(|icon| clean_text(*icon) == SCHEDULE_ICON)
}

fn schedule_icon_sibling(ctx: &FieldContext<'_>) -> Option<String> {
    schedule_icons(ctx)
        .filter_map(next_sibling_text)
        .find(|text| {
            looks_like_recency(text) && !contains_any(&text.to_lowercase(), PUBLISHED_EXCLUDED)
        })
        .map(|text| truncate_chars(&text, SHORT_LEAF_MAX_CHARS))
}

fn short_recency_leaf(ctx: &FieldContext<'_>) -> Option<String> {
    text_leaves(ctx.block)
        .map(|(_, text)| text)
        .find(|leaf| is_publication_leaf(leaf, ctx))
}

fn is_publication_leaf(leaf: &str, ctx: &FieldContext<'_>) -> bool {
    if leaf.chars().count() >= SHORT_LEAF_MAX_CHARS || !looks_like_recency(leaf) {
        return false;
    }
    let lower = leaf.to_lowercase();
    if contains_any(&lower, PUBLISHED_EXCLUDED) || contains_any(&lower, STATUS_MARKERS) {
        return false;
    }
    !mentions_field(leaf, &ctx.price, &[PRICE_UNSPECIFIED, PRICE_BY_AGREEMENT])
        && !mentions_field(leaf, &ctx.category, &[CATEGORY_UNSPECIFIED])
        && !mentions_field(leaf, &ctx.title, &[UNTITLED])
}

/// True when `leaf` contains an extracted field value. Empty values and sentinels never match.
fn mentions_field(leaf: &str, value: &str, sentinels: &[&str]) -> bool {
    !value.is_empty() && !sentinels.contains(&value) && leaf.contains(value)
}

fn schedule_icon_paragraph(ctx: &FieldContext<'_>) -> Option<String> {
    schedule_icons(ctx)
        .filter_map(parent_element)
        .flat_map(|parent| parent.select(&PARAGRAPH))
        .map(clean_text)
        .find(|text| looks_like_recency(text))
        .map(|text| truncate_chars(&text, SHORT_LEAF_MAX_CHARS))
}

fn status_line(ctx: &FieldContext<'_>) -> Option<String> {
    ctx.text.lines().find_map(|line| {
        let lower = line.to_lowercase();
        let marker = STATUS_MARKERS.iter().find(|marker| lower.contains(*marker))?;
        let (_, rest) = lower.split_once(marker)?;
        let rest = rest.trim();
        contains_word_start(rest, STATUS_TIME_WORDS)
            .then(|| truncate_chars(rest, SHORT_LEAF_MAX_CHARS))
    })
}

fn labelled_published(ctx: &FieldContext<'_>) -> Option<String> {
    capture(&PUBLISHED_LABEL, &ctx.text)
        .or_else(|| RELATIVE_TIME.find(&ctx.flat).map(|m| m.as_str().to_string()))
        .map(|text| truncate_chars(&text, SHORT_LEAF_MAX_CHARS))
}

// Description

fn body_paragraph(ctx: &FieldContext<'_>) -> Option<String> {
    ctx.block
        .select(&BODY_PARAGRAPHS)
        .map(clean_text)
        .find(|text| !text.is_empty())
}

fn long_paragraph(ctx: &FieldContext<'_>) -> Option<String> {
    ctx.block
        .select(&TEXT_CONTAINERS)
        .map(|el| {
            if el.value().name() == "p" {
                clean_text(el)
            } else {
                own_text(el)
            }
        })
        .find(|text| {
            text.chars().count() > LONG_PARAGRAPH_MIN_CHARS
                && *text != ctx.title
                && !contains_any(&text.to_lowercase(), BOILERPLATE)
        })
}
