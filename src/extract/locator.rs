//! Finds the sub-trees of a listing page that look like one order each.
//!
//! Three independent strategies propose candidates; each candidate must pass
//! [`is_order_block`]. Results are unioned in strategy order and deduplicated by
//! node identity.

use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;

use super::SourceProfile;
use super::dom::{css, first_matching_ancestor, parent_element, text_leaves};
use super::lexicon::{
    ACTION_PHRASES, DOMAIN_CUES, LISTING_HREF_HINTS, PRICE_CUES, RECENCY_CUES, contains_any,
    contains_word_start,
};

/// Ancestor walk bound when climbing from an action phrase.
const ACTION_WALK_DEPTH: usize = 15;
/// Ancestor walk bound when climbing from a listing link.
const LINK_WALK_DEPTH: usize = 10;
/// A block needs strictly more trimmed characters than this.
const MIN_BLOCK_CHARS: usize = 50;

/// Container signatures: bordered, shadowed or rounded cards.
static CONTAINER_SIGNATURES: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        "div.border.border-gray-300",
        r#"div[class*="border"]"#,
        r#"div[class*="shadow"]"#,
        r#"div[class*="rounded"]"#,
    ]
    .into_iter()
    .map(css)
    .collect()
});

static LINKS: LazyLock<Selector> = LazyLock::new(|| css("a[href]"));

/// A detection strategy: a pure function from a document to candidate blocks.
pub type Strategy = for<'a> fn(&'a Html, &SourceProfile) -> Vec<ElementRef<'a>>;

pub const STRATEGIES: &[(&str, Strategy)] = &[
    ("action-cue", action_cue_blocks),
    ("structural-signature", signature_blocks),
    ("listing-link", listing_link_blocks),
];

/// Candidate order blocks in first-seen order. An empty result is not an error.
pub fn locate_blocks<'a>(document: &'a Html, profile: &SourceProfile) -> Vec<ElementRef<'a>> {
    let mut seen = HashSet::new();
    let mut blocks = Vec::new();

    for (name, strategy) in STRATEGIES {
        let found = strategy(document, profile);
        let before = blocks.len();
        for block in found {
            if seen.insert(block.id()) {
                blocks.push(block);
            }
        }
        tracing::debug!(
            "{} strategy: {} new candidate blocks on {}",
            name,
            blocks.len() - before,
            profile.name
        );
    }

    blocks
}

/// Climbs from every text leaf that carries an action phrase.
pub fn action_cue_blocks<'a>(document: &'a Html, profile: &SourceProfile) -> Vec<ElementRef<'a>> {
    text_leaves(document.root_element())
        .filter(|(_, text)| contains_any(&text.to_lowercase(), ACTION_PHRASES))
        .filter_map(|(holder, _)| {
            first_matching_ancestor(holder, ACTION_WALK_DEPTH, |el| is_order_block(el, profile))
        })
        .collect()
}

/// Tests every node matching one of the container signatures.
pub fn signature_blocks<'a>(document: &'a Html, profile: &SourceProfile) -> Vec<ElementRef<'a>> {
    CONTAINER_SIGNATURES
        .iter()
        .flat_map(|selector| document.select(selector))
        .filter(|el| is_order_block(*el, profile))
        .collect()
}

/// Climbs from every anchor whose target is a listing url.
pub fn listing_link_blocks<'a>(document: &'a Html, profile: &SourceProfile) -> Vec<ElementRef<'a>> {
    document
        .select(&LINKS)
        .filter(|link| {
            link.value()
                .attr("href")
                .is_some_and(|href| profile.is_listing_href(href))
        })
        .filter_map(parent_element)
        .filter_map(|start| {
            first_matching_ancestor(start, LINK_WALK_DEPTH, |el| is_order_block(el, profile))
        })
        .collect()
}

/// The block classifier.
///
/// A block needs a way to act on it (action phrase or listing link), something
/// order-like to say (price, recency or domain wording) and enough text.
pub fn is_order_block(element: ElementRef<'_>, profile: &SourceProfile) -> bool {
    let text: String = element.text().collect();
    let trimmed = text.trim();
    if trimmed.chars().count() <= MIN_BLOCK_CHARS {
        return false;
    }

    let lower = trimmed.to_lowercase();
    let actionable = contains_any(&lower, ACTION_PHRASES) || has_listing_link(element, profile);
    if !actionable {
        return false;
    }

    contains_any(&lower, PRICE_CUES)
        || contains_word_start(&lower, RECENCY_CUES)
        || contains_any(&lower, DOMAIN_CUES)
}

fn has_listing_link(element: ElementRef<'_>, profile: &SourceProfile) -> bool {
    element.select(&LINKS).any(|link| {
        link.value().attr("href").is_some_and(|href| {
            profile.is_listing_href(href) || contains_any(&href.to_lowercase(), LISTING_HREF_HINTS)
        })
    })
}
