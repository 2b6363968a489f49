//! Small helpers over `scraper` element references.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

static TITLE: LazyLock<Selector> = LazyLock::new(|| css("title"));

/// Parses a selector literal. Only used with constants, which are covered by tests.
pub fn css(selector: &str) -> Selector {
    Selector::parse(selector).unwrap_or_else(|e| panic!("invalid selector {selector:?}: {e:?}"))
}

pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// All descendant text, one text node per line.
pub fn block_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join("\n")
}

/// All descendant text with whitespace collapsed to single spaces.
pub fn clean_text(element: ElementRef<'_>) -> String {
    normalize_whitespace(&element.text().collect::<Vec<_>>().join(" "))
}

/// Text of direct text children only.
pub fn own_text(element: ElementRef<'_>) -> String {
    let parts: Vec<&str> = element
        .children()
        .filter_map(|child| child.value().as_text().map(|text| &**text))
        .collect();
    normalize_whitespace(&parts.join(" "))
}

pub fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

pub fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

/// Walks from `start` up through at most `max_depth` elements and returns the
/// first one accepted by `accept`.
pub fn first_matching_ancestor<'a>(
    start: ElementRef<'a>,
    max_depth: usize,
    accept: impl Fn(ElementRef<'a>) -> bool,
) -> Option<ElementRef<'a>> {
    let mut current = Some(start);
    let mut depth = 0;
    while let Some(element) = current {
        if depth >= max_depth {
            break;
        }
        if accept(element) {
            return Some(element);
        }
        current = parent_element(element);
        depth += 1;
    }
    None
}

/// Text of the first following sibling that carries any: an element's full text
/// or a bare text node.
pub fn next_sibling_text(element: ElementRef<'_>) -> Option<String> {
    element.next_siblings().find_map(|sibling| {
        let text = match ElementRef::wrap(sibling) {
            Some(el) => clean_text(el),
            None => sibling
                .value()
                .as_text()
                .map(|t| normalize_whitespace(t))
                .unwrap_or_default(),
        };
        (!text.is_empty()).then_some(text)
    })
}

/// Every non-blank text node under `root`, paired with the element holding it.
pub fn text_leaves<'a>(root: ElementRef<'a>) -> impl Iterator<Item = (ElementRef<'a>, String)> + 'a {
    root.descendants().filter_map(|node| {
        let text = node.value().as_text()?;
        let text = normalize_whitespace(text);
        if text.is_empty() {
            return None;
        }
        let parent = node.parent().and_then(ElementRef::wrap)?;
        Some((parent, text))
    })
}

pub fn page_title(document: &Html) -> Option<String> {
    document
        .select(&TITLE)
        .next()
        .map(clean_text)
        .filter(|title| !title.is_empty())
}

/// Cuts to at most `max` characters, never splitting a character.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((index, _)) => text[..index].to_string(),
        None => text.to_string(),
    }
}
