//! Relative publication time ("5 минут назад", "2 hours ago") to a minutes-ago ordinal.

use super::lexicon::contains_word_start;
use crate::models::PUBLISHED_RECENT;

const MINUTES_PER_HOUR: u64 = 60;
const MINUTES_PER_DAY: u64 = 24 * MINUTES_PER_HOUR;
const MINUTES_PER_WEEK: u64 = 7 * MINUTES_PER_DAY;
const MINUTES_PER_MONTH: u64 = 30 * MINUTES_PER_DAY;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
}

/// Checked in this order; the first unit with a matching stem wins.
const UNIT_STEMS: &[(Unit, &[&str])] = &[
    (Unit::Seconds, &["секунд", "сек", "second", "sec"]),
    (Unit::Minutes, &["минут", "мин", "minute", "min"]),
    (Unit::Hours, &["час", "hour"]),
    (Unit::Days, &["день", "дня", "дней", "day"]),
    (Unit::Weeks, &["недел", "week"]),
    (Unit::Months, &["месяц", "month"]),
];

/// Converts a publication phrase into minutes ago.
///
/// Never fails. Anything without a digit or a known unit maps to 0, which sorts
/// as the most recent order.
pub fn minutes_ago(phrase: &str) -> u64 {
    let phrase = phrase.trim().to_lowercase();
    if phrase.is_empty() || phrase == PUBLISHED_RECENT {
        return 0;
    }

    let Some(value) = first_number(&phrase) else {
        return 0;
    };

    match unit_of(&phrase) {
        Some(Unit::Seconds) => (value / 60).max(1),
        Some(Unit::Minutes) => value,
        Some(Unit::Hours) => value.saturating_mul(MINUTES_PER_HOUR),
        Some(Unit::Days) => value.saturating_mul(MINUTES_PER_DAY),
        Some(Unit::Weeks) => value.saturating_mul(MINUTES_PER_WEEK),
        Some(Unit::Months) => value.saturating_mul(MINUTES_PER_MONTH),
        None => 0,
    }
}

fn first_number(phrase: &str) -> Option<u64> {
    let digits: String = phrase
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.is_empty() {
        return None;
    }
    // Overflowing digit runs are treated like any other unparseable phrase.
    digits.parse().ok()
}

fn unit_of(phrase: &str) -> Option<Unit> {
    UNIT_STEMS
        .iter()
        .find(|(_, stems)| contains_word_start(phrase, stems))
        .map(|(unit, _)| *unit)
}

/// True when the phrase mentions any time unit or relative marker.
pub fn looks_like_recency(text: &str) -> bool {
    contains_word_start(&text.to_lowercase(), RECENCY_MARKERS)
}

const RECENCY_MARKERS: &[&str] = &[
    "назад", "секунд", "минут", "минуту", "час", "день", "дня", "дней", "недел", "месяц",
    "ago", "second", "minute", "hour", "day", "week", "month",
];
