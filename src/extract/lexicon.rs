//! Fixed word lists the heuristics match against. All entries are lower-case unless
//! noted; callers lower-case the text they test.

/// Call-to-action phrases found on listing cards.
pub const ACTION_PHRASES: &[&str] = &[
    "откликнуться",
    "подать заявку",
    "отправить предложение",
    "submit a proposal",
    "respond",
    "apply",
];

pub const PRICE_CUES: &[&str] = &["₽", "руб", "по договоренности", "по договорённости", "от ", "до ", "$", "€"];

pub const RECENCY_CUES: &[&str] = &[
    "назад", "час", "день", "минут", "сегодня", "вчера", "ago", "hour", "minute", "today",
    "yesterday",
];

/// Words that show up around orders: roles, categories, publication labels.
pub const DOMAIN_CUES: &[&str] = &[
    "категори",
    "заказ",
    "проект",
    "задач",
    "работ",
    "услуг",
    "исполнител",
    "заказчик",
    "автор",
    "опубликован",
    "создан",
    "category",
    "project",
    "client",
];

/// Substrings of hrefs that mark a link as pointing at a listing.
pub const LISTING_HREF_HINTS: &[&str] = &["order", "task", "project"];

/// Closed category vocabulary, case-sensitive, in fallback scan priority.
pub const CATEGORY_VOCABULARY: &[&str] = &[
    "Разработка",
    "Дизайн",
    "AI - искусственный интеллект",
    "SEO продвижение",
    "Программирование",
    "Копирайтинг и тексты",
    "Копирайтинг",
    "Реклама и маркетинг",
    "Маркетинг",
    "Администрирование",
    "DevOps",
    "Аудио/виде/фото",
    "Другое",
];

pub const CURRENCY_TOKENS: &[&str] = &["₽", "руб", "$", "€"];

pub const NEGOTIABLE_TOKENS: &[&str] = &["договор", "negotiable"];

/// Leaves containing these are never taken as a publication time.
pub const PUBLISHED_EXCLUDED: &[&str] = &[
    "₽", "руб", "категори", "просмотр", "коммент", "views", "comments",
];

/// Markers of "last seen" status lines: "был(а) 3 часа назад".
pub const STATUS_MARKERS: &[&str] = &["был(а)", "was "];

pub const STATUS_TIME_WORDS: &[&str] = &["час", "день", "недавно", "hour", "day", "recently"];

/// Text blocks that are page furniture rather than an order description.
pub const BOILERPLATE: &[&str] = &[
    "сведения об ооо",
    "все права защищены",
    "all rights reserved",
    "copyright",
    "©",
];

pub const SCHEDULE_ICON: &str = "schedule";

pub fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| haystack.contains(needle))
}

/// Like [`contains_any`], but a needle only counts where a word starts: the
/// character before it must not be a letter. "час" matches "2 часа" and "2часа",
/// never "участник" or "сейчас".
pub fn contains_word_start(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|needle| {
        haystack.match_indices(needle).any(|(index, _)| {
            !haystack[..index]
                .chars()
                .next_back()
                .is_some_and(char::is_alphabetic)
        })
    })
}
