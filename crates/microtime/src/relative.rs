//! Microsecond phrases inside relative modification text.
//!
//! The calendar grammar has no microsecond unit, so phrases like
//! `"3 microseconds"`, `"-250 microseconds"` or `"next microsecond"` are cut
//! out of the text before the remainder is handed to
//! [`calendar::relative_modify`](crate::calendar::relative_modify). Their
//! values are summed into one signed delta.
//!
//! A phrase is two adjacent words separated by spaces or tabs: a signed
//! integer or an ordinal word, followed by `microsecond` or `microseconds`.
//! Ordinals are shared with the calendar grammar (`next month`), so only
//! the unit word decides whether a phrase belongs here.

use std::collections::HashMap;
use std::ops::Range;
use std::sync::LazyLock;

/// Words that reset the sub-second fraction when they appear in modify text.
pub const RESET_KEYWORDS: [&str; 5] = ["yesterday", "midnight", "today", "noon", "tomorrow"];

const UNIT_WORDS: [&str; 2] = ["microsecond", "microseconds"];

static ORDINALS: LazyLock<HashMap<&'static str, i64>> = LazyLock::new(|| {
    HashMap::from([
        ("first", 1),
        ("second", 2),
        ("third", 3),
        ("fourth", 4),
        ("fifth", 5),
        ("sixth", 6),
        ("seventh", 7),
        ("eighth", 8),
        ("ninth", 9),
        ("tenth", 10),
        ("eleventh", 11),
        ("twelfth", 12),
        ("next", 1),
        ("last", -1),
        ("previous", -1),
        ("this", 0),
    ])
});

/// The signed magnitude of an ordinal word (`"third"` → 3, `"last"` → -1),
/// case-insensitive.
pub fn ordinal_value(word: &str) -> Option<i64> {
    ORDINALS.get(word.to_ascii_lowercase().as_str()).copied()
}

/// One recognized microsecond phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MicrosecondToken {
    /// Byte range of the phrase itself, from the value to the end of the unit.
    pub span: Range<usize>,
    /// Signed microseconds the phrase stands for.
    pub value: i64,
}

/// Text with every microsecond phrase removed, plus their summed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extracted {
    pub remainder: String,
    pub net_microseconds: i64,
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Byte ranges of the space/tab separated words of `text`.
fn words(text: &str) -> Vec<Range<usize>> {
    let mut words = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (is_blank(c), start) {
            (true, Some(s)) => {
                words.push(s..i);
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        words.push(s..text.len());
    }
    words
}

fn phrase_value(word: &str) -> Option<i64> {
    let digits = word.strip_prefix(['+', '-']).unwrap_or(word);
    if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
        return word.strip_prefix('+').unwrap_or(word).parse().ok();
    }
    ordinal_value(word)
}

fn is_unit(word: &str) -> bool {
    UNIT_WORDS.iter().any(|unit| word.eq_ignore_ascii_case(unit))
}

/// Find every microsecond phrase in `text`, left to right, non-overlapping.
///
/// A number too large for `i64` is not a phrase and stays in the text.
pub fn scan(text: &str) -> Vec<MicrosecondToken> {
    let words = words(text);
    let mut tokens = Vec::new();
    let mut i = 0;

    while i + 1 < words.len() {
        let value_word = &text[words[i].clone()];
        let unit_word = &text[words[i + 1].clone()];
        match phrase_value(value_word) {
            Some(value) if is_unit(unit_word) => {
                tokens.push(MicrosecondToken {
                    span: words[i].start..words[i + 1].end,
                    value,
                });
                i += 2;
            }
            _ => i += 1,
        }
    }
    tokens
}

/// The bytes to cut for a phrase: the phrase and the blanks after it. A
/// phrase that ends the text takes the blanks before it instead, so no
/// trailing gap is left behind.
fn removal_span(text: &str, span: &Range<usize>) -> Range<usize> {
    let after = text[span.end..]
        .find(|c: char| !is_blank(c))
        .map_or(text.len(), |offset| span.end + offset);
    if after < text.len() {
        return span.start..after;
    }
    let before = text[..span.start]
        .rfind(|c: char| !is_blank(c))
        .map_or(0, |i| i + text[i..].chars().next().map_or(1, char::len_utf8));
    before..text.len()
}

/// Remove every microsecond phrase from `text` and sum their values.
///
/// ```
/// use microtime::relative::extract;
///
/// let out = extract("+1 day previous microsecond");
/// assert_eq!(out.remainder, "+1 day");
/// assert_eq!(out.net_microseconds, -1);
/// ```
pub fn extract(text: &str) -> Extracted {
    let mut remainder = String::with_capacity(text.len());
    let mut cursor = 0;
    let mut net_microseconds = 0i64;

    for token in scan(text) {
        let removal = removal_span(text, &token.span);
        if removal.start > cursor {
            remainder.push_str(&text[cursor..removal.start]);
        }
        cursor = cursor.max(removal.end);
        net_microseconds = net_microseconds.saturating_add(token.value);
    }
    remainder.push_str(&text[cursor..]);

    Extracted {
        remainder,
        net_microseconds,
    }
}

/// True if `text` contains a reset keyword as a separate word.
pub fn has_reset_keyword(text: &str) -> bool {
    words(text).into_iter().any(|word| {
        RESET_KEYWORDS
            .iter()
            .any(|keyword| text[word.clone()].eq_ignore_ascii_case(keyword))
    })
}
