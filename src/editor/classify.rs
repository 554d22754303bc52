use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

// `[\p{Alphabetic}\p{N}_]` is exactly the set accepted by `is_word_char` minus
// the two sigils, so the patterns and the boundary scanner never disagree.
const HASHTAG_PATTERN: &str = r"#[\p{Alphabetic}\p{N}_]*\p{Alphabetic}[\p{Alphabetic}\p{N}_]*";
const MENTION_PATTERN: &str = r"@[\p{Alphabetic}\p{N}_]+";

static HASHTAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(HASHTAG_PATTERN).expect("hashtag pattern compiles"));
static MENTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(MENTION_PATTERN).expect("mention pattern compiles"));
static HASHTAG_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^(?:{HASHTAG_PATTERN})$")).expect("anchored hashtag pattern compiles")
});
static MENTION_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!("^(?:{MENTION_PATTERN})$")).expect("anchored mention pattern compiles")
});

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TagKind {
    Hashtag,
    Mention,
}

impl TagKind {
    pub fn label(self) -> &'static str {
        match self {
            TagKind::Hashtag => "hashtag",
            TagKind::Mention => "mention",
        }
    }
}

/// First tag token found inside a longer text. Offsets are in chars.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TagMatch {
    pub start: usize,
    pub len: usize,
    pub kind: TagKind,
}

impl TagMatch {
    pub fn end(&self) -> usize {
        self.start + self.len
    }
}

/// Half-open char range `[start, end)` of one word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct WordSpan {
    pub start: usize,
    pub end: usize,
}

impl WordSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True when the span overlaps or touches `[from, to]`.
    pub fn touches(&self, from: usize, to: usize) -> bool {
        self.start <= to && self.end >= from
    }
}

/// Which tag kinds are recognized. Both are on unless configured otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagPatterns {
    pub hashtags: bool,
    pub mentions: bool,
}

impl Default for TagPatterns {
    fn default() -> Self {
        Self {
            hashtags: true,
            mentions: true,
        }
    }
}

impl TagPatterns {
    /// Returns the leftmost substring of `text` that is a tag token.
    pub fn match_tag(&self, text: &str) -> Option<TagMatch> {
        let hashtag = self
            .hashtags
            .then(|| HASHTAG.find(text))
            .flatten()
            .map(|m| (m, TagKind::Hashtag));
        let mention = self
            .mentions
            .then(|| MENTION.find(text))
            .flatten()
            .map(|m| (m, TagKind::Mention));

        let (found, kind) = match (hashtag, mention) {
            (Some(h), Some(m)) => {
                if h.0.start() <= m.0.start() {
                    h
                } else {
                    m
                }
            }
            (Some(h), None) => h,
            (None, Some(m)) => m,
            (None, None) => return None,
        };

        let start = text[..found.start()].chars().count();
        let len = found.as_str().chars().count();
        Some(TagMatch { start, len, kind })
    }

    /// Anchored classification: the whole word must be one tag token.
    pub fn classify_word(&self, word: &str) -> Option<TagKind> {
        if word.is_empty() {
            return None;
        }
        if self.hashtags && HASHTAG_WORD.is_match(word) {
            return Some(TagKind::Hashtag);
        }
        if self.mentions && MENTION_WORD.is_match(word) {
            return Some(TagKind::Mention);
        }
        None
    }

    pub fn word_matches_tag_pattern(&self, word: &str) -> bool {
        self.classify_word(word).is_some()
    }
}

/// `#` and `@` continue a word so that a tag token is read as one word.
/// Everything else that is not alphanumeric or `_` is a boundary, including
/// every kind of whitespace (no-break spaces behave exactly like spaces).
pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '#' || ch == '@'
}

/// Char index of the first boundary character, or the char length when the
/// whole text is one word.
pub fn first_non_word_index(text: &str) -> usize {
    let mut count = 0;
    for ch in text.chars() {
        if !is_word_char(ch) {
            return count;
        }
        count += 1;
    }
    count
}

/// Char index of the last boundary character in `text`.
pub fn last_non_word_index(text: &str) -> Option<usize> {
    let mut last = None;
    for (idx, ch) in text.chars().enumerate() {
        if !is_word_char(ch) {
            last = Some(idx);
        }
    }
    last
}

/// Span of the word containing `index`. When `index` sits between a word and
/// a boundary character the word on the left wins; between two boundaries
/// the span is empty.
pub fn word_boundaries(text: &str, index: usize) -> WordSpan {
    let byte_idx = char_to_byte_idx(text, index);
    let (before, after) = text.split_at(byte_idx);
    let index = before.chars().count();
    let start = last_non_word_index(before).map_or(0, |idx| idx + 1);
    let end = index + first_non_word_index(after);
    WordSpan { start, end }
}

/// Every non-empty word of `text`, left to right.
pub fn words(text: &str) -> Vec<WordSpan> {
    let mut result = Vec::new();
    let mut start = None;
    let mut idx = 0;
    for ch in text.chars() {
        match (is_word_char(ch), start) {
            (true, None) => start = Some(idx),
            (false, Some(begin)) => {
                result.push(WordSpan::new(begin, idx));
                start = None;
            }
            _ => {}
        }
        idx += 1;
    }
    if let Some(begin) = start {
        result.push(WordSpan::new(begin, idx));
    }
    result
}

/// Widens `[from, to]` so that it neither starts nor ends inside a word.
pub fn expand_to_words(text: &str, from: usize, to: usize) -> WordSpan {
    let chars: Vec<char> = text.chars().collect();
    let mut end = to.min(chars.len());
    let mut start = from.min(end);
    while start > 0 && is_word_char(chars[start - 1]) {
        start -= 1;
    }
    while end < chars.len() && is_word_char(chars[end]) {
        end += 1;
    }
    WordSpan::new(start, end)
}

/// Words overlapping or touching the char range `[from, to]`. Only the
/// widened range is scanned, never the whole text.
pub fn words_touching(text: &str, from: usize, to: usize) -> Vec<WordSpan> {
    let window = expand_to_words(text, from, to);
    words(char_slice(text, window.start, window.end))
        .into_iter()
        .map(|span| WordSpan::new(span.start + window.start, span.end + window.start))
        .collect()
}

pub fn char_to_byte_idx(text: &str, char_idx: usize) -> usize {
    if char_idx == 0 {
        return 0;
    }
    for (count, (byte_idx, _)) in text.char_indices().enumerate() {
        if count == char_idx {
            return byte_idx;
        }
    }
    text.len()
}

pub fn char_slice(text: &str, start: usize, end: usize) -> &str {
    let start = char_to_byte_idx(text, start);
    let end = char_to_byte_idx(text, end).max(start);
    &text[start..end]
}
