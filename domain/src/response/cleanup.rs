//! Response text cleanup.
//!
//! The backend appends suggested follow-up questions to its answers. They are
//! shown as buttons, so the text copy is removed before display.
//!
//! [`clean`] is idempotent and fail-open: if its patterns cannot be built the
//! original text is returned untouched.

use regex::Regex;
use std::sync::LazyLock;

/// Phrases that open the follow-up section of a response.
pub const FOLLOW_UP_HEADERS: &[&str] = &[
    "次に聞いてみませんか",
    "こんな質問もできます",
    "関連する質問",
    "フォローアップ質問",
    "Follow-up questions",
    "You might also ask",
];

/// Glyph that marks a suggested-question line.
pub const FOLLOW_UP_MARKER: char = '💬';

static HEADER_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    let phrases = FOLLOW_UP_HEADERS
        .iter()
        .map(|phrase| regex::escape(phrase))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?m)^[ \t]*(?:[#>*_]+[ \t]*)*(?:💡[ \t]*)?(?:{phrases})")).ok()
});

static BLANK_RUN_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?:\r?\n){3,}").ok());

/// Byte offset where the follow-up section starts, if there is one.
pub(crate) fn follow_up_section_start(text: &str) -> Option<usize> {
    HEADER_PATTERN.as_ref()?.find(text).map(|m| m.start())
}

/// Clean an assistant response for display.
pub fn clean(text: &str) -> String {
    try_clean(text).unwrap_or_else(|| text.to_string())
}

fn try_clean(text: &str) -> Option<String> {
    let header = HEADER_PATTERN.as_ref()?;
    let blank_run = BLANK_RUN_PATTERN.as_ref()?;

    let body = match header.find(text) {
        Some(m) => &text[..m.start()],
        None => text,
    };

    let without_markers = body
        .split('\n')
        .filter(|line| !line.contains(FOLLOW_UP_MARKER))
        .collect::<Vec<_>>()
        .join("\n");

    let collapsed = blank_run.replace_all(&without_markers, "\n\n");
    Some(collapsed.trim_end().to_string())
}
