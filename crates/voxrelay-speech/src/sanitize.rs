//! Markdown → speakable plain text.
//!
//! Model answers arrive as Markdown. Speech engines read the markup aloud
//! ("asterisk asterisk"), so it is removed before synthesis:
//!
//! - Code blocks (```) → space
//! - Inline code (`) → space
//! - Links [text](url) → text
//! - Runs of `* _ ~ # > | -` → space
//! - Whitespace collapsed to single spaces, ends trimmed

use std::sync::LazyLock;

use regex::Regex;

static CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```.*?```").expect("code block pattern"));
static INLINE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`[^`]*`").expect("inline code pattern"));
static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("link pattern"));
static MARKUP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[*_~#>|\-]+").expect("markup pattern"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

fn pass(text: &str) -> String {
    let text = CODE_BLOCK.replace_all(text, " ");
    let text = INLINE_CODE.replace_all(&text, " ");
    let text = LINK.replace_all(&text, "$1");
    let text = MARKUP.replace_all(&text, " ");
    let text = WHITESPACE.replace_all(&text, " ");
    text.trim().to_string()
}

/// Strip Markdown markup so `text` can be read aloud.
///
/// Removing one construct can expose another (a link label holding
/// backticks, say), so the pass runs until the text stops changing. Every
/// pass after the first either leaves the text alone or shortens it.
pub fn sanitize(text: &str) -> String {
    let mut current = pass(text);
    loop {
        let next = pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}
