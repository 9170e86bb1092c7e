//! Turns model output into display markup.
//!
//! Raw HTML is escaped before any markdown-ish token is translated, so model
//! output can never inject tags of its own.

use regex::Regex;
use std::sync::LazyLock;

static FENCED_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(.*?)```").expect("fenced code pattern is valid"));
static BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.*?)\*\*").expect("bold pattern is valid"));
static ITALIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.*?)\*").expect("italic pattern is valid"));
static BULLET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\*\s(.*)$").expect("bullet pattern is valid"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("blank line pattern is valid"));

pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

pub fn to_markup(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let escaped = escape_html(text);
    let out = FENCED_CODE.replace_all(&escaped, "<pre><code>${1}</code></pre>");
    let out = BOLD.replace_all(&out, "<b>${1}</b>");
    let out = ITALIC.replace_all(&out, "<i>${1}</i>");
    let out = BULLET.replace_all(&out, "• ${1}");
    let out = BLANK_LINES.replace_all(&out, "<br><br>");
    out.replace('\n', "<br>")
}
