//! Decides whether a message asks for a picture or a text reply.

use regex::Regex;
use shared::agent_api::IntentResult;
use std::sync::LazyLock;

/// Leading verbs (Indonesian and English) that turn a message into an image
/// request. Each may carry the Indonesian `-kan` suffix.
static IMAGE_TRIGGER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:kirim\s+gambar|buat|generate|gambar|lukis|ilustrasi|create|draw)(?:kan)?\b")
        .expect("image trigger pattern is valid")
});

#[derive(Debug, Clone, Copy, Default)]
pub struct IntentRouter;

impl IntentRouter {
    pub fn new() -> Self {
        Self
    }

    /// Accepts `&str` or `Option<&str>`; absent and empty input are text
    /// requests.
    pub fn classify<'a>(&self, text: impl Into<Option<&'a str>>) -> IntentResult {
        let Some(text) = text.into().filter(|t| !t.is_empty()) else {
            return IntentResult::text();
        };
        let Some(trigger) = IMAGE_TRIGGER.find(text) else {
            return IntentResult::text();
        };

        let remainder = text[trigger.end()..].trim();
        if remainder.is_empty() {
            IntentResult::image(text)
        } else {
            IntentResult::image(remainder)
        }
    }
}
