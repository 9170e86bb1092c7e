//! The presentation side of a chat session.
//!
//! The orchestrator never draws anything itself; it reports what happened
//! through a [`ChatRenderer`] and lets the front-end decide how it looks.

use shared::Attachment;

/// Identifies one "bot is thinking" bubble so its result lands in the right
/// place when several are on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThinkingHandle(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotReply {
    /// Model reply, already converted to markup
    Text { markup: String },
    Image {
        caption: String,
        url: String,
        alt: String,
    },
    Error { message: String },
}

pub trait ChatRenderer: Send + Sync {
    /// Empty the input box and drop any attachment preview.
    fn clear_input(&self);

    fn user_message_posted(&self, text: &str, attachment: Option<&Attachment>);

    fn bot_thinking_started(&self) -> ThinkingHandle;

    fn bot_result_ready(&self, handle: ThinkingHandle, reply: BotReply);
}
