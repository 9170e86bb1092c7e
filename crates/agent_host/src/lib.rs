//! Agent Host - chat session orchestration
//!
//! This crate provides the pieces that sit between a chat UI and the
//! generation providers:
//! - Conversation history replayed to the text model on every call
//! - Intent detection that routes "draw me ..." messages to image generation
//! - Escaped markup rendering of model output
//! - The orchestrator that sequences one message at a time

pub mod history;
pub mod intent;
pub mod markup;
pub mod orchestrator;
pub mod prompts;
pub mod renderer;

pub use history::ConversationHistory;
pub use intent::IntentRouter;
pub use markup::to_markup;
pub use orchestrator::{ChatOrchestrator, IgnoreReason, SendState, Submission};
pub use renderer::{BotReply, ChatRenderer, ThinkingHandle};
