//! One chat session: history, staged attachment, and the send flag.
//!
//! A session is `Idle` or `Sending`. Text submissions hold `Sending` for the
//! whole round trip. Image submissions release it as soon as the image task
//! is spawned, so a new message can be accepted while a picture is still on
//! its way. That overlap is intentional.

use anyhow::Result;
use parking_lot::Mutex;
use providers::{GeminiClient, ImageGenerationClient, ImageRouter, TextGenerationClient};
use shared::agent_api::{Part, Role, Turn};
use shared::settings::ChatSettings;
use shared::{Attachment, ProviderError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::history::ConversationHistory;
use crate::intent::IntentRouter;
use crate::markup::to_markup;
use crate::prompts::{image_alt, image_caption, system_instruction};
use crate::renderer::{BotReply, ChatRenderer, ThinkingHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendState {
    Idle,
    Sending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyMessage,
    SendInFlight,
}

#[derive(Debug)]
pub enum Submission {
    /// Nothing happened: no history change, no UI notification
    Ignored(IgnoreReason),
    /// Text round trip finished; the renderer has already been told
    Replied(Result<String, ProviderError>),
    /// Image task is running detached from the send flag
    ImageDispatched {
        prompt: String,
        task: JoinHandle<()>,
    },
}

impl Submission {
    pub fn is_ignored(&self) -> bool {
        matches!(self, Submission::Ignored(_))
    }
}

/// Clears the send flag when dropped, including when a pending submit
/// future is dropped.
struct SendingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> SendingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct ChatOrchestrator {
    text_client: Arc<dyn TextGenerationClient>,
    image_client: Arc<dyn ImageGenerationClient>,
    renderer: Arc<dyn ChatRenderer>,
    intent: IntentRouter,
    system_instruction: Turn,
    history: Mutex<ConversationHistory>,
    staged: Mutex<Option<Attachment>>,
    sending: AtomicBool,
}

impl ChatOrchestrator {
    pub fn new(
        text_client: Arc<dyn TextGenerationClient>,
        image_client: Arc<dyn ImageGenerationClient>,
        renderer: Arc<dyn ChatRenderer>,
        system_instruction: Turn,
    ) -> Self {
        Self {
            text_client,
            image_client,
            renderer,
            intent: IntentRouter::new(),
            system_instruction,
            history: Mutex::new(ConversationHistory::new()),
            staged: Mutex::new(None),
            sending: AtomicBool::new(false),
        }
    }

    /// Gemini for text, the configured image provider for pictures.
    pub fn from_settings(settings: &ChatSettings, renderer: Arc<dyn ChatRenderer>) -> Result<Self> {
        let text_client = Arc::new(GeminiClient::from_settings(settings)?);
        let image_client = Arc::new(ImageRouter::from_settings(settings)?);
        info!(
            model = %settings.gemini_model,
            image_provider = settings.image_provider.as_str(),
            "chat session ready"
        );
        Ok(Self::new(
            text_client,
            image_client,
            renderer,
            system_instruction(settings.persona.as_deref()),
        ))
    }

    pub fn send_state(&self) -> SendState {
        if self.sending.load(Ordering::Acquire) {
            SendState::Sending
        } else {
            SendState::Idle
        }
    }

    pub fn is_sending(&self) -> bool {
        self.send_state() == SendState::Sending
    }

    pub fn stage_attachment(&self, attachment: Attachment) {
        *self.staged.lock() = Some(attachment);
    }

    pub fn discard_attachment(&self) {
        self.staged.lock().take();
    }

    pub fn staged_attachment(&self) -> Option<Attachment> {
        self.staged.lock().clone()
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }

    pub fn history_snapshot(&self) -> Vec<Turn> {
        self.history.lock().snapshot()
    }

    /// Send one user message. `attachment` wins over the staged one; either
    /// way the staged slot is empty afterwards unless the call was ignored.
    pub async fn submit(&self, raw_text: &str, attachment: Option<Attachment>) -> Submission {
        let text = raw_text.trim();
        if text.is_empty() {
            debug!("ignoring empty message");
            return Submission::Ignored(IgnoreReason::EmptyMessage);
        }
        let Some(guard) = SendingGuard::acquire(&self.sending) else {
            debug!("ignoring message while a send is in flight");
            return Submission::Ignored(IgnoreReason::SendInFlight);
        };

        let staged = self.staged.lock().take();
        let attachment = attachment.or(staged);

        self.renderer.clear_input();
        self.renderer.user_message_posted(text, attachment.as_ref());
        let handle = self.renderer.bot_thinking_started();

        let intent = self.intent.classify(text);
        if intent.is_image {
            let task = self.dispatch_image(handle, intent.prompt.clone());
            drop(guard);
            return Submission::ImageDispatched {
                prompt: intent.prompt,
                task,
            };
        }

        let result = self.exchange_text(text, attachment).await;
        let reply = match &result {
            Ok(reply) => BotReply::Text {
                markup: to_markup(reply.trim()),
            },
            Err(e) => BotReply::Error {
                message: e.user_message(),
            },
        };
        self.renderer.bot_result_ready(handle, reply);
        drop(guard);
        Submission::Replied(result)
    }

    fn dispatch_image(&self, handle: ThinkingHandle, prompt: String) -> JoinHandle<()> {
        debug!(prompt = %prompt, "dispatching image request");
        let image_client = Arc::clone(&self.image_client);
        let renderer = Arc::clone(&self.renderer);
        tokio::spawn(async move {
            let url = image_client.generate(&prompt).await;
            renderer.bot_result_ready(
                handle,
                BotReply::Image {
                    caption: to_markup(&image_caption(&prompt)),
                    url,
                    alt: image_alt(&prompt),
                },
            );
        })
    }

    /// The user turn stays in history even when the provider fails; the
    /// model turn is only added on success.
    async fn exchange_text(
        &self,
        text: &str,
        attachment: Option<Attachment>,
    ) -> Result<String, ProviderError> {
        let mut parts = vec![Part::text(text)];
        if let Some(attachment) = &attachment {
            parts.push(attachment.to_part());
        }
        let user_turn = Turn::new(Role::User, parts);

        let context = {
            let mut history = self.history.lock();
            let context = history.snapshot();
            history.append(user_turn.clone());
            context
        };

        match self
            .text_client
            .generate(&context, &user_turn, &self.system_instruction)
            .await
        {
            Ok(reply) => {
                self.history.lock().append(Turn::model_text(reply.clone()));
                Ok(reply)
            }
            Err(e) => {
                warn!(error = %e, "text generation failed");
                Err(e)
            }
        }
    }
}
