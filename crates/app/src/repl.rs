//! Line-oriented input loop for a chat session.

use agent_host::{ChatOrchestrator, Submission};
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::terminal::load_attachment;

pub const HELP: &str = "commands: /attach <image path>, /cancel, /quit";

#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    Quit,
    Cancel,
    Attach(&'a str),
    Unknown(&'a str),
    Message(&'a str),
    Blank,
}

impl<'a> Command<'a> {
    /// Only the first word decides the command, so `/attachment` is not
    /// `/attach`.
    pub fn parse(line: &'a str) -> Self {
        let input = line.trim();
        if input.is_empty() {
            return Command::Blank;
        }
        if !input.starts_with('/') {
            return Command::Message(input);
        }
        let (word, rest) = input
            .split_once(char::is_whitespace)
            .unwrap_or((input, ""));
        match word {
            "/quit" => Command::Quit,
            "/cancel" => Command::Cancel,
            "/attach" => Command::Attach(rest.trim()),
            _ => Command::Unknown(word),
        }
    }
}

/// Read commands and messages until EOF or `/quit`, then wait for every
/// accepted message to get its reply, images included.
pub async fn run<R>(session: Arc<ChatOrchestrator>, input: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut sends = JoinSet::new();
    let mut lines = input.lines();

    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Quit => break,
            Command::Blank => {}
            Command::Cancel => {
                session.discard_attachment();
                println!("attachment removed");
            }
            Command::Attach("") => println!("usage: /attach <image path>"),
            Command::Attach(path) => match load_attachment(Path::new(path)) {
                Ok(attachment) => {
                    println!("attached {}", attachment.mime_type);
                    session.stage_attachment(attachment);
                }
                Err(e) => println!("{e:#}"),
            },
            Command::Unknown(word) => println!("unknown command {word}; {HELP}"),
            Command::Message(text) => {
                // Sends run beside the loop so typing stays possible while a
                // reply is pending; the session ignores what it cannot accept.
                let session = Arc::clone(&session);
                let text = text.to_string();
                sends.spawn(async move { deliver(&session, &text).await });
            }
        }
        while sends.try_join_next().is_some() {}
    }

    let pending = sends.len();
    if pending > 0 {
        debug!(pending, "waiting for outstanding replies");
    }
    while let Some(joined) = sends.join_next().await {
        if let Err(e) = joined {
            warn!(error = %e, "send task failed");
        }
    }
    Ok(())
}

async fn deliver(session: &ChatOrchestrator, text: &str) {
    match session.submit(text, None).await {
        Submission::Ignored(reason) => debug!(?reason, "message not sent"),
        Submission::Replied(_) => {}
        Submission::ImageDispatched { task, .. } => {
            if let Err(e) = task.await {
                warn!(error = %e, "image task failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_host::{BotReply, ChatRenderer, ThinkingHandle};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use providers::{ImageGenerationClient, TextGenerationClient};
    use shared::agent_api::Turn;
    use shared::{Attachment, ProviderError};
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingRenderer {
        posted: Mutex<Vec<String>>,
        results: Mutex<Vec<BotReply>>,
        next: Mutex<u64>,
    }

    impl ChatRenderer for RecordingRenderer {
        fn clear_input(&self) {}

        fn user_message_posted(&self, text: &str, _attachment: Option<&Attachment>) {
            self.posted.lock().push(text.to_string());
        }

        fn bot_thinking_started(&self) -> ThinkingHandle {
            let mut next = self.next.lock();
            *next += 1;
            ThinkingHandle(*next)
        }

        fn bot_result_ready(&self, _handle: ThinkingHandle, reply: BotReply) {
            self.results.lock().push(reply);
        }
    }

    struct SlowText;

    #[async_trait]
    impl TextGenerationClient for SlowText {
        async fn generate(
            &self,
            _history: &[Turn],
            _new_turn: &Turn,
            _system_instruction: &Turn,
        ) -> Result<String, ProviderError> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok("baik!".to_string())
        }
    }

    struct SlowImage;

    #[async_trait]
    impl ImageGenerationClient for SlowImage {
        async fn generate(&self, prompt: &str) -> String {
            tokio::time::sleep(Duration::from_millis(50)).await;
            format!("https://img.test/{prompt}")
        }
    }

    fn session(renderer: Arc<RecordingRenderer>) -> Arc<ChatOrchestrator> {
        Arc::new(ChatOrchestrator::new(
            Arc::new(SlowText),
            Arc::new(SlowImage),
            renderer,
            Turn::system_text("persona"),
        ))
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("  /quit "), Command::Quit);
        assert_eq!(Command::parse("/cancel"), Command::Cancel);
        assert_eq!(Command::parse("/attach  kucing.png "), Command::Attach("kucing.png"));
        assert_eq!(Command::parse("/attach"), Command::Attach(""));
        assert_eq!(Command::parse("/attachment foo"), Command::Unknown("/attachment"));
        assert_eq!(Command::parse("halo /quit"), Command::Message("halo /quit"));
        assert_eq!(Command::parse("   "), Command::Blank);
    }

    #[tokio::test]
    async fn test_eof_waits_for_text_reply() {
        let renderer = Arc::new(RecordingRenderer::default());
        let session = session(renderer.clone());

        run(session.clone(), &b"halo, apa kabar?\n"[..]).await.unwrap();

        assert_eq!(*renderer.posted.lock(), vec!["halo, apa kabar?".to_string()]);
        let results = renderer.results.lock();
        assert_eq!(results.len(), 1);
        assert!(matches!(&results[0], BotReply::Text { .. }));
        assert_eq!(session.history_len(), 2);
    }

    #[tokio::test]
    async fn test_quit_waits_for_image_reply() {
        let renderer = Arc::new(RecordingRenderer::default());
        let session = session(renderer.clone());

        run(session, &b"gambar kucing oren\n/quit\nignored after quit\n"[..])
            .await
            .unwrap();

        assert_eq!(*renderer.posted.lock(), vec!["gambar kucing oren".to_string()]);
        let results = renderer.results.lock();
        assert_eq!(results.len(), 1);
        match &results[0] {
            BotReply::Image { url, .. } => assert_eq!(url, "https://img.test/kucing oren"),
            other => panic!("expected image reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_every_accepted_message_gets_one_result() {
        let renderer = Arc::new(RecordingRenderer::default());
        let session = session(renderer.clone());

        run(session, &b"halo, apa kabar?\ngambar kucing oren\n"[..])
            .await
            .unwrap();

        let posted = renderer.posted.lock().len();
        assert!(posted >= 1);
        assert_eq!(renderer.results.lock().len(), posted);
    }
}
