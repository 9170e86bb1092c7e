//! Renders a chat session as plain lines on a terminal.

use agent_host::{BotReply, ChatRenderer, ThinkingHandle};
use anyhow::{bail, Context, Result};
use parking_lot::Mutex;
use shared::Attachment;
use std::io::Write;
use std::path::Path;

const WRAP_WIDTH: usize = 80;

pub struct TerminalRenderer<W: Write + Send> {
    out: Mutex<W>,
    next_handle: Mutex<u64>,
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
            next_handle: Mutex::new(0),
        }
    }

    fn line(&self, text: &str) {
        let mut out = self.out.lock();
        // A closed stdout is not worth crashing the session over.
        let _ = writeln!(out, "{text}");
        let _ = out.flush();
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: Write + Send> ChatRenderer for TerminalRenderer<W> {
    fn clear_input(&self) {}

    fn user_message_posted(&self, text: &str, attachment: Option<&Attachment>) {
        match attachment {
            Some(a) => self.line(&format!("you: {text}  [{}]", a.mime_type)),
            None => self.line(&format!("you: {text}")),
        }
    }

    fn bot_thinking_started(&self) -> ThinkingHandle {
        let mut next = self.next_handle.lock();
        *next += 1;
        let handle = ThinkingHandle(*next);
        self.line(&format!("bot #{}: ...", handle.0));
        handle
    }

    fn bot_result_ready(&self, handle: ThinkingHandle, reply: BotReply) {
        let body = match reply {
            BotReply::Text { markup } => markup_to_text(&markup),
            BotReply::Image { caption, url, .. } => {
                format!("{}\n{url}", markup_to_text(&caption))
            }
            BotReply::Error { message } => format!("! {message}"),
        };
        self.line(&format!("bot #{}: {body}", handle.0));
    }
}

pub fn markup_to_text(markup: &str) -> String {
    html2text::from_read(markup.as_bytes(), WRAP_WIDTH)
        .trim_end()
        .to_string()
}

fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Read an image from disk the way a dropped file would be accepted.
pub fn load_attachment(path: &Path) -> Result<Attachment> {
    let mime = mime_for_path(path);
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    match Attachment::dropped(&bytes, mime) {
        Some(attachment) => Ok(attachment),
        None => bail!("only image files can be attached ({})", path.display()),
    }
}
