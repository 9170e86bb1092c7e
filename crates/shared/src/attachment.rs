//! A file the user staged for the next outgoing message.

use anyhow::{anyhow, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::agent_api::{InlineData, Part};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Base64 payload without the `data:` prefix
    pub data: String,
    pub mime_type: String,
}

impl Attachment {
    pub fn from_bytes(bytes: &[u8], mime_type: impl Into<String>) -> Self {
        Self {
            data: BASE64.encode(bytes),
            mime_type: mime_type.into(),
        }
    }

    /// Parse a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| anyhow!("not a data URL"))?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| anyhow!("data URL has no payload"))?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or_else(|| anyhow!("data URL is not base64 encoded"))?;
        if mime_type.is_empty() {
            return Err(anyhow!("data URL has no mime type"));
        }
        Ok(Self {
            data: payload.to_string(),
            mime_type: mime_type.to_string(),
        })
    }

    /// Drag-and-drop only accepts images; anything else is ignored.
    pub fn dropped(bytes: &[u8], mime_type: &str) -> Option<Self> {
        if !mime_type.starts_with("image/") {
            return None;
        }
        Some(Self::from_bytes(bytes, mime_type))
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }

    pub fn to_part(&self) -> Part {
        Part::InlineData {
            inline_data: InlineData {
                data: self.data.clone(),
                mime_type: self.mime_type.clone(),
            },
        }
    }
}
