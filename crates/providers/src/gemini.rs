use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::agent_api::Turn;
use shared::settings::ChatSettings;
use shared::ProviderError;
use tracing::{debug, warn};

use crate::{http_client, TextGenerationClient};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Substituted when the provider answers without any candidate text.
pub const EMPTY_REPLY_PLACEHOLDER: &str = "🤖 ...";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest<'a> {
    contents: Vec<&'a Turn>,
    system_instruction: &'a Turn,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidateContent {
    #[serde(default)]
    parts: Vec<GeminiCandidatePart>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiCandidateContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

pub struct GeminiClient {
    http: Client,
    auth_token: Option<String>,
    model: String,
    api_base: String,
}

impl GeminiClient {
    /// A missing key is not an error here; it surfaces on the first call so
    /// a session without text access can still generate images.
    pub fn from_settings(settings: &ChatSettings) -> Result<Self> {
        let auth_token = settings.gemini_auth.resolve("GEMINI_API_KEY");
        if auth_token.is_none() {
            warn!("no Gemini API key configured; text replies will fail");
        }
        Ok(Self {
            http: http_client(settings.request_timeout_secs)?,
            auth_token,
            model: settings.gemini_model.clone(),
            api_base: GEMINI_API_BASE.to_string(),
        })
    }

    /// Point at a proxy that speaks the same API instead of Google directly.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }
}

/// The URL carries the key, so it is stripped; the source chain is kept so
/// the cause (refused, DNS, timeout) reaches the user.
fn transport_error(e: reqwest::Error) -> ProviderError {
    ProviderError::Transport(format!("{:#}", anyhow::Error::from(e.without_url())))
}

#[async_trait]
impl TextGenerationClient for GeminiClient {
    async fn generate(
        &self,
        history: &[Turn],
        new_turn: &Turn,
        system_instruction: &Turn,
    ) -> Result<String, ProviderError> {
        let Some(key) = self.auth_token.as_deref() else {
            return Err(ProviderError::MissingApiKey {
                provider: "Gemini".to_string(),
            });
        };
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.api_base, self.model, key
        );

        let mut contents: Vec<&Turn> = history.iter().collect();
        contents.push(new_turn);
        let req = GeminiRequest {
            contents,
            system_instruction,
        };
        debug!(model = %self.model, turns = req.contents.len(), "gemini generateContent");

        let resp = self
            .http
            .post(url)
            .json(&req)
            .send()
            .await
            .map_err(transport_error)?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(transport_error)?;

        if !status.is_success() {
            let err = ProviderError::from_status_body(status.as_u16(), &body);
            warn!(status = status.as_u16(), error = %err, "gemini request failed");
            return Err(err);
        }
        parse_reply(&body)
    }
}

/// First candidate's first text part, or the placeholder when there is none.
pub(crate) fn parse_reply(body: &str) -> Result<String, ProviderError> {
    let parsed: GeminiResponse = serde_json::from_str(body)
        .map_err(|e| ProviderError::MalformedResponse(format!("gemini response: {e}")))?;
    let text = parsed
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .and_then(|c| c.parts.first())
        .and_then(|p| p.text.clone())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| EMPTY_REPLY_PLACEHOLDER.to_string());
    Ok(text)
}
