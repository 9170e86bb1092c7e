//! Image generation backends.
//!
//! Each strategy either produces a displayable URL (remote or `data:`) or an
//! error that the [`ImageRouter`](crate::router::ImageRouter) swallows before
//! moving on. [`PlaceholderImage`] is the infallible end of every chain.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use shared::settings::ChatSettings;

use crate::http_client;

pub const POLLINATIONS_BASE: &str = "https://image.pollinations.ai/prompt";
pub const OPENAI_IMAGES_ENDPOINT: &str = "https://api.openai.com/v1/images/generations";
pub const STABILITY_ENDPOINT: &str = "https://api.stability.ai/v2beta/stable-image/generate/core";
pub const PLACEHOLDER_BASE: &str = "https://picsum.photos/seed";

#[async_trait]
pub trait ImageStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, prompt: &str) -> Result<String>;
}

fn encode_prompt(prompt: &str) -> String {
    urlencoding::encode(prompt).into_owned()
}

/// Wrap a base64 PNG payload as a data URL after checking it decodes.
fn png_data_url(b64: &str) -> Result<String> {
    let b64 = b64.trim();
    if b64.is_empty() {
        bail!("empty image payload");
    }
    BASE64
        .decode(b64.as_bytes())
        .context("image payload is not valid base64")?;
    Ok(format!("data:image/png;base64,{b64}"))
}

async fn response_json_or_error(provider: &str, response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    let body = response
        .text()
        .await
        .with_context(|| format!("{provider} response body read failed"))?;
    if !status.is_success() {
        let snippet: String = body.chars().take(512).collect();
        bail!("{provider} request failed ({}): {snippet}", status.as_u16());
    }
    serde_json::from_str(&body).with_context(|| format!("{provider} returned invalid JSON payload"))
}

/// Keyless backend; the URL itself is the result.
pub struct PollinationsImage {
    size: u32,
}

impl PollinationsImage {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    pub fn url(&self, prompt: &str) -> String {
        format!(
            "{POLLINATIONS_BASE}/{}?n=1&size={size}x{size}&model=flux",
            encode_prompt(prompt),
            size = self.size
        )
    }
}

#[async_trait]
impl ImageStrategy for PollinationsImage {
    fn name(&self) -> &'static str {
        "pollinations"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        Ok(self.url(prompt))
    }
}

#[derive(Debug, Serialize)]
struct OpenAIImageRequest<'a> {
    prompt: &'a str,
    size: String,
    model: &'a str,
}

pub struct OpenAIImage {
    http: Client,
    api_key: Option<String>,
    model: String,
    size: u32,
}

impl OpenAIImage {
    pub fn from_settings(settings: &ChatSettings) -> Result<Self> {
        Ok(Self {
            http: http_client(settings.request_timeout_secs)?,
            api_key: settings.openai_auth.resolve("OPENAI_API_KEY"),
            model: settings.openai_image_model.clone(),
            size: settings.image_size,
        })
    }

    fn decode_payload(payload: &Value) -> Result<String> {
        let b64 = payload
            .get("data")
            .and_then(Value::as_array)
            .and_then(|rows| rows.first())
            .and_then(|row| row.get("b64_json"))
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("OpenAI response missing data[0].b64_json"))?;
        png_data_url(b64)
    }
}

#[async_trait]
impl ImageStrategy for OpenAIImage {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("OPENAI_API_KEY not set");
        };
        let req = OpenAIImageRequest {
            prompt,
            size: format!("{0}x{0}", self.size),
            model: &self.model,
        };
        let resp = self
            .http
            .post(OPENAI_IMAGES_ENDPOINT)
            .bearer_auth(api_key)
            .json(&req)
            .send()
            .await
            .context("OpenAI image request failed")?;
        let payload = response_json_or_error("OpenAI", resp).await?;
        Self::decode_payload(&payload)
    }
}

#[derive(Debug, Serialize)]
struct StabilityRequest<'a> {
    prompt: &'a str,
    output_format: &'static str,
    width: u32,
    height: u32,
}

pub struct StabilityImage {
    http: Client,
    api_key: Option<String>,
    size: u32,
}

impl StabilityImage {
    pub fn from_settings(settings: &ChatSettings) -> Result<Self> {
        Ok(Self {
            http: http_client(settings.request_timeout_secs)?,
            api_key: settings.stability_auth.resolve("STABILITY_API_KEY"),
            size: settings.image_size,
        })
    }

    fn decode_payload(payload: &Value) -> Result<String> {
        let b64 = payload
            .get("image")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("Stability JSON response missing image bytes"))?;
        png_data_url(b64)
    }
}

#[async_trait]
impl ImageStrategy for StabilityImage {
    fn name(&self) -> &'static str {
        "stability"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            bail!("STABILITY_API_KEY not set");
        };
        let req = StabilityRequest {
            prompt,
            output_format: "png",
            width: self.size,
            height: self.size,
        };
        let resp = self
            .http
            .post(STABILITY_ENDPOINT)
            .bearer_auth(api_key)
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&req)
            .send()
            .await
            .context("Stability image request failed")?;
        let payload = response_json_or_error("Stability", resp).await?;
        Self::decode_payload(&payload)
    }
}

/// Deterministic stock image seeded by the prompt.
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderImage {
    size: u32,
}

impl PlaceholderImage {
    pub fn new(size: u32) -> Self {
        Self { size }
    }

    pub fn url(&self, prompt: &str) -> String {
        format!(
            "{PLACEHOLDER_BASE}/{}/{size}/{size}",
            encode_prompt(prompt),
            size = self.size
        )
    }
}
