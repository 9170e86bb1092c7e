//! Outbound calls to the text and image generation services.

pub mod gemini;
pub mod images;
pub mod router;

use async_trait::async_trait;
use reqwest::Client;
use shared::agent_api::Turn;
use shared::ProviderError;
use std::time::Duration;

pub use gemini::GeminiClient;
pub use router::ImageRouter;

/// One round trip to a generative-text provider.
#[async_trait]
pub trait TextGenerationClient: Send + Sync {
    /// `history` is sent first, followed by `new_turn`. Neither is mutated.
    async fn generate(
        &self,
        history: &[Turn],
        new_turn: &Turn,
        system_instruction: &Turn,
    ) -> Result<String, ProviderError>;
}

/// Produces something displayable for a prompt. Never fails; provider
/// trouble degrades to a placeholder.
#[async_trait]
pub trait ImageGenerationClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> String;
}

pub(crate) fn http_client(timeout_secs: Option<u64>) -> anyhow::Result<Client> {
    let mut builder = Client::builder().pool_max_idle_per_host(2);
    if let Some(secs) = timeout_secs {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    Ok(builder.build()?)
}
