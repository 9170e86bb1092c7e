/// Shown when the text provider rejects a request without an error envelope.
pub const GENERIC_PROVIDER_ERROR: &str = "Gagal memuat respons AI";

/// Shown when a failure carries no usable message at all.
pub const FALLBACK_ERROR: &str = "Terjadi kesalahan saat memproses.";

/// Failure of a text-generation round trip. `Display` is the message the
/// user sees.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    #[error("{provider} API key not configured")]
    MissingApiKey { provider: String },

    #[error("{0}")]
    Transport(String),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("{0}")]
    MalformedResponse(String),
}

impl ProviderError {
    /// Build a status error from a raw response body, preferring the
    /// provider's `error.message` envelope.
    pub fn from_status_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .map(str::trim)
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| GENERIC_PROVIDER_ERROR.to_string());
        ProviderError::Status { status, message }
    }

    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            FALLBACK_ERROR.to_string()
        } else {
            message
        }
    }
}
