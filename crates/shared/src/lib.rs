pub mod attachment;
pub mod error;

pub use attachment::Attachment;
pub use error::ProviderError;

pub mod settings {
    use anyhow::{Context, Result};
    use serde::{Deserialize, Serialize};
    use std::path::Path;

    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ProviderAuth {
        pub api_key: Option<String>,
    }

    impl ProviderAuth {
        pub fn with_key(key: impl Into<String>) -> Self {
            Self {
                api_key: Some(key.into()),
            }
        }

        /// Configured key, falling back to `env_var`. Blank values count as missing.
        pub fn resolve(&self, env_var: &str) -> Option<String> {
            self.api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .or_else(|| {
                    std::env::var(env_var)
                        .ok()
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty())
                })
        }
    }

    /// Which image backend is tried before the placeholder fallback.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum ImageProviderKind {
        #[default]
        Pollinations,
        OpenAI,
        Stability,
    }

    impl ImageProviderKind {
        pub fn as_str(&self) -> &'static str {
            match self {
                ImageProviderKind::Pollinations => "pollinations",
                ImageProviderKind::OpenAI => "openai",
                ImageProviderKind::Stability => "stability",
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct ChatSettings {
        pub gemini_model: String, // e.g., "gemini-1.5-flash"
        pub gemini_auth: ProviderAuth,
        pub image_provider: ImageProviderKind,
        pub openai_image_model: String, // e.g., "gpt-image-1"
        pub openai_auth: ProviderAuth,
        pub stability_auth: ProviderAuth,
        /// Square edge length in pixels for generated images
        pub image_size: u32,
        /// Overrides the built-in persona sent as the system instruction
        pub persona: Option<String>,
        /// Unset means requests wait for the provider indefinitely
        pub request_timeout_secs: Option<u64>,
    }

    impl Default for ChatSettings {
        fn default() -> Self {
            Self {
                gemini_model: "gemini-1.5-flash".into(),
                gemini_auth: ProviderAuth::default(),
                image_provider: ImageProviderKind::default(),
                openai_image_model: "gpt-image-1".into(),
                openai_auth: ProviderAuth::default(),
                stability_auth: ProviderAuth::default(),
                image_size: 1024,
                persona: None,
                request_timeout_secs: None,
            }
        }
    }

    impl ChatSettings {
        pub fn from_json_file(path: &Path) -> Result<Self> {
            let bytes = std::fs::read(path)
                .with_context(|| format!("reading settings from {}", path.display()))?;
            let settings = serde_json::from_slice(&bytes)
                .with_context(|| format!("parsing settings in {}", path.display()))?;
            Ok(settings)
        }

        pub fn save_json_file(&self, path: &Path) -> Result<()> {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, serde_json::to_string_pretty(self)?)?;
            Ok(())
        }
    }
}

pub mod agent_api {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum Role {
        User,
        Model,
        System,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct InlineData {
        pub data: String, // base64
        pub mime_type: String,
    }

    /// One content fragment of a turn.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(untagged)]
    pub enum Part {
        Text {
            text: String,
        },
        InlineData {
            #[serde(rename = "inlineData")]
            inline_data: InlineData,
        },
    }

    impl Part {
        pub fn text(text: impl Into<String>) -> Self {
            Part::Text { text: text.into() }
        }

        pub fn as_text(&self) -> Option<&str> {
            match self {
                Part::Text { text } => Some(text),
                Part::InlineData { .. } => None,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct Turn {
        pub role: Role,
        pub parts: Vec<Part>,
    }

    impl Turn {
        pub fn new(role: Role, parts: Vec<Part>) -> Self {
            Self { role, parts }
        }

        pub fn user_text(text: impl Into<String>) -> Self {
            Self::new(Role::User, vec![Part::text(text)])
        }

        pub fn model_text(text: impl Into<String>) -> Self {
            Self::new(Role::Model, vec![Part::text(text)])
        }

        pub fn system_text(text: impl Into<String>) -> Self {
            Self::new(Role::System, vec![Part::text(text)])
        }

        /// First text part, if any.
        pub fn text(&self) -> Option<&str> {
            self.parts.iter().find_map(Part::as_text)
        }
    }

    /// Outcome of intent classification. Derived per message, never stored.
    #[derive(Debug, Clone, Default, PartialEq, Eq)]
    pub struct IntentResult {
        pub is_image: bool,
        pub prompt: String,
    }

    impl IntentResult {
        pub fn text() -> Self {
            Self::default()
        }

        pub fn image(prompt: impl Into<String>) -> Self {
            Self {
                is_image: true,
                prompt: prompt.into(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::agent_api::{InlineData, Part, Role, Turn};
    use super::settings::{ChatSettings, ImageProviderKind, ProviderAuth};

    #[test]
    fn test_turn_wire_format() {
        let turn = Turn::new(
            Role::User,
            vec![
                Part::text("apa ini?"),
                Part::InlineData {
                    inline_data: InlineData {
                        data: "AAAA".into(),
                        mime_type: "image/png".into(),
                    },
                },
            ],
        );

        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "role": "user",
                "parts": [
                    {"text": "apa ini?"},
                    {"inlineData": {"data": "AAAA", "mimeType": "image/png"}}
                ]
            })
        );

        let back: Turn = serde_json::from_value(json).unwrap();
        assert_eq!(back, turn);
    }

    #[test]
    fn test_turn_text_skips_inline_data() {
        let turn = Turn::new(
            Role::User,
            vec![
                Part::InlineData {
                    inline_data: InlineData {
                        data: "AAAA".into(),
                        mime_type: "image/png".into(),
                    },
                },
                Part::text("caption"),
            ],
        );
        assert_eq!(turn.text(), Some("caption"));
    }

    #[test]
    fn test_settings_partial_json_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, r#"{"image_provider": "stability"}"#).unwrap();

        let settings = ChatSettings::from_json_file(&path).unwrap();
        assert_eq!(settings.image_provider, ImageProviderKind::Stability);
        assert_eq!(settings.gemini_model, "gemini-1.5-flash");
        assert_eq!(settings.image_size, 1024);
        assert!(settings.request_timeout_secs.is_none());
    }

    #[test]
    fn test_settings_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = ChatSettings::default();
        settings.openai_auth = ProviderAuth::with_key("sk-test");
        settings.save_json_file(&path).unwrap();

        let loaded = ChatSettings::from_json_file(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_provider_auth_prefers_configured_key() {
        let auth = ProviderAuth::with_key("  configured  ");
        assert_eq!(
            auth.resolve("SHARED_TEST_UNSET_KEY_VAR").as_deref(),
            Some("configured")
        );
        assert!(ProviderAuth::with_key("   ")
            .resolve("SHARED_TEST_UNSET_KEY_VAR")
            .is_none());
    }
}
