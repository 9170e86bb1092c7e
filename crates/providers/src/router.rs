use crate::images::{ImageStrategy, OpenAIImage, PlaceholderImage, PollinationsImage, StabilityImage};
use crate::ImageGenerationClient;
use anyhow::Result;
use async_trait::async_trait;
use shared::settings::{ChatSettings, ImageProviderKind};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Tries image strategies in order; the first success wins and the
/// placeholder covers everything else.
pub struct ImageRouter {
    strategies: Vec<Arc<dyn ImageStrategy>>,
    fallback: PlaceholderImage,
}

impl ImageRouter {
    pub fn new(strategies: Vec<Arc<dyn ImageStrategy>>, fallback: PlaceholderImage) -> Self {
        Self {
            strategies,
            fallback,
        }
    }

    /// The configured provider only; selection is static, not adaptive.
    pub fn from_settings(settings: &ChatSettings) -> Result<Self> {
        let strategy: Arc<dyn ImageStrategy> = match settings.image_provider {
            ImageProviderKind::Pollinations => {
                Arc::new(PollinationsImage::new(settings.image_size))
            }
            ImageProviderKind::OpenAI => Arc::new(OpenAIImage::from_settings(settings)?),
            ImageProviderKind::Stability => Arc::new(StabilityImage::from_settings(settings)?),
        };
        Ok(Self::new(
            vec![strategy],
            PlaceholderImage::new(settings.image_size),
        ))
    }

    /// Names of the strategies in the order they are tried.
    pub fn provider_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

#[async_trait]
impl ImageGenerationClient for ImageRouter {
    async fn generate(&self, prompt: &str) -> String {
        for strategy in &self.strategies {
            match strategy.generate(prompt).await {
                Ok(url) => {
                    debug!(provider = strategy.name(), "image generated");
                    return url;
                }
                Err(e) => {
                    warn!(provider = strategy.name(), error = %e, "image provider failed");
                    continue;
                }
            }
        }

        info!("all image providers failed, using placeholder");
        self.fallback.url(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingStrategy {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ImageStrategy for FailingStrategy {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn generate(&self, _prompt: &str) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(anyhow!("503 Service Unavailable"))
        }
    }

    struct FixedStrategy(&'static str);

    #[async_trait]
    impl ImageStrategy for FixedStrategy {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn generate(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_all_failures_fall_back_to_placeholder() {
        let first = Arc::new(FailingStrategy {
            calls: AtomicUsize::new(0),
        });
        let second = Arc::new(FailingStrategy {
            calls: AtomicUsize::new(0),
        });
        let router = ImageRouter::new(
            vec![
                first.clone() as Arc<dyn ImageStrategy>,
                second.clone() as Arc<dyn ImageStrategy>,
            ],
            PlaceholderImage::new(1024),
        );

        let url = router.generate("kucing oren").await;
        assert_eq!(url, "https://picsum.photos/seed/kucing%20oren/1024/1024");
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_first_success_wins() {
        let failing = Arc::new(FailingStrategy {
            calls: AtomicUsize::new(0),
        });
        let router = ImageRouter::new(
            vec![
                failing.clone() as Arc<dyn ImageStrategy>,
                Arc::new(FixedStrategy("data:image/png;base64,AAAA")) as Arc<dyn ImageStrategy>,
                Arc::new(FixedStrategy("never")) as Arc<dyn ImageStrategy>,
            ],
            PlaceholderImage::new(1024),
        );

        assert_eq!(router.generate("x").await, "data:image/png;base64,AAAA");
        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_default_settings_use_pollinations() {
        let router = ImageRouter::from_settings(&ChatSettings::default()).unwrap();
        assert_eq!(router.provider_names(), vec!["pollinations"]);

        let url = router.generate("kucing oren").await;
        assert!(url.starts_with("https://image.pollinations.ai/prompt/kucing%20oren?"));
    }
}
