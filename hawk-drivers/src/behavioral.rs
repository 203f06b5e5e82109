use anyhow::Result;
use fantoccini::elements::Element;
use rand::rngs::OsRng;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone)]
/// Produces human-like delays and typing behavior to reduce automation signals.
pub struct BehavioralEngine {
    enabled: bool,
}

impl Default for BehavioralEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl BehavioralEngine {
    pub fn new() -> Self {
        Self { enabled: true }
    }

    /// An engine that never sleeps; used by tests and scripted sessions.
    pub fn instant() -> Self {
        Self { enabled: false }
    }

    /// Sleep for a random duration between `min` and `max` milliseconds.
    pub async fn random_delay(&self, min: u64, max: u64) {
        if !self.enabled {
            return;
        }
        let ms = OsRng.gen_range(min..=max.max(min));
        sleep(Duration::from_millis(ms)).await;
    }

    /// Pause between scroll steps so lazily loaded content can render.
    pub async fn settle(&self) {
        self.random_delay(600, 1500).await;
    }

    /// Type the provided text with small random delays between characters.
    pub async fn type_text_human_like(&self, element: &Element, text: &str) -> Result<()> {
        if !self.enabled {
            element.send_keys(text).await?;
            return Ok(());
        }
        for ch in text.chars() {
            element.send_keys(&ch.to_string()).await?;
            self.random_delay(30, 150).await;
        }
        Ok(())
    }
}
