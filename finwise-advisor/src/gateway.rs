use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

/// A provider that turns one text prompt into generated text.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// What came back from one bounded generation attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Success { text: String, elapsed: Duration },
    Timeout,
    ProviderError(String),
}

/// Bounded-wait front door to the LLM provider.
///
/// One call maps to exactly one provider attempt raced against a deadline.
/// There are no retries at this layer: a timeout or provider failure is
/// final for that request.
pub struct GenerationGateway {
    completion: Arc<dyn TextCompletion>,
}

impl GenerationGateway {
    pub fn new(completion: Arc<dyn TextCompletion>) -> Self {
        Self { completion }
    }

    /// Submit `prompt` and wait at most `deadline` for the result.
    ///
    /// When the deadline wins the race, the in-flight provider future is
    /// dropped. The provider may keep generating on its side; nothing
    /// local waits on or joins that work afterwards.
    pub async fn generate(&self, prompt: &str, deadline: Duration) -> GenerationOutcome {
        debug!(
            "submitting prompt ({} chars) with {}ms deadline",
            prompt.chars().count(),
            deadline.as_millis()
        );
        let started = Instant::now();

        match timeout(deadline, self.completion.complete(prompt)).await {
            Ok(Ok(text)) => {
                let elapsed = started.elapsed();
                debug!(
                    "generation finished in {}ms ({} chars)",
                    elapsed.as_millis(),
                    text.chars().count()
                );
                GenerationOutcome::Success { text, elapsed }
            }
            Ok(Err(err)) => {
                warn!("generation failed: {}", err);
                GenerationOutcome::ProviderError(err.to_string())
            }
            Err(_) => {
                warn!(
                    "generation exceeded {}ms deadline, abandoning call",
                    deadline.as_millis()
                );
                GenerationOutcome::Timeout
            }
        }
    }
}
