use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use finwise_advisor::{GenerationGateway, GenerationOutcome, PromptAssembler, ADVISOR_PERSONA};
use finwise_core::{ConversationTurn, DeviceClass};
use finwise_market_data::SnapshotCache;

use crate::error::ApiError;

/// Generated reply plus the metadata delivery needs.
#[derive(Debug)]
pub struct ChatReply {
    pub text: String,
    pub elapsed: Duration,
    pub device: DeviceClass,
}

/// The request pipeline both chat endpoints share: market data, prompt
/// assembly, then one bounded generation attempt.
pub struct ChatPipeline {
    cache: Arc<SnapshotCache>,
    gateway: Arc<GenerationGateway>,
}

impl ChatPipeline {
    pub fn new(cache: Arc<SnapshotCache>, gateway: Arc<GenerationGateway>) -> Self {
        Self { cache, gateway }
    }

    /// Run one query through the pipeline.
    ///
    /// An empty query is rejected up front, before the market-data fetch
    /// and before anything reaches the LLM provider.
    pub async fn respond(
        &self,
        query: &str,
        history: &[ConversationTurn],
        device: DeviceClass,
    ) -> Result<ChatReply, ApiError> {
        if query.trim().is_empty() {
            return Err(ApiError::MalformedRequest(
                "chat message is empty".to_string(),
            ));
        }

        let pipeline_start = Instant::now();

        let snapshot = self.cache.fetch().await;
        let market_elapsed = pipeline_start.elapsed();

        let prompt = PromptAssembler::render(ADVISOR_PERSONA, &snapshot, history, query, device);
        debug!(
            "prompt assembled: {} chars, {} history turns",
            prompt.chars().count(),
            history.len()
        );

        let outcome = self
            .gateway
            .generate(&prompt, device.generation_deadline())
            .await;

        match outcome {
            GenerationOutcome::Success { text, elapsed } => {
                info!(
                    "chat completed: device={:?}, market_data={}ms, generation={}ms, reply={} chars",
                    device,
                    market_elapsed.as_millis(),
                    elapsed.as_millis(),
                    text.chars().count()
                );
                Ok(ChatReply {
                    text,
                    elapsed,
                    device,
                })
            }
            GenerationOutcome::Timeout => Err(ApiError::GenerationTimeout),
            GenerationOutcome::ProviderError(message) => Err(ApiError::GenerationFailed(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use finwise_advisor::TextCompletion;
    use finwise_market_data::{
        Clock, ForexProvider, IndexProvider, IndexReading, MarketDataError, SystemClock,
    };

    struct CountingIndexProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl IndexProvider for CountingIndexProvider {
        async fn prev_session(&self, _ticker: &str) -> Result<IndexReading, MarketDataError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(IndexReading {
                value: 22000.0,
                percent_change: 0.67,
            })
        }
    }

    struct StaticForexProvider;

    #[async_trait]
    impl ForexProvider for StaticForexProvider {
        async fn usd_inr(&self) -> Result<f64, MarketDataError> {
            Ok(83.2)
        }
    }

    struct CountingCompletion {
        calls: AtomicUsize,
        reply: Result<&'static str, &'static str>,
    }

    #[async_trait]
    impl TextCompletion for CountingCompletion {
        async fn complete(&self, _prompt: &str) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.reply {
                Ok(text) => Ok(text.to_string()),
                Err(message) => Err(anyhow!(message)),
            }
        }
    }

    fn pipeline_with(
        index: Arc<CountingIndexProvider>,
        completion: Arc<CountingCompletion>,
    ) -> ChatPipeline {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cache = Arc::new(SnapshotCache::new(
            index,
            Arc::new(StaticForexProvider),
            clock,
            Duration::from_secs(300),
        ));
        ChatPipeline::new(cache, Arc::new(GenerationGateway::new(completion)))
    }

    #[tokio::test]
    async fn test_empty_query_rejected_before_any_upstream_call() {
        let index = Arc::new(CountingIndexProvider {
            calls: AtomicUsize::new(0),
        });
        let completion = Arc::new(CountingCompletion {
            calls: AtomicUsize::new(0),
            reply: Ok("unused"),
        });
        let pipeline = pipeline_with(index.clone(), completion.clone());

        let result = pipeline.respond("   ", &[], DeviceClass::Desktop).await;

        assert!(matches!(result, Err(ApiError::MalformedRequest(_))));
        assert_eq!(index.calls.load(Ordering::SeqCst), 0);
        assert_eq!(completion.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_carries_device_and_elapsed() {
        let index = Arc::new(CountingIndexProvider {
            calls: AtomicUsize::new(0),
        });
        let completion = Arc::new(CountingCompletion {
            calls: AtomicUsize::new(0),
            reply: Ok("Advice text"),
        });
        let pipeline = pipeline_with(index, completion);

        let reply = pipeline
            .respond("What should I invest in?", &[], DeviceClass::Desktop)
            .await
            .unwrap();

        assert_eq!(reply.text, "Advice text");
        assert_eq!(reply.device, DeviceClass::Desktop);
        assert!(reply.elapsed <= Duration::from_secs(25));
    }

    #[tokio::test]
    async fn test_provider_failure_maps_to_generation_failed() {
        let index = Arc::new(CountingIndexProvider {
            calls: AtomicUsize::new(0),
        });
        let completion = Arc::new(CountingCompletion {
            calls: AtomicUsize::new(0),
            reply: Err("upstream quota exhausted"),
        });
        let pipeline = pipeline_with(index, completion.clone());

        let result = pipeline.respond("Hi", &[], DeviceClass::Mobile).await;

        match result {
            Err(ApiError::GenerationFailed(message)) => {
                assert!(message.contains("upstream quota exhausted"));
            }
            other => panic!("expected generation failure, got {:?}", other.err()),
        }
        // One attempt only, no retry.
        assert_eq!(completion.calls.load(Ordering::SeqCst), 1);
    }
}
