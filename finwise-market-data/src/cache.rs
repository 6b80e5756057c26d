use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use finwise_core::types::market_snapshot::ist_offset;
use finwise_core::{IndexQuote, MarketMover, MarketSnapshot};

use crate::clock::Clock;
use crate::providers::{ForexProvider, IndexProvider};

/// A cached snapshot older than this is stale and gets refetched.
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_secs(300);

/// USD/INR rate served when the forex provider is down.
const USD_INR_FALLBACK: f64 = 83.2;

struct IndexSpec {
    key: &'static str,
    label: &'static str,
    ticker: &'static str,
    fallback_value: f64,
    fallback_percent: f64,
}

static TRACKED_INDICES: [IndexSpec; 2] = [
    IndexSpec {
        key: "nifty50",
        label: "Nifty 50",
        ticker: "NSEI",
        fallback_value: 22000.0,
        fallback_percent: 0.67,
    },
    IndexSpec {
        key: "sensex",
        label: "Sensex",
        ticker: "SENSEX",
        fallback_value: 72500.0,
        fallback_percent: 0.58,
    },
];

// Mover lists are static pending a dedicated gainers/losers feed.
fn static_top_gainers() -> Vec<MarketMover> {
    vec![
        MarketMover {
            symbol: "RELIANCE.NS".to_string(),
            change_percent: 2.45,
        },
        MarketMover {
            symbol: "TCS.NS".to_string(),
            change_percent: 1.78,
        },
        MarketMover {
            symbol: "HDFCBANK.NS".to_string(),
            change_percent: 1.65,
        },
    ]
}

fn static_top_losers() -> Vec<MarketMover> {
    vec![
        MarketMover {
            symbol: "INFY.NS".to_string(),
            change_percent: -1.23,
        },
        MarketMover {
            symbol: "ICICIBANK.NS".to_string(),
            change_percent: -0.89,
        },
        MarketMover {
            symbol: "AXISBANK.NS".to_string(),
            change_percent: -0.72,
        },
    ]
}

struct CacheEntry {
    snapshot: Arc<MarketSnapshot>,
    fetched_at: DateTime<Utc>,
}

/// Single-slot, time-bounded cache in front of the market-data providers.
///
/// `fetch` serves the cached snapshot while it is younger than the
/// freshness window, so upstream calls happen at most once per window
/// however many requests arrive. Provider failures degrade per field to
/// fixed fallback values; the call itself never fails.
pub struct SnapshotCache {
    index_provider: Arc<dyn IndexProvider>,
    forex_provider: Arc<dyn ForexProvider>,
    clock: Arc<dyn Clock>,
    freshness_window: Duration,
    slot: RwLock<Option<CacheEntry>>,
}

impl SnapshotCache {
    pub fn new(
        index_provider: Arc<dyn IndexProvider>,
        forex_provider: Arc<dyn ForexProvider>,
        clock: Arc<dyn Clock>,
        freshness_window: Duration,
    ) -> Self {
        Self {
            index_provider,
            forex_provider,
            clock,
            freshness_window,
            slot: RwLock::new(None),
        }
    }

    /// Return the current snapshot, refreshing it first if stale or absent.
    ///
    /// Concurrent callers that all miss may each refresh independently;
    /// the last writer wins and later reads see one coherent snapshot.
    /// Readers never observe a partially built entry because the new
    /// snapshot is assembled off to the side and swapped in whole.
    pub async fn fetch(&self) -> Arc<MarketSnapshot> {
        let now = self.clock.now_utc();

        {
            let slot = self.slot.read().await;
            if let Some(entry) = slot.as_ref() {
                let age = now.signed_duration_since(entry.fetched_at);
                let fresh = age
                    .to_std()
                    .map_or(false, |age| age < self.freshness_window);
                if fresh {
                    debug!(
                        "serving cached market snapshot, age {}s",
                        age.num_seconds()
                    );
                    return Arc::clone(&entry.snapshot);
                }
            }
        }

        let snapshot = Arc::new(self.fetch_fresh(now).await);
        let mut slot = self.slot.write().await;
        *slot = Some(CacheEntry {
            snapshot: Arc::clone(&snapshot),
            fetched_at: now,
        });
        snapshot
    }

    async fn fetch_fresh(&self, now: DateTime<Utc>) -> MarketSnapshot {
        debug!("refreshing market snapshot from providers");

        let index_provider = &self.index_provider;
        let index_calls = TRACKED_INDICES
            .iter()
            .map(|spec| async move { (spec, index_provider.prev_session(spec.ticker).await) });
        let (index_results, forex_result) =
            tokio::join!(join_all(index_calls), self.forex_provider.usd_inr());

        let mut indices = BTreeMap::new();
        for (spec, result) in index_results {
            let quote = match result {
                Ok(reading) => IndexQuote {
                    label: spec.label.to_string(),
                    value: reading.value,
                    percent_change: reading.percent_change,
                },
                Err(err) => {
                    warn!("{} quote fetch failed: {}, using fallback", spec.key, err);
                    IndexQuote {
                        label: spec.label.to_string(),
                        value: spec.fallback_value,
                        percent_change: spec.fallback_percent,
                    }
                }
            };
            indices.insert(spec.key.to_string(), quote);
        }

        let usd_inr = match forex_result {
            Ok(rate) => rate,
            Err(err) => {
                warn!("USD/INR fetch failed: {}, using fallback", err);
                USD_INR_FALLBACK
            }
        };

        MarketSnapshot {
            indices,
            top_gainers: static_top_gainers(),
            top_losers: static_top_losers(),
            usd_inr,
            captured_at: now.with_timezone(&ist_offset()),
        }
    }
}
