use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{IstTimestamp, TickerSymbol};

/// IST offset from UTC in seconds (+05:30)
pub const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// The IST timezone offset used for capture timestamps.
pub fn ist_offset() -> chrono::FixedOffset {
    chrono::FixedOffset::east_opt(IST_OFFSET_SECS).expect("IST offset is in range")
}

/// Quote for one market index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexQuote {
    /// Display name used when rendering the snapshot ("Nifty 50", "Sensex")
    pub label: String,
    /// Last closing value
    pub value: f64,
    /// Percent change over the previous session
    pub percent_change: f64,
}

/// One entry in the top gainers/losers lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketMover {
    pub symbol: TickerSymbol,
    pub change_percent: f64,
}

/// Market snapshot capturing the indicator set the advisor is briefed with:
/// index quotes, top movers, and the USD/INR rate, all from one capture.
///
/// A snapshot is immutable once built. Refreshing produces a whole new value
/// that replaces the previous one; fields are never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketSnapshot {
    /// Index quotes keyed by short name ("nifty50", "sensex"). Iteration
    /// order is the key order, which keeps rendered output stable.
    pub indices: BTreeMap<String, IndexQuote>,
    pub top_gainers: Vec<MarketMover>,
    pub top_losers: Vec<MarketMover>,
    /// USD to INR conversion rate
    pub usd_inr: f64,
    /// When this snapshot was captured, in IST
    pub captured_at: IstTimestamp,
}

impl MarketSnapshot {
    /// Capture time formatted the way clients and prompts show it.
    pub fn display_timestamp(&self) -> String {
        self.captured_at.format("%Y-%m-%d %H:%M:%S IST").to_string()
    }

    pub fn index(&self, key: &str) -> Option<&IndexQuote> {
        self.indices.get(key)
    }
}
