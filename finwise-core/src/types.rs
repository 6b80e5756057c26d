pub mod conversation;
pub mod device;
pub mod market_snapshot;

// Re-export common types
pub use conversation::{ConversationTurn, Role};
pub use device::DeviceClass;
pub use market_snapshot::{IndexQuote, MarketMover, MarketSnapshot};

/// Timestamp carrying the market's home zone offset (IST)
pub type IstTimestamp = chrono::DateTime<chrono::FixedOffset>;

/// Exchange ticker symbol (e.g., "RELIANCE.NS", "TCS.NS")
pub type TickerSymbol = String;
