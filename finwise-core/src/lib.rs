pub mod text;
pub mod types;

pub use types::conversation::{ConversationTurn, Role};
pub use types::device::DeviceClass;
pub use types::market_snapshot::{IndexQuote, MarketMover, MarketSnapshot};
