pub mod cache;
pub mod clock;
pub mod providers;

pub use cache::{SnapshotCache, DEFAULT_FRESHNESS_WINDOW};
pub use clock::{Clock, SystemClock};
pub use providers::{
    ErApiForexProvider, ForexProvider, IndexProvider, IndexReading, MarketDataError,
    PolygonIndexProvider,
};
