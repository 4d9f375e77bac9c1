pub mod error;
pub mod journal;
pub mod news;
pub mod performance;
pub mod research;
pub mod sources;
pub mod summary;

pub use error::ContextError;
pub use journal::{TradeJournal, TradeRecord, TradeStatus};
pub use news::{FileNews, RssNews, StaticNews};
pub use performance::PerformanceMemory;
pub use research::ResearchLoader;
pub use sources::{MacroSource, NewsFeed, PerformanceSource, TechnicalSummarizer};
pub use summary::SnapshotSummarizer;
