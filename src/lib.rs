pub mod core;
pub mod scraping;
pub mod store;
pub mod tools;

// --- Primary core exports ---
pub use self::core::config::{RenderingBackend, WatchConfig};
pub use self::core::error::{RecordError, ScrapeError};
pub use self::core::prize::classify;
pub use self::core::types::{DrawRecord, MatchResult, PrizeTier, UserPick};
pub use self::scraping::merge::{merge_records, merge_sources};
pub use self::scraping::retriever::{RetrievalMode, Retriever};
pub use self::scraping::scrape::Scraper;
pub use self::store::Store;
