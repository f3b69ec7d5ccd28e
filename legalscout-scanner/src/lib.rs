pub mod config;
pub mod crawler;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod frontier;
pub mod limiter;
pub mod normalize;
pub mod relevance;
pub mod result;
pub mod robots;
pub mod scheduler;
pub mod stats;

pub use config::{CrawlConfig, DEFAULT_USER_AGENT};
pub use crawler::{CrawlOutcome, Crawler, ProgressCallback, ResultCallback};
pub use error::{Result, ScanError};
pub use frontier::{CrawlStrategy, Frontier, FrontierEntry};
pub use normalize::normalize_url;
pub use relevance::{ContentAnalysis, analyze_content, score_url};
pub use result::CrawlResult;
pub use robots::{RobotsChecker, RobotsVerdict};
pub use scheduler::Scope;
pub use stats::{CrawlStats, StatsSnapshot};
