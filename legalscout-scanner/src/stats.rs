use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Counters for one crawl run. Only the crawl loop mutates them; derived
/// figures are computed when read.
#[derive(Debug, Clone)]
pub struct CrawlStats {
    pub total_urls: usize,
    pub crawled_urls: usize,
    pub failed_urls: usize,
    pub legal_docs_found: usize,
    pub start_time: Instant,
    pub started_at: DateTime<Utc>,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self {
            total_urls: 0,
            crawled_urls: 0,
            failed_urls: 0,
            legal_docs_found: 0,
            start_time: Instant::now(),
            started_at: Utc::now(),
        }
    }

    pub fn elapsed_seconds(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }

    /// Successful pages per second since the crawl started.
    pub fn pages_per_second(&self) -> f64 {
        let elapsed = self.elapsed_seconds();
        if elapsed > 0.0 {
            self.crawled_urls as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            total_urls: self.total_urls,
            crawled_urls: self.crawled_urls,
            failed_urls: self.failed_urls,
            legal_docs_found: self.legal_docs_found,
            started_at: self.started_at,
            elapsed_seconds: self.elapsed_seconds(),
            pages_per_second: self.pages_per_second(),
        }
    }
}

impl Default for CrawlStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time, serializable view of [`CrawlStats`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_urls: usize,
    pub crawled_urls: usize,
    pub failed_urls: usize,
    pub legal_docs_found: usize,
    pub started_at: DateTime<Utc>,
    pub elapsed_seconds: f64,
    pub pages_per_second: f64,
}
