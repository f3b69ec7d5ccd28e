use crate::config::CrawlConfig;
use crate::error::{Result, ScanError};
use crate::fetcher::Fetcher;
use crate::frontier::FrontierEntry;
use crate::normalize::{host_matches_domain, normalize_url};
use crate::relevance::analyze_content;
use crate::result::{CrawlResult, sort_by_legal_score};
use crate::robots::RobotsChecker;
use crate::scheduler::Scheduler;
use crate::stats::{CrawlStats, StatsSnapshot};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use url::Url;

/// Called once per URL as it is dispatched, with the number of pages
/// attempted so far (including the one being dispatched).
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;
/// Called once per finished result, after scoring.
pub type ResultCallback = Arc<dyn Fn(&CrawlResult) + Send + Sync>;

/// Everything one crawl produced.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlOutcome {
    pub seed: String,
    /// Sorted by `legal_score`, highest first.
    pub results: Vec<CrawlResult>,
    pub stats: StatsSnapshot,
}

impl CrawlOutcome {
    pub fn legal_documents(&self) -> impl Iterator<Item = &CrawlResult> {
        self.results.iter().filter(|r| r.success && r.is_legal)
    }
}

/// One crawler session. Robots rules and rate-limit slots are shared by
/// every crawl run on the same `Crawler`; the frontier and dedup sets are
/// rebuilt per run.
pub struct Crawler {
    config: CrawlConfig,
    fetcher: Arc<Fetcher>,
    progress_callback: Option<ProgressCallback>,
    result_callback: Option<ResultCallback>,
}

impl Crawler {
    pub fn new(config: CrawlConfig) -> Result<Self> {
        config.validate()?;
        let fetcher = Fetcher::new(&config)?;
        Ok(Self {
            config,
            fetcher: Arc::new(fetcher),
            progress_callback: None,
            result_callback: None,
        })
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn with_result_callback(mut self, callback: ResultCallback) -> Self {
        self.result_callback = Some(callback);
        self
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub fn robots(&self) -> &RobotsChecker {
        self.fetcher.robots()
    }

    pub async fn crawl(&self, seed_url: &str) -> Result<CrawlOutcome> {
        let seed = self.validate_seed(seed_url)?;
        info!(
            "Starting {} crawl of {} (max depth {}, max pages {}, {} concurrent)",
            self.config.strategy,
            seed,
            self.config.max_depth,
            self.config.max_pages,
            self.config.max_concurrent
        );

        let mut scheduler = Scheduler::new(&self.config);
        if !scheduler.seed(&seed) {
            return Err(ScanError::InvalidUrl(format!(
                "{} is excluded by the crawl rules",
                seed
            )));
        }

        let mut stats = CrawlStats::new();
        let mut results = Vec::new();
        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent));
        let scope = Arc::new(scheduler.scope().clone());
        let shared_seed: Arc<str> = Arc::from(seed.as_str());

        while scheduler.attempted() < self.config.max_pages && scheduler.has_pending() {
            let remaining = self.config.max_pages - scheduler.attempted();
            let batch = scheduler.next_batch(self.config.max_concurrent.min(remaining));
            debug!(
                "Dispatching batch of {} ({} pending)",
                batch.len(),
                scheduler.pending_count()
            );

            if let Some(ref callback) = self.progress_callback {
                let already = scheduler.attempted() - batch.len();
                for (i, entry) in batch.iter().enumerate() {
                    callback(already + i + 1, entry.url.clone());
                }
            }

            let handles: Vec<_> = batch
                .iter()
                .map(|entry| {
                    let fetcher = self.fetcher.clone();
                    let semaphore = semaphore.clone();
                    let scope = scope.clone();
                    let seed = shared_seed.clone();
                    let url = entry.url.clone();
                    let depth = entry.depth;
                    tokio::spawn(async move {
                        let _permit = semaphore.acquire_owned().await.ok();
                        fetcher.fetch_within(&url, depth, &scope, &seed).await
                    })
                })
                .collect();

            let fetched = join_all(handles).await;

            for (entry, joined) in batch.into_iter().zip(fetched) {
                let result = match joined {
                    Ok(result) => result,
                    Err(e) => {
                        warn!("Fetch task for {} failed: {}", entry.url, e);
                        CrawlResult::with_error(
                            entry.url.clone(),
                            entry.depth,
                            format!("Fetch task failed: {}", ScanError::from(e)),
                        )
                    }
                };
                let result = self.ingest(&mut scheduler, &mut stats, &seed, &entry, result);
                if let Some(ref callback) = self.result_callback {
                    callback(&result);
                }
                results.push(result);
            }

            stats.total_urls = scheduler.enqueued_total();
        }

        sort_by_legal_score(&mut results);

        info!(
            "Crawl of {} complete: {} crawled, {} failed, {} legal documents in {:.1}s",
            seed,
            stats.crawled_urls,
            stats.failed_urls,
            stats.legal_docs_found,
            stats.elapsed_seconds()
        );

        Ok(CrawlOutcome {
            seed,
            results,
            stats: stats.snapshot(),
        })
    }

    /// Score a finished fetch, update the sets and stats, and feed its links
    /// back into the frontier.
    fn ingest(
        &self,
        scheduler: &mut Scheduler,
        stats: &mut CrawlStats,
        seed: &str,
        entry: &FrontierEntry,
        result: CrawlResult,
    ) -> CrawlResult {
        if let Some(final_url) = &result.final_url {
            scheduler.record_alias(final_url);
        }

        let result = if result.success {
            let analysis = analyze_content(&result.raw_text, &result.title, &result.metadata);
            let result = result.with_analysis(analysis);
            stats.crawled_urls += 1;
            if result.is_legal {
                stats.legal_docs_found += 1;
                info!("Legal document: {} ({:.1})", result.url, result.legal_score);
            }

            if entry.depth < self.config.max_depth {
                let admitted = result
                    .discovered_urls
                    .iter()
                    .filter(|url| scheduler.enqueue(url, seed, entry.depth + 1))
                    .count();
                debug!(
                    "{}: {} links, {} admitted",
                    result.url,
                    result.discovered_urls.len(),
                    admitted
                );
            }
            result
        } else {
            scheduler.mark_failed(&entry.url);
            stats.failed_urls += 1;
            debug!(
                "{} failed: {}",
                result.url,
                result.error.as_deref().unwrap_or("unknown error")
            );
            result
        };

        if entry.depth == 0 && self.config.guess_legal_paths {
            scheduler.inject_legal_paths(seed);
        }

        result
    }

    fn validate_seed(&self, seed_url: &str) -> Result<String> {
        let trimmed = seed_url.trim();
        if trimmed.is_empty() {
            return Err(ScanError::InvalidUrl("Seed URL is empty".to_string()));
        }

        let parsed = Url::parse(trimmed)
            .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", trimmed, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScanError::InvalidUrl(format!(
                "{}: only http and https are supported",
                trimmed
            )));
        }
        let Some(host) = parsed.host_str() else {
            return Err(ScanError::InvalidUrl(format!("{}: missing host", trimmed)));
        };

        if let Some(domains) = &self.config.allowed_domains
            && !domains.iter().any(|d| host_matches_domain(host, d))
        {
            return Err(ScanError::InvalidConfig(format!(
                "Seed host {} is not in the allowed domains ({})",
                host,
                domains.join(", ")
            )));
        }

        Ok(normalize_url(trimmed))
    }
}
