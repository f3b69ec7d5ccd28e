//! Admission gate, dedup sets and seeding on top of a [`Frontier`].
//!
//! A URL lives in at most one of `pending`, `visited` and `failed`. Once it
//! has entered any of them it is never admitted again, so the depth recorded
//! at first discovery is final.

use crate::config::CrawlConfig;
use crate::frontier::{Frontier, FrontierEntry, frontier_for};
use crate::normalize::{host_matches_domain, host_of, normalize_url, origin_of};
use regex::RegexSet;
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::{debug, trace};
use url::Url;

/// Paths tried against the seed origin because legal pages are often not
/// linked from the homepage.
pub const LEGAL_SEED_PATHS: &[&str] = &[
    "/privacy",
    "/privacy-policy",
    "/privacy-notice",
    "/privacy/policy",
    "/legal",
    "/legal/privacy",
    "/legal/privacy-policy",
    "/legal/terms",
    "/legal/cookies",
    "/terms",
    "/terms-of-service",
    "/terms-of-use",
    "/terms-and-conditions",
    "/tos",
    "/cookies",
    "/cookie-policy",
    "/gdpr",
    "/dpa",
    "/data-processing-addendum",
    "/company/privacy",
    "/company/legal",
    "/about/privacy",
    "/policies",
    "/policies/privacy",
];

static SKIP_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)\.(?:pdf|jpe?g|png|gif|svg|webp|bmp|ico|css|js|mjs|map|zip|gz|tgz|tar|rar|7z|exe|dmg|msi|apk|mp3|mp4|m4a|wav|avi|mov|webm|woff2?|ttf|otf|eot|xml|json|rss|atom)(?:[?#]|$)",
        r"(?i)^(?:mailto|tel|javascript|data|ftp):",
        r"^#",
        r"/api/",
        r"/search\?",
    ])
    .unwrap_or_else(|_| RegexSet::empty())
});

/// True for URLs the crawler never fetches: binary assets, non-web
/// schemes, anchor-only links, API endpoints and site search.
pub fn is_skipped(url: &str) -> bool {
    SKIP_PATTERNS.is_match(url)
}

/// Well-known legal paths resolved against the seed's origin.
pub fn legal_path_candidates(seed_url: &str) -> Vec<String> {
    let Some(origin) = origin_of(seed_url) else {
        return Vec::new();
    };
    LEGAL_SEED_PATHS
        .iter()
        .map(|path| normalize_url(&format!("{}{}", origin, path)))
        .collect()
}

/// Which hosts a crawl may touch. Shared with the fetcher so redirect
/// targets pass the same host checks as discovered links.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    allowed_domains: Option<Vec<String>>,
    follow_external_links: bool,
}

impl Scope {
    pub fn new(config: &CrawlConfig) -> Self {
        Self {
            allowed_domains: config.allowed_domains.clone(),
            follow_external_links: config.follow_external_links,
        }
    }

    /// Scheme, skip-pattern and host checks for `url` in a crawl seeded
    /// at `base_url`.
    pub fn admits(&self, url: &str, base_url: &str) -> bool {
        if is_skipped(url) {
            trace!("reject {} (skip pattern)", url);
            return false;
        }

        let Ok(parsed) = Url::parse(url) else {
            trace!("reject {} (unparseable)", url);
            return false;
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return false;
        }
        let Some(host) = parsed.host_str() else {
            return false;
        };

        if let Some(domains) = &self.allowed_domains
            && !domains.iter().any(|d| host_matches_domain(host, d))
        {
            trace!("reject {} (outside allowed domains)", url);
            return false;
        }

        if !self.follow_external_links && !same_site(host, base_url) {
            trace!("reject {} (external)", url);
            return false;
        }

        true
    }
}

pub struct Scheduler {
    frontier: Box<dyn Frontier>,
    pending: HashSet<String>,
    visited: HashSet<String>,
    failed: HashSet<String>,
    /// Redirect targets already fetched under another URL.
    aliases: HashSet<String>,
    max_depth: usize,
    scope: Scope,
    enqueued: usize,
}

impl Scheduler {
    pub fn new(config: &CrawlConfig) -> Self {
        Self {
            frontier: frontier_for(config.strategy),
            pending: HashSet::new(),
            visited: HashSet::new(),
            failed: HashSet::new(),
            aliases: HashSet::new(),
            max_depth: config.max_depth,
            scope: Scope::new(config),
            enqueued: 0,
        }
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Admission gate shared by every discipline. `url` must already be
    /// normalized; `base_url` is the crawl's seed.
    pub fn should_crawl(&self, url: &str, base_url: &str, depth: usize) -> bool {
        if depth > self.max_depth {
            trace!("reject {} (depth {} > {})", url, depth, self.max_depth);
            return false;
        }

        if self.pending.contains(url)
            || self.visited.contains(url)
            || self.failed.contains(url)
            || self.aliases.contains(url)
        {
            return false;
        }

        self.scope.admits(url, base_url)
    }

    /// Normalize, gate and push. Returns whether the URL was admitted.
    pub fn enqueue(&mut self, url: &str, base_url: &str, depth: usize) -> bool {
        let url = normalize_url(url);
        if !self.should_crawl(&url, base_url, depth) {
            return false;
        }
        self.pending.insert(url.clone());
        self.frontier.push(url, depth);
        self.enqueued += 1;
        true
    }

    /// Queue the crawl's starting URL at depth 0.
    pub fn seed(&mut self, seed_url: &str) -> bool {
        self.enqueue(seed_url, seed_url, 0)
    }

    /// Inject [`LEGAL_SEED_PATHS`] at depth 1. Paths already discovered on
    /// the seed page are skipped by the admission gate.
    pub fn inject_legal_paths(&mut self, seed_url: &str) -> usize {
        let injected = legal_path_candidates(seed_url)
            .into_iter()
            .filter(|candidate| self.enqueue(candidate, seed_url, 1))
            .count();
        debug!("Injected {} well-known legal paths for {}", injected, seed_url);
        injected
    }

    /// Pop up to `limit` entries and mark them visited before dispatch.
    pub fn next_batch(&mut self, limit: usize) -> Vec<FrontierEntry> {
        let mut batch = Vec::with_capacity(limit.min(self.frontier.len()));
        while batch.len() < limit {
            let Some(entry) = self.frontier.pop() else {
                break;
            };
            self.pending.remove(&entry.url);
            self.visited.insert(entry.url.clone());
            batch.push(entry);
        }
        batch
    }

    /// Remember the URL a redirect landed on so it is not fetched again.
    pub fn record_alias(&mut self, url: &str) {
        let url = normalize_url(url);
        if !self.visited.contains(&url) && !self.failed.contains(&url) {
            self.aliases.insert(url);
        }
    }

    /// Move a dispatched URL from `visited` to `failed`.
    pub fn mark_failed(&mut self, url: &str) {
        self.visited.remove(url);
        self.failed.insert(url.to_string());
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    pub fn is_failed(&self, url: &str) -> bool {
        self.failed.contains(url)
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Pages dispatched so far, successful or not. Counts against the page budget.
    pub fn attempted(&self) -> usize {
        self.visited.len() + self.failed.len()
    }

    pub fn pending_count(&self) -> usize {
        self.frontier.len()
    }

    pub fn has_pending(&self) -> bool {
        !self.frontier.is_empty()
    }

    /// Total URLs ever admitted to the frontier.
    pub fn enqueued_total(&self) -> usize {
        self.enqueued
    }
}

/// `host` is the seed's host or one of its subdomains. A leading `www.`
/// on the seed is dropped first, so `www.example.com` covers `example.com`.
fn same_site(host: &str, base_url: &str) -> bool {
    let Some(base) = host_of(base_url) else {
        return false;
    };
    let site = base.strip_prefix("www.").unwrap_or(&base);
    host_matches_domain(host, site)
}
