use crate::error::{Result, ScanError};
use crate::frontier::CrawlStrategy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_USER_AGENT: &str = "LegalScout/0.1";

/// Upper bound for `delay_between_requests`, in seconds.
pub const MAX_REQUEST_DELAY_SECS: f64 = 3600.0;

pub const DEFAULT_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// Settings for one crawl run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    pub max_depth: usize,
    pub max_pages: usize,
    pub max_concurrent: usize,
    /// Minimum seconds between the starts of two requests to one origin.
    pub delay_between_requests: f64,
    pub timeout_seconds: u64,
    /// When set, only these domains (and their subdomains) are crawled.
    pub allowed_domains: Option<Vec<String>>,
    pub respect_robots_txt: bool,
    pub user_agent: String,
    pub follow_external_links: bool,
    pub strategy: CrawlStrategy,
    pub robots_timeout_seconds: u64,
    /// Domains whose robots.txt is not consulted.
    pub robots_exempt_domains: Vec<String>,
    /// Inject well-known legal paths after the seed page.
    pub guess_legal_paths: bool,
    /// Response bodies larger than this are abandoned.
    pub max_body_bytes: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_pages: 50,
            max_concurrent: 5,
            delay_between_requests: 1.0,
            timeout_seconds: 30,
            allowed_domains: None,
            respect_robots_txt: true,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            follow_external_links: false,
            strategy: CrawlStrategy::Bfs,
            robots_timeout_seconds: 10,
            robots_exempt_domains: Vec::new(),
            guess_legal_paths: true,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl CrawlConfig {
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_pages(mut self, pages: usize) -> Self {
        self.max_pages = pages;
        self
    }

    pub fn with_max_concurrent(mut self, concurrent: usize) -> Self {
        self.max_concurrent = concurrent;
        self
    }

    pub fn with_delay(mut self, seconds: f64) -> Self {
        self.delay_between_requests = seconds;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_allowed_domains(mut self, domains: Vec<String>) -> Self {
        self.allowed_domains = Some(domains);
        self
    }

    pub fn with_respect_robots(mut self, respect: bool) -> Self {
        self.respect_robots_txt = respect;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn with_follow_external(mut self, follow: bool) -> Self {
        self.follow_external_links = follow;
        self
    }

    pub fn with_strategy(mut self, strategy: CrawlStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_guess_legal_paths(mut self, guess: bool) -> Self {
        self.guess_legal_paths = guess;
        self
    }

    pub fn with_max_body_bytes(mut self, bytes: usize) -> Self {
        self.max_body_bytes = bytes;
        self
    }

    pub fn request_delay(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay_between_requests.min(MAX_REQUEST_DELAY_SECS))
            .unwrap_or(Duration::ZERO)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn robots_timeout(&self) -> Duration {
        Duration::from_secs(self.robots_timeout_seconds)
    }

    /// Reject settings the crawl loop cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_pages == 0 {
            return Err(invalid("max_pages must be at least 1"));
        }
        if self.max_concurrent == 0 {
            return Err(invalid("max_concurrent must be at least 1"));
        }
        if self.timeout_seconds == 0 {
            return Err(invalid("timeout_seconds must be at least 1"));
        }
        if self.robots_timeout_seconds == 0 {
            return Err(invalid("robots_timeout_seconds must be at least 1"));
        }
        if !self.delay_between_requests.is_finite() || self.delay_between_requests < 0.0 {
            return Err(invalid("delay_between_requests must be a non-negative number"));
        }
        if self.delay_between_requests > MAX_REQUEST_DELAY_SECS {
            return Err(invalid("delay_between_requests must be at most 3600 seconds"));
        }
        if self.max_body_bytes == 0 {
            return Err(invalid("max_body_bytes must be at least 1"));
        }
        if self.user_agent.trim().is_empty() {
            return Err(invalid("user_agent must not be empty"));
        }
        if let Some(domains) = &self.allowed_domains
            && domains.iter().any(|d| d.trim().is_empty())
        {
            return Err(invalid("allowed_domains must not contain empty entries"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> ScanError {
    ScanError::InvalidConfig(msg.to_string())
}
