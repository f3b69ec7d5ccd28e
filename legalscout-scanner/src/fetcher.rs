use crate::config::CrawlConfig;
use crate::error::Result;
use crate::extract::{ExtractedPage, extract_html, extract_plain_text};
use crate::limiter::RateLimiter;
use crate::normalize::{host_matches_domain, host_of, origin_of, request_target};
use crate::result::CrawlResult;
use crate::robots::RobotsChecker;
use crate::scheduler::Scope;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Client, ClientBuilder, Response};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

/// Redirect hops followed for one page before giving up.
pub const MAX_REDIRECTS: usize = 5;

/// Rate-limited, robots-aware HTTP fetcher. Never returns an error: every
/// failure becomes an unsuccessful [`CrawlResult`].
///
/// Page redirects are followed by hand so each hop goes through the same
/// robots, rate-limit and scope checks as the first request.
pub struct Fetcher {
    client: Client,
    robots: RobotsChecker,
    limiter: RateLimiter,
    respect_robots_txt: bool,
    robots_exempt_domains: Vec<String>,
    timeout: Duration,
    max_body_bytes: usize,
}

fn client_builder(config: &CrawlConfig, timeout: Duration) -> ClientBuilder {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(timeout)
        .connect_timeout((timeout / 2).max(Duration::from_secs(1)))
        .pool_max_idle_per_host(config.max_concurrent)
        .pool_idle_timeout(Duration::from_secs(90))
        .tcp_keepalive(Duration::from_secs(60))
}

impl Fetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let timeout = config.request_timeout();
        let client = client_builder(config, timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        let robots_client = client_builder(config, timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        let robots = RobotsChecker::new(
            robots_client,
            config.user_agent.clone(),
            config.robots_timeout(),
        );

        Ok(Self {
            client,
            robots,
            limiter: RateLimiter::new(config.request_delay()),
            respect_robots_txt: config.respect_robots_txt,
            robots_exempt_domains: config.robots_exempt_domains.clone(),
            timeout,
            max_body_bytes: config.max_body_bytes,
        })
    }

    pub fn robots(&self) -> &RobotsChecker {
        &self.robots
    }

    fn robots_apply_to(&self, url: &str) -> bool {
        if !self.respect_robots_txt {
            return false;
        }
        match host_of(url) {
            Some(host) => !self
                .robots_exempt_domains
                .iter()
                .any(|d| host_matches_domain(&host, d)),
            None => true,
        }
    }

    /// Fetch one URL and extract its content. Redirects may lead anywhere.
    pub async fn fetch(&self, url: &str, depth: usize) -> CrawlResult {
        self.fetch_page(url, depth, None).await
    }

    /// Like [`Fetcher::fetch`], but a redirect that leaves `scope` (for a
    /// crawl seeded at `seed`) ends the fetch with a failure result.
    pub async fn fetch_within(
        &self,
        url: &str,
        depth: usize,
        scope: &Scope,
        seed: &str,
    ) -> CrawlResult {
        self.fetch_page(url, depth, Some((scope, seed))).await
    }

    /// Robots check and rate-limit slot for one request.
    async fn clear_to_send(&self, url: &str) -> std::result::Result<(), String> {
        let Some(origin) = origin_of(url) else {
            return Err(format!("Invalid URL: {}", url));
        };

        let mut crawl_delay = None;
        if self.robots_apply_to(url) {
            let verdict = self.robots.can_fetch(&origin, &request_target(url)).await;
            if !verdict.allowed {
                debug!("Skipping {}: {}", url, verdict.reason);
                return Err(format!("Blocked by robots.txt: {}", verdict.reason));
            }
            crawl_delay = self.robots.crawl_delay(&origin).await;
        }

        self.limiter.acquire(&origin, crawl_delay).await;
        Ok(())
    }

    async fn fetch_page(
        &self,
        url: &str,
        depth: usize,
        scope: Option<(&Scope, &str)>,
    ) -> CrawlResult {
        let mut current = url.to_string();
        let mut response_time = Duration::ZERO;
        let mut hops = 0;

        let response = loop {
            if let Err(message) = self.clear_to_send(&current).await {
                return CrawlResult::with_error(url.to_string(), depth, message);
            }

            debug!("Fetching {}", current);
            let start = Instant::now();
            let response = match self.client.get(&current).send().await {
                Ok(response) => response,
                Err(e) => {
                    let message = if e.is_timeout() {
                        format!("Request timed out after {}s", self.timeout.as_secs())
                    } else {
                        format!("Request failed: {}", e)
                    };
                    warn!("{}: {}", current, message);
                    return CrawlResult::with_error(url.to_string(), depth, message);
                }
            };
            response_time += start.elapsed();

            if !response.status().is_redirection() {
                break response;
            }

            let next = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|location| redirect_target(&current, location));
            let Some(next) = next else {
                // No usable Location: report the 3xx like any other non-success status.
                break response;
            };

            hops += 1;
            if hops > MAX_REDIRECTS {
                warn!("{}: more than {} redirects", url, MAX_REDIRECTS);
                return CrawlResult::with_error(
                    url.to_string(),
                    depth,
                    format!("Too many redirects (more than {})", MAX_REDIRECTS),
                );
            }
            if let Some((scope, seed)) = scope
                && !scope.admits(&next, seed)
            {
                debug!("{} redirected outside the crawl to {}", current, next);
                return CrawlResult::with_error(
                    url.to_string(),
                    depth,
                    format!("Redirected outside crawl scope: {}", next),
                );
            }

            debug!("{} redirected to {}", current, next);
            current = next;
        };

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let mut result = CrawlResult::new(url.to_string(), depth);
        if current != url {
            result.final_url = Some(current.clone());
        }
        result.http_status = status.as_u16();
        result.content_type = content_type.clone();
        result.response_time = response_time;

        if !status.is_success() {
            result.error = Some(format!("HTTP {}", status.as_u16()));
            debug!("{} returned {}", current, status.as_u16());
            return result;
        }

        let kind = match DocumentKind::from_content_type(content_type.as_deref()) {
            Some(kind) => kind,
            None => {
                result.error = Some(format!(
                    "Unsupported content type: {}",
                    content_type.as_deref().unwrap_or("none")
                ));
                return result;
            }
        };

        let body = match read_body(response, self.max_body_bytes).await {
            Ok(body) => body,
            Err(message) => {
                warn!("{}: {}", current, message);
                result.error = Some(message);
                return result;
            }
        };

        // Relative links resolve against the page that was actually served.
        let page: ExtractedPage = match kind {
            DocumentKind::Html => extract_html(&body, &current),
            DocumentKind::PlainText => extract_plain_text(&body, &current),
        };

        if page.raw_text.trim().is_empty() || page.markdown.trim().is_empty() {
            result.error = Some("Empty document".to_string());
            return result;
        }

        result.title = page.title;
        result.raw_text = page.raw_text;
        result.markdown = page.markdown;
        result.metadata = page.metadata;
        result.discovered_urls = page.links;
        result.success = true;
        result
    }
}

/// Absolute target of a `Location` header. The path is kept as sent so
/// relative links on the target page resolve the way a browser would.
fn redirect_target(current: &str, location: &str) -> Option<String> {
    let location = location.trim();
    if location.is_empty() {
        return None;
    }
    let mut target = Url::parse(current).ok()?.join(location).ok()?;
    target.set_fragment(None);
    Some(target.to_string())
}

/// Read at most `limit` bytes of body. Invalid UTF-8 is replaced rather
/// than rejected.
async fn read_body(mut response: Response, limit: usize) -> std::result::Result<String, String> {
    let too_large = || format!("Response body exceeds {} bytes", limit);

    if let Some(length) = response.content_length()
        && length > limit as u64
    {
        return Err(too_large());
    }

    let mut body = Vec::new();
    loop {
        match response.chunk().await {
            Ok(Some(chunk)) => {
                if body.len() + chunk.len() > limit {
                    return Err(too_large());
                }
                body.extend_from_slice(&chunk);
            }
            Ok(None) => break,
            Err(e) if e.is_timeout() => return Err("Timed out reading body".to_string()),
            Err(e) => return Err(format!("Failed to read body: {}", e)),
        }
    }

    Ok(String::from_utf8_lossy(&body).into_owned())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocumentKind {
    Html,
    PlainText,
}

impl DocumentKind {
    fn from_content_type(content_type: Option<&str>) -> Option<Self> {
        let media_type = content_type?
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match media_type.as_str() {
            "text/html" => Some(DocumentKind::Html),
            "text/plain" => Some(DocumentKind::PlainText),
            _ => None,
        }
    }
}
