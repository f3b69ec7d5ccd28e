//! robots.txt fetching, parsing and allow/deny decisions.
//!
//! Rules are fetched once per origin and cached for the lifetime of the
//! checker. A missing or unreachable robots.txt means "allow everything".

use regex::Regex;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Group names treated as "applies to everyone" when no group names the
/// crawler. Real files sometimes use these instead of `*`.
const WILDCARD_AGENTS: &[&str] = &[
    "*", "all", "any", "bot", "bots", "crawler", "crawlers", "spider", "spiders", "robot",
    "robots", "everyone",
];

/// Longest Crawl-delay honoured, in seconds. Larger values are clamped.
pub const MAX_CRAWL_DELAY_SECS: f64 = 60.0;

/// Rules attached to one `User-agent` group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleGroup {
    pub allow: Vec<String>,
    pub disallow: Vec<String>,
    pub crawl_delay: Option<f64>,
}

/// Parsed robots.txt for one origin.
#[derive(Debug, Clone, PartialEq)]
pub enum RobotsRules {
    /// No robots.txt, or it could not be fetched.
    AllowAll,
    Groups(HashMap<String, RuleGroup>),
}

/// Answer to a robots query, with a reason suitable for logs and results.
#[derive(Debug, Clone, PartialEq)]
pub struct RobotsVerdict {
    pub allowed: bool,
    pub reason: String,
}

impl RobotsVerdict {
    fn allow(reason: impl Into<String>) -> Self {
        Self {
            allowed: true,
            reason: reason.into(),
        }
    }

    fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

#[derive(Clone, Copy)]
enum Directive {
    Allow,
    Disallow,
}

/// Parse a robots.txt body.
///
/// Consecutive `User-agent` lines share the rules that follow them. An
/// indented line that is not itself a directive continues the value of the
/// previous `Allow`/`Disallow` rule, which tolerates soft-wrapped files.
pub fn parse_robots(body: &str) -> RobotsRules {
    let mut groups: HashMap<String, RuleGroup> = HashMap::new();
    let mut current_agents: Vec<String> = Vec::new();
    let mut agents_closed = false;
    let mut last_rule: Option<Directive> = None;

    for raw_line in body.lines() {
        let line = strip_comment(raw_line);
        if line.trim().is_empty() {
            continue;
        }

        let indented = line.starts_with(' ') || line.starts_with('\t');
        let Some((key, value)) = split_directive(line) else {
            if indented && let Some(kind) = last_rule {
                append_to_last_rule(&mut groups, &current_agents, kind, line.trim());
            }
            continue;
        };

        match key.as_str() {
            "user-agent" => {
                if agents_closed {
                    current_agents.clear();
                    agents_closed = false;
                }
                let agent = value.to_lowercase();
                groups.entry(agent.clone()).or_default();
                current_agents.push(agent);
                last_rule = None;
            }
            "allow" | "disallow" => {
                agents_closed = true;
                let kind = if key == "allow" {
                    Directive::Allow
                } else {
                    Directive::Disallow
                };
                for agent in &current_agents {
                    if let Some(group) = groups.get_mut(agent) {
                        match kind {
                            Directive::Allow => group.allow.push(value.clone()),
                            Directive::Disallow => group.disallow.push(value.clone()),
                        }
                    }
                }
                last_rule = if current_agents.is_empty() {
                    None
                } else {
                    Some(kind)
                };
            }
            "crawl-delay" => {
                agents_closed = true;
                last_rule = None;
                if let Ok(delay) = value.parse::<f64>()
                    && delay.is_finite()
                    && delay >= 0.0
                {
                    let delay = if delay > MAX_CRAWL_DELAY_SECS {
                        warn!(
                            "Crawl-delay {} exceeds {}s, clamping",
                            value, MAX_CRAWL_DELAY_SECS
                        );
                        MAX_CRAWL_DELAY_SECS
                    } else {
                        delay
                    };
                    for agent in &current_agents {
                        if let Some(group) = groups.get_mut(agent) {
                            group.crawl_delay = Some(delay);
                        }
                    }
                }
            }
            _ => {
                // Sitemap, Host and friends end a group's agent list too.
                agents_closed = true;
                last_rule = None;
            }
        }
    }

    RobotsRules::Groups(groups)
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn split_directive(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim().to_lowercase();
    let known = matches!(
        key.as_str(),
        "user-agent" | "allow" | "disallow" | "crawl-delay" | "sitemap" | "host" | "request-rate"
    );
    if !known {
        return None;
    }
    Some((key, value.trim().to_string()))
}

fn append_to_last_rule(
    groups: &mut HashMap<String, RuleGroup>,
    agents: &[String],
    kind: Directive,
    fragment: &str,
) {
    for agent in agents {
        let Some(group) = groups.get_mut(agent) else {
            continue;
        };
        let rules = match kind {
            Directive::Allow => &mut group.allow,
            Directive::Disallow => &mut group.disallow,
        };
        if let Some(last) = rules.last_mut() {
            last.push_str(fragment);
        }
    }
}

impl RobotsRules {
    /// Pick the group that applies to `user_agent`.
    ///
    /// Exact name first, then the product token (`legalscout` for
    /// `LegalScout/0.1`), then the first wildcard-like token present.
    pub fn group_for(&self, user_agent: &str) -> Option<(&str, &RuleGroup)> {
        let RobotsRules::Groups(groups) = self else {
            return None;
        };

        let agent = user_agent.trim().to_lowercase();
        let product = agent
            .split(|c: char| c == '/' || c.is_whitespace())
            .next()
            .unwrap_or_default()
            .to_string();

        for candidate in [agent.as_str(), product.as_str()] {
            if candidate.is_empty() {
                continue;
            }
            if let Some((name, group)) = groups.get_key_value(candidate) {
                return Some((name.as_str(), group));
            }
        }

        WILDCARD_AGENTS
            .iter()
            .find_map(|token| groups.get_key_value(*token))
            .map(|(name, group)| (name.as_str(), group))
    }

    /// Decide whether `path` may be fetched by `user_agent`.
    pub fn check(&self, user_agent: &str, path: &str) -> RobotsVerdict {
        if matches!(self, RobotsRules::AllowAll) {
            return RobotsVerdict::allow("no robots.txt restrictions");
        }

        let Some((name, group)) = self.group_for(user_agent) else {
            return RobotsVerdict::allow("no matching user-agent group");
        };

        // A matching Allow wins outright, so it also covers the
        // longer-Allow-beats-Disallow tie-break.
        if let Some(pattern) = group
            .allow
            .iter()
            .find(|p| !p.is_empty() && pattern_matches(p, path))
        {
            return RobotsVerdict::allow(format!("allowed by 'Allow: {}' for '{}'", pattern, name));
        }

        if let Some(pattern) = group
            .disallow
            .iter()
            .find(|p| !p.is_empty() && pattern_matches(p, path))
        {
            return RobotsVerdict::deny(format!(
                "blocked by 'Disallow: {}' for '{}'",
                pattern, name
            ));
        }

        RobotsVerdict::allow(format!("no rule in group '{}' matches", name))
    }

    /// Crawl-delay of the group that applies to `user_agent`, if any.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        self.group_for(user_agent).and_then(|(_, g)| g.crawl_delay)
    }
}

/// Match a robots path pattern against a request path.
///
/// Supports plain prefixes, a trailing `*`, a leading `*` (suffix match),
/// embedded `*` wildcards and a trailing `$` end anchor.
pub fn pattern_matches(pattern: &str, path: &str) -> bool {
    let anchored = pattern.ends_with('$');
    let pattern = pattern.strip_suffix('$').unwrap_or(pattern);

    if !pattern.contains('*') {
        return if anchored {
            path == pattern
        } else {
            path.starts_with(pattern)
        };
    }

    if pattern.matches('*').count() == 1 && !anchored {
        if let Some(prefix) = pattern.strip_suffix('*') {
            return path.starts_with(prefix);
        }
        if let Some(suffix) = pattern.strip_prefix('*') {
            return path.ends_with(suffix);
        }
    }

    wildcard_regex(pattern, anchored)
        .map(|re| re.is_match(path))
        .unwrap_or(false)
}

fn wildcard_regex(pattern: &str, anchored: bool) -> Option<Regex> {
    let body = pattern
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");
    let source = if anchored {
        format!("^{}$", body)
    } else {
        format!("^{}", body)
    };
    Regex::new(&source).ok()
}

/// Fetches and caches robots.txt per origin.
pub struct RobotsChecker {
    client: Client,
    user_agent: String,
    timeout: Duration,
    cache: RwLock<HashMap<String, Arc<RobotsRules>>>,
}

impl RobotsChecker {
    pub fn new(client: Client, user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            user_agent: user_agent.into(),
            timeout,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// May `path` on `origin` be fetched?
    pub async fn can_fetch(&self, origin: &str, path: &str) -> RobotsVerdict {
        let rules = self.rules_for(origin).await;
        let verdict = rules.check(&self.user_agent, path);
        debug!(
            "robots {} {}{}: {}",
            if verdict.allowed { "allow" } else { "deny" },
            origin,
            path,
            verdict.reason
        );
        verdict
    }

    /// Crawl-delay requested for this crawler on `origin`.
    pub async fn crawl_delay(&self, origin: &str) -> Option<Duration> {
        self.rules_for(origin)
            .await
            .crawl_delay(&self.user_agent)
            .and_then(|secs| Duration::try_from_secs_f64(secs.min(MAX_CRAWL_DELAY_SECS)).ok())
    }

    /// Cached rules for an origin, fetching robots.txt on first use.
    ///
    /// Two tasks discovering the same origin at once may both fetch the
    /// file; the second write simply replaces an identical entry.
    pub async fn rules_for(&self, origin: &str) -> Arc<RobotsRules> {
        if let Some(rules) = self.cache.read().await.get(origin) {
            return rules.clone();
        }

        let rules = Arc::new(self.fetch_rules(origin).await);
        self.cache
            .write()
            .await
            .insert(origin.to_string(), rules.clone());
        rules
    }

    async fn fetch_rules(&self, origin: &str) -> RobotsRules {
        let robots_url = format!("{}/robots.txt", origin.trim_end_matches('/'));

        let response = match self
            .client
            .get(&robots_url)
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Could not fetch {}: {} (allowing all)", robots_url, e);
                return RobotsRules::AllowAll;
            }
        };

        if response.status().as_u16() != 200 {
            info!(
                "{} returned {} (allowing all)",
                robots_url,
                response.status().as_u16()
            );
            return RobotsRules::AllowAll;
        }

        match response.text().await {
            Ok(body) => {
                let rules = parse_robots(&body);
                if let RobotsRules::Groups(ref groups) = rules {
                    info!("Loaded {} ({} groups)", robots_url, groups.len());
                }
                rules
            }
            Err(e) => {
                warn!("Could not read {}: {} (allowing all)", robots_url, e);
                RobotsRules::AllowAll
            }
        }
    }
}
