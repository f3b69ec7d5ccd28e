//! Pending-URL containers for the three crawl disciplines.

use crate::error::ScanError;
use crate::relevance::score_url;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::fmt;
use std::str::FromStr;

/// A URL waiting to be crawled and its distance from the seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: String,
    pub depth: usize,
}

impl FrontierEntry {
    pub fn new(url: impl Into<String>, depth: usize) -> Self {
        Self {
            url: url.into(),
            depth,
        }
    }
}

/// Order in which pending URLs are expanded. Fixed for a crawl run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlStrategy {
    /// FIFO queue; visits shallow pages first.
    #[default]
    Bfs,
    /// LIFO stack; follows one chain of links before backtracking.
    Dfs,
    /// Highest [`score_url`] first, regardless of depth.
    BestFirst,
}

impl CrawlStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrawlStrategy::Bfs => "bfs",
            CrawlStrategy::Dfs => "dfs",
            CrawlStrategy::BestFirst => "best_first",
        }
    }
}

impl fmt::Display for CrawlStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CrawlStrategy {
    type Err = ScanError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bfs" | "breadth_first" | "breadth-first" => Ok(CrawlStrategy::Bfs),
            "dfs" | "depth_first" | "depth-first" => Ok(CrawlStrategy::Dfs),
            "best_first" | "best-first" | "bestfirst" => Ok(CrawlStrategy::BestFirst),
            other => Err(ScanError::InvalidStrategy(other.to_string())),
        }
    }
}

/// Storage for pending entries. Deduplication is the scheduler's job.
pub trait Frontier: Send {
    fn push(&mut self, url: String, depth: usize);
    fn pop(&mut self) -> Option<FrontierEntry>;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Build the frontier for a strategy.
pub fn frontier_for(strategy: CrawlStrategy) -> Box<dyn Frontier> {
    match strategy {
        CrawlStrategy::Bfs => Box::new(QueueFrontier::default()),
        CrawlStrategy::Dfs => Box::new(StackFrontier::default()),
        CrawlStrategy::BestFirst => Box::new(PriorityFrontier::default()),
    }
}

#[derive(Debug, Default)]
pub struct QueueFrontier {
    queue: VecDeque<FrontierEntry>,
}

impl Frontier for QueueFrontier {
    fn push(&mut self, url: String, depth: usize) {
        self.queue.push_back(FrontierEntry::new(url, depth));
    }

    fn pop(&mut self) -> Option<FrontierEntry> {
        self.queue.pop_front()
    }

    fn len(&self) -> usize {
        self.queue.len()
    }
}

#[derive(Debug, Default)]
pub struct StackFrontier {
    stack: Vec<FrontierEntry>,
}

impl Frontier for StackFrontier {
    fn push(&mut self, url: String, depth: usize) {
        self.stack.push(FrontierEntry::new(url, depth));
    }

    fn pop(&mut self) -> Option<FrontierEntry> {
        self.stack.pop()
    }

    fn len(&self) -> usize {
        self.stack.len()
    }
}

#[derive(Debug)]
struct Scored {
    score: f64,
    seq: u64,
    entry: FrontierEntry,
}

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scored {}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scored {
    // Max-heap on score; among equal scores the earlier insertion wins.
    fn cmp(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Best-first frontier keyed by [`score_url`].
#[derive(Debug, Default)]
pub struct PriorityFrontier {
    heap: BinaryHeap<Scored>,
    next_seq: u64,
}

impl Frontier for PriorityFrontier {
    fn push(&mut self, url: String, depth: usize) {
        let score = score_url(&url);
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scored {
            score,
            seq,
            entry: FrontierEntry::new(url, depth),
        });
    }

    fn pop(&mut self) -> Option<FrontierEntry> {
        self.heap.pop().map(|scored| scored.entry)
    }

    fn len(&self) -> usize {
        self.heap.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(frontier: &mut dyn Frontier) -> Vec<String> {
        std::iter::from_fn(|| frontier.pop().map(|e| e.url)).collect()
    }

    #[test]
    fn bfs_is_first_in_first_out() {
        let mut frontier = frontier_for(CrawlStrategy::Bfs);
        frontier.push("a".into(), 1);
        frontier.push("b".into(), 1);
        frontier.push("c".into(), 2);

        assert_eq!(frontier.len(), 3);
        assert_eq!(drain(frontier.as_mut()), vec!["a", "b", "c"]);
        assert!(frontier.is_empty());
    }

    #[test]
    fn dfs_is_last_in_first_out() {
        let mut frontier = frontier_for(CrawlStrategy::Dfs);
        frontier.push("a".into(), 1);
        frontier.push("b".into(), 1);
        frontier.push("c".into(), 2);

        assert_eq!(drain(frontier.as_mut()), vec!["c", "b", "a"]);
    }

    #[test]
    fn best_first_pops_highest_score_regardless_of_depth() {
        let mut frontier = frontier_for(CrawlStrategy::BestFirst);
        frontier.push("https://example.com/blog".into(), 1);
        frontier.push("https://example.com/legal/privacy-policy".into(), 3);
        frontier.push("https://example.com/terms".into(), 2);

        let first = frontier.pop().unwrap();
        assert_eq!(first.url, "https://example.com/legal/privacy-policy");
        assert_eq!(first.depth, 3);
        assert_eq!(frontier.pop().unwrap().url, "https://example.com/terms");
        assert_eq!(frontier.pop().unwrap().url, "https://example.com/blog");
    }

    #[test]
    fn best_first_ties_keep_insertion_order() {
        let mut frontier = frontier_for(CrawlStrategy::BestFirst);
        for name in ["one", "two", "three"] {
            frontier.push(format!("https://example.com/{name}"), 1);
        }

        assert_eq!(
            drain(frontier.as_mut()),
            vec![
                "https://example.com/one",
                "https://example.com/two",
                "https://example.com/three"
            ]
        );
    }

    #[test]
    fn strategy_parsing() {
        assert_eq!("bfs".parse::<CrawlStrategy>().unwrap(), CrawlStrategy::Bfs);
        assert_eq!("DFS".parse::<CrawlStrategy>().unwrap(), CrawlStrategy::Dfs);
        assert_eq!(
            "best-first".parse::<CrawlStrategy>().unwrap(),
            CrawlStrategy::BestFirst
        );
        assert_eq!(
            "best_first".parse::<CrawlStrategy>().unwrap(),
            CrawlStrategy::BestFirst
        );
        assert!(matches!(
            "random".parse::<CrawlStrategy>(),
            Err(ScanError::InvalidStrategy(s)) if s == "random"
        ));
    }

    #[test]
    fn strategy_serializes_as_snake_case() {
        let json = serde_json::to_string(&CrawlStrategy::BestFirst).unwrap();
        assert_eq!(json, "\"best_first\"");
        let parsed: CrawlStrategy = serde_json::from_str("\"dfs\"").unwrap();
        assert_eq!(parsed, CrawlStrategy::Dfs);
    }
}
