use crate::relevance::ContentAnalysis;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

/// Outcome of one fetch attempt.
///
/// Successful results always carry non-empty `raw_text` and `markdown`.
/// `legal_score` is a ranking hint for downstream classification, not a gate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    pub url: String,
    /// Where redirects ended up, when that differs from `url`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    pub depth: usize,
    pub title: String,
    pub raw_text: String,
    pub markdown: String,
    pub metadata: BTreeMap<String, String>,
    pub http_status: u16,
    pub content_type: Option<String>,
    pub response_time: Duration,
    pub success: bool,
    pub error: Option<String>,
    pub legal_score: f64,
    pub is_legal: bool,
    pub matched_indicators: Vec<String>,
    pub discovered_urls: Vec<String>,
}

impl CrawlResult {
    pub fn new(url: String, depth: usize) -> Self {
        Self {
            url,
            final_url: None,
            depth,
            title: String::new(),
            raw_text: String::new(),
            markdown: String::new(),
            metadata: BTreeMap::new(),
            http_status: 0,
            content_type: None,
            response_time: Duration::from_secs(0),
            success: false,
            error: None,
            legal_score: 0.0,
            is_legal: false,
            matched_indicators: Vec::new(),
            discovered_urls: Vec::new(),
        }
    }

    pub fn with_error(url: String, depth: usize, error: String) -> Self {
        Self {
            error: Some(error),
            ..Self::new(url, depth)
        }
    }

    /// Attach the content verdict. Consumes the result so it is finalized
    /// before it joins the result list.
    pub fn with_analysis(self, analysis: ContentAnalysis) -> Self {
        Self {
            legal_score: analysis.score,
            is_legal: analysis.is_legal,
            matched_indicators: analysis.matched_indicators,
            ..self
        }
    }
}

/// Sort by `legal_score`, highest first. Equal scores keep crawl order.
pub fn sort_by_legal_score(results: &mut [CrawlResult]) {
    results.sort_by(|a, b| b.legal_score.total_cmp(&a.legal_score));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(url: &str, score: f64) -> CrawlResult {
        CrawlResult {
            legal_score: score,
            ..CrawlResult::new(url.to_string(), 1)
        }
    }

    #[test]
    fn error_results_are_unsuccessful() {
        let result = CrawlResult::with_error("https://example.com/x".into(), 2, "HTTP 404".into());
        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some("HTTP 404"));
        assert_eq!(result.depth, 2);
        assert_eq!(result.legal_score, 0.0);
    }

    #[test]
    fn analysis_is_copied_onto_result() {
        let analysis = ContentAnalysis {
            is_legal: true,
            score: 7.5,
            density: 0.2,
            title_bonus: 6.0,
            matched_indicators: vec!["privacy".into()],
        };
        let result = CrawlResult::new("https://example.com/privacy".into(), 1).with_analysis(analysis);

        assert!(result.is_legal);
        assert_eq!(result.legal_score, 7.5);
        assert_eq!(result.matched_indicators, vec!["privacy".to_string()]);
    }

    #[test]
    fn sorting_is_descending_and_stable() {
        let mut results = vec![
            scored("a", 1.0),
            scored("b", 9.0),
            scored("c", 1.0),
            scored("d", 4.0),
        ];
        sort_by_legal_score(&mut results);

        let order: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(order, vec!["b", "d", "a", "c"]);
    }
}
