//! Legal-document relevance heuristics.
//!
//! Two independent scores live here: [`score_url`] ranks a URL before it is
//! fetched, and [`analyze_content`] judges fetched text. They are never
//! combined.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Substring keywords found in legal-document URLs.
const URL_KEYWORDS: &[(&str, f64)] = &[
    ("privacy", 3.0),
    ("terms", 3.0),
    ("legal", 2.5),
    ("policy", 2.0),
    ("policies", 2.0),
    ("cookie", 2.0),
    ("gdpr", 2.5),
    ("ccpa", 2.5),
    ("conditions", 2.0),
    ("agreement", 1.5),
    ("disclaimer", 1.5),
    ("compliance", 1.5),
    ("data-protection", 2.5),
    ("imprint", 1.5),
    ("impressum", 1.5),
    ("eula", 2.0),
    ("copyright", 1.0),
    ("acceptable-use", 2.0),
    ("subprocessor", 2.0),
    ("notice", 1.0),
];

/// Path shapes that are almost always legal pages.
const URL_PATTERNS: &[(&str, f64)] = &[
    (r"/privacy(?:[-_]?(?:policy|notice|statement))?(?:\.html?)?$", 3.0),
    (r"/terms(?:[-_]?(?:of[-_]?(?:service|use)|and[-_]conditions))?(?:\.html?)?$", 3.0),
    (r"/legal(?:/|$)", 2.0),
    (r"/(?:tos|dpa|eula|aup)(?:\.html?)?$", 2.0),
    (r"/cookies?(?:[-_]?(?:policy|notice))?(?:\.html?)?$", 2.0),
    (r"/(?:company|about)/(?:privacy|legal|terms)", 1.5),
    (r"[?&](?:page|doc)=(?:privacy|terms|legal)", 1.0),
];

/// Near-certain matches.
const HIGH_VALUE_URL_TERMS: &[(&str, f64)] = &[
    ("privacy-policy", 5.0),
    ("privacy_policy", 5.0),
    ("privacypolicy", 5.0),
    ("privacy-notice", 5.0),
    ("terms-of-service", 5.0),
    ("terms-of-use", 5.0),
    ("terms-and-conditions", 5.0),
    ("cookie-policy", 5.0),
    ("data-processing-addendum", 5.0),
    ("data-processing-agreement", 5.0),
];

/// Single words and short phrases that indicate legal prose.
const CONTENT_KEYWORDS: &[&str] = &[
    "privacy",
    "personal data",
    "personal information",
    "cookies",
    "terms",
    "conditions",
    "liability",
    "warranty",
    "warranties",
    "indemnify",
    "indemnification",
    "governing law",
    "jurisdiction",
    "arbitration",
    "third parties",
    "third-party",
    "consent",
    "data controller",
    "data processor",
    "subprocessor",
    "gdpr",
    "ccpa",
    "retention",
    "opt-out",
    "opt out",
    "terminate",
    "termination",
    "intellectual property",
    "disclaimer",
    "agreement",
    "pursuant",
    "hereby",
    "herein",
    "applicable law",
    "lawful basis",
    "legitimate interest",
    "data subject",
    "confidentiality",
];

/// Phrases typical of privacy policies and terms; each hit is worth more
/// than a keyword.
const CONTENT_PHRASES: &[&str] = &[
    r"we (?:may )?(?:collect|use|share|disclose|process|store|retain) (?:your )?(?:personal )?(?:data|information)",
    r"by (?:using|accessing) (?:this|our|the) (?:site|website|service|services|platform)",
    r"(?:this|our) privacy (?:policy|notice|statement)",
    r"(?:these|our) terms(?: of (?:service|use))?",
    r"you (?:agree|consent|acknowledge) (?:to|that)",
    r"in accordance with (?:the )?(?:applicable )?(?:law|laws|regulations?)",
    r"rights? to (?:access|rectification|erasure|object|restrict|data portability)",
    r"limitations? of liability",
    r"effective (?:date|as of)",
    r"last (?:updated|modified|revised)",
    r"california consumer privacy act",
    r"general data protection regulation",
    r"data processing (?:agreement|addendum)",
    r"cookie (?:policy|notice|settings|preferences)",
    r"(?:sell|share) (?:your )?personal information",
    r"contact (?:us|our data protection officer)",
];

/// Title keywords and the bonus they add when present in `<title>`.
const TITLE_KEYWORDS: &[(&str, f64)] = &[
    ("privacy policy", 6.0),
    ("privacy notice", 6.0),
    ("privacy statement", 6.0),
    ("terms of service", 6.0),
    ("terms of use", 6.0),
    ("terms and conditions", 6.0),
    ("cookie policy", 6.0),
    ("cookie notice", 6.0),
    ("data processing addendum", 6.0),
    ("data processing agreement", 6.0),
    ("end user license agreement", 6.0),
    ("acceptable use policy", 6.0),
    ("privacy", 3.0),
    ("terms", 2.0),
    ("legal", 2.0),
    ("cookie", 2.0),
    ("gdpr", 2.0),
    ("policy", 1.0),
];

/// Metadata keys inspected for the metadata bonus.
const METADATA_KEYS: &[&str] = &[
    "description",
    "keywords",
    "og:title",
    "og:description",
    "og:type",
    "h1",
    "h2",
];
const METADATA_TERMS: &[&str] = &[
    "privacy", "terms", "legal", "cookie", "gdpr", "ccpa", "policy", "agreement",
];
const METADATA_HIT_BONUS: f64 = 0.5;
const METADATA_BONUS_CAP: f64 = 2.0;

pub const MIN_WORDS: usize = 50;
pub const MIN_CHARS: usize = 300;
pub const MIN_DENSITY: f64 = 0.05;
pub const MIN_LEGAL_SCORE: f64 = 2.0;
pub const TITLE_OVERRIDE_BONUS: f64 = 6.0;
pub const MAX_SCORE: f64 = 10.0;

const KEYWORD_WEIGHT: f64 = 1.0;
const PHRASE_WEIGHT: f64 = 3.0;

static URL_PATTERN_REGEXES: LazyLock<Vec<(Regex, f64)>> = LazyLock::new(|| compile(URL_PATTERNS));

static PHRASE_REGEXES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    CONTENT_PHRASES
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
});

fn compile(table: &[(&str, f64)]) -> Vec<(Regex, f64)> {
    table
        .iter()
        .filter_map(|(p, w)| Regex::new(p).ok().map(|re| (re, *w)))
        .collect()
}

/// Static legal relevance of a URL: the sum of every matching keyword,
/// path pattern and high-value term. Zero is a valid score.
pub fn score_url(url: &str) -> f64 {
    let lowered = url.to_lowercase();

    let keywords: f64 = URL_KEYWORDS
        .iter()
        .filter(|(kw, _)| lowered.contains(kw))
        .map(|(_, w)| w)
        .sum();

    let patterns: f64 = URL_PATTERN_REGEXES
        .iter()
        .filter(|(re, _)| re.is_match(&lowered))
        .map(|(_, w)| w)
        .sum();

    let high_value: f64 = HIGH_VALUE_URL_TERMS
        .iter()
        .filter(|(term, _)| lowered.contains(term))
        .map(|(_, w)| w)
        .sum();

    keywords + patterns + high_value
}

/// Verdict of [`analyze_content`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentAnalysis {
    pub is_legal: bool,
    /// Normalized score in `[0, 10]`.
    pub score: f64,
    /// Fraction of characters covered by indicator matches.
    pub density: f64,
    pub title_bonus: f64,
    pub matched_indicators: Vec<String>,
}

/// Judge whether fetched text is a legal document.
///
/// Content under [`MIN_WORDS`] words or [`MIN_CHARS`] characters is
/// rejected before any other signal, including the title, is considered.
pub fn analyze_content(
    text: &str,
    title: &str,
    metadata: &BTreeMap<String, String>,
) -> ContentAnalysis {
    let total_chars = text.chars().count();
    let word_count = text.split_whitespace().count();
    if word_count < MIN_WORDS || total_chars < MIN_CHARS {
        return ContentAnalysis::default();
    }

    let lowered = text.to_lowercase();
    let mut matched = Vec::new();
    let mut covered_chars = 0usize;
    let mut raw_score = 0.0;

    for keyword in CONTENT_KEYWORDS {
        let hits = count_word_matches(&lowered, keyword);
        if hits > 0 {
            covered_chars += hits * keyword.chars().count();
            raw_score += hits as f64 * KEYWORD_WEIGHT;
            matched.push((*keyword).to_string());
        }
    }

    for (re, source) in PHRASE_REGEXES.iter().zip(CONTENT_PHRASES) {
        let mut hits = 0usize;
        for m in re.find_iter(&lowered) {
            hits += 1;
            covered_chars += m.as_str().chars().count();
        }
        if hits > 0 {
            raw_score += hits as f64 * PHRASE_WEIGHT;
            matched.push(format!("phrase:{}", source));
        }
    }

    // Overlapping keyword and phrase hits can count a character twice.
    let density = (covered_chars as f64 / total_chars as f64).min(1.0);

    let title_bonus = title_bonus(title, &mut matched);
    let metadata_bonus = metadata_bonus(metadata);

    let score = (raw_score * density * 100.0 + title_bonus + metadata_bonus).clamp(0.0, MAX_SCORE);

    let is_legal =
        (density >= MIN_DENSITY && score >= MIN_LEGAL_SCORE) || title_bonus >= TITLE_OVERRIDE_BONUS;

    ContentAnalysis {
        is_legal,
        score,
        density,
        title_bonus,
        matched_indicators: matched,
    }
}

/// Occurrences of `needle` in `haystack` that start and end on word
/// boundaries, so `terms` does not match inside `midterms`.
fn count_word_matches(haystack: &str, needle: &str) -> usize {
    haystack
        .match_indices(needle)
        .filter(|(idx, _)| {
            let before = haystack[..*idx].chars().next_back();
            let after = haystack[idx + needle.len()..].chars().next();
            !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
        })
        .count()
}

fn title_bonus(title: &str, matched: &mut Vec<String>) -> f64 {
    let lowered = title.to_lowercase();
    let mut bonus = 0.0;
    for (keyword, weight) in TITLE_KEYWORDS {
        if count_word_matches(&lowered, keyword) > 0 {
            bonus += weight;
            matched.push(format!("title:{}", keyword));
        }
    }
    bonus
}

fn metadata_bonus(metadata: &BTreeMap<String, String>) -> f64 {
    let hits = METADATA_KEYS
        .iter()
        .filter_map(|key| metadata.get(*key))
        .filter(|value| {
            let value = value.to_lowercase();
            METADATA_TERMS.iter().any(|term| value.contains(term))
        })
        .count();
    (hits as f64 * METADATA_HIT_BONUS).min(METADATA_BONUS_CAP)
}
