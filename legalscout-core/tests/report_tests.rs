// Tests for report generation functionality

use chrono::Utc;
use legalscout_core::report::{
    ReportData, ReportFormat, generate_csv_report, generate_json_report,
    generate_markdown_report, generate_report, generate_text_report, save_report, wrap_text,
};
use legalscout_scanner::{CrawlOutcome, CrawlResult, StatsSnapshot};
use std::fs;
use std::time::Duration;
use tempfile::TempDir;

// ============================================================================
// Report Format Tests
// ============================================================================

#[test]
fn test_report_format_from_str() {
    assert!(matches!(ReportFormat::from_str("text"), Some(ReportFormat::Text)));
    assert!(matches!(ReportFormat::from_str("json"), Some(ReportFormat::Json)));
    assert!(matches!(ReportFormat::from_str("csv"), Some(ReportFormat::Csv)));
    assert!(matches!(
        ReportFormat::from_str("markdown"),
        Some(ReportFormat::Markdown)
    ));
}

#[test]
fn test_report_format_from_str_md() {
    assert!(matches!(ReportFormat::from_str("md"), Some(ReportFormat::Markdown)));
}

#[test]
fn test_report_format_from_str_case_insensitive() {
    assert!(matches!(ReportFormat::from_str("TEXT"), Some(ReportFormat::Text)));
    assert!(matches!(ReportFormat::from_str("Json"), Some(ReportFormat::Json)));
    assert!(matches!(ReportFormat::from_str("CSV"), Some(ReportFormat::Csv)));
}

#[test]
fn test_report_format_from_str_invalid() {
    assert!(ReportFormat::from_str("html").is_none());
    assert!(ReportFormat::from_str("pdf").is_none());
}

#[test]
fn test_report_format_extension() {
    assert_eq!(ReportFormat::Markdown.extension(), "md");
    assert_eq!(ReportFormat::Json.extension(), "json");
}

// ============================================================================
// Fixtures
// ============================================================================

fn stats(crawled: usize, failed: usize, legal: usize) -> StatsSnapshot {
    StatsSnapshot {
        total_urls: crawled + failed + 3,
        crawled_urls: crawled,
        failed_urls: failed,
        legal_docs_found: legal,
        started_at: Utc::now(),
        elapsed_seconds: 4.0,
        pages_per_second: crawled as f64 / 4.0,
    }
}

fn legal_page(url: &str, title: &str, score: f64) -> CrawlResult {
    let mut result = CrawlResult::new(url.to_string(), 1);
    result.title = title.to_string();
    result.raw_text = format!("{} body text", title);
    result.markdown = format!("# {}\n\nbody text", title);
    result.success = true;
    result.is_legal = true;
    result.legal_score = score;
    result.http_status = 200;
    result.content_type = Some("text/html; charset=utf-8".to_string());
    result.response_time = Duration::from_millis(120);
    result.matched_indicators = vec![
        "privacy".to_string(),
        "personal data".to_string(),
        "title:privacy policy".to_string(),
    ];
    result
}

fn outcomes() -> Vec<CrawlOutcome> {
    let mut home = CrawlResult::new("https://acme.test/".to_string(), 0);
    home.title = "Acme | Home".to_string();
    home.raw_text = "Welcome".to_string();
    home.markdown = "Welcome".to_string();
    home.success = true;
    home.http_status = 200;

    let mut gone = CrawlResult::new("https://acme.test/tos".to_string(), 1);
    gone.http_status = 404;
    gone.error = Some("HTTP 404".to_string());

    vec![
        CrawlOutcome {
            seed: "https://acme.test/".to_string(),
            results: vec![
                legal_page("https://acme.test/privacy", "Privacy Policy", 9.0),
                home,
                gone,
            ],
            stats: stats(2, 1, 1),
        },
        CrawlOutcome {
            seed: "https://globex.test/".to_string(),
            results: vec![legal_page(
                "https://globex.test/legal/terms",
                "Terms of Service",
                7.25,
            )],
            stats: stats(1, 0, 1),
        },
    ]
}

// ============================================================================
// Report Data Tests
// ============================================================================

#[test]
fn test_report_data_totals() {
    let data = ReportData::from_outcomes(&outcomes(), false);

    assert_eq!(data.totals.seeds, 2);
    assert_eq!(data.totals.crawled_urls, 3);
    assert_eq!(data.totals.failed_urls, 1);
    assert_eq!(data.totals.legal_docs_found, 2);
    assert_eq!(data.totals.total_urls, 10);
    assert_eq!(data.seeds[0].results.len(), 3);
}

#[test]
fn test_report_data_legal_only() {
    let data = ReportData::from_outcomes(&outcomes(), true);

    assert!(data.legal_only);
    assert_eq!(data.seeds[0].results.len(), 1);
    assert!(data.seeds.iter().flat_map(|s| &s.results).all(|r| r.is_legal));
    // Stats still describe the whole crawl.
    assert_eq!(data.totals.crawled_urls, 3);
}

#[test]
fn test_report_data_session_ids_are_unique() {
    let a = ReportData::from_outcomes(&outcomes(), false);
    let b = ReportData::from_outcomes(&outcomes(), false);

    assert_eq!(a.session_id.len(), 36);
    assert_ne!(a.session_id, b.session_id);
}

// ============================================================================
// Text Report Tests
// ============================================================================

#[test]
fn test_text_report_structure() {
    let data = ReportData::from_outcomes(&outcomes(), false);
    let report = generate_text_report(&data);

    assert!(report.contains("LEGALSCOUT CRAWL REPORT"));
    assert!(report.contains(&format!("Session ID:   {}", data.session_id)));
    assert!(report.contains("Targets:      2 URLs"));
    assert!(report.contains("SUMMARY"));
    assert!(report.contains("LEGAL DOCUMENTS"));
    assert!(report.contains("[1] Privacy Policy"));
    assert!(report.contains("[2] Terms of Service"));
    assert!(report.contains("Score:        9.00 / 10"));
    assert!(report.contains("FAILED PAGES"));
    assert!(report.contains("https://acme.test/tos  HTTP 404"));
    assert!(report.contains("End of Report"));
}

#[test]
fn test_text_report_legal_only_hides_failures() {
    let data = ReportData::from_outcomes(&outcomes(), true);
    let report = generate_text_report(&data);

    assert!(report.contains("LEGAL DOCUMENTS"));
    assert!(!report.contains("FAILED PAGES"));
}

#[test]
fn test_text_report_single_target() {
    let data = ReportData::from_outcomes(&outcomes()[..1], false);
    let report = generate_text_report(&data);
    assert!(report.contains("Targets:      https://acme.test/"));
}

// ============================================================================
// JSON Report Tests
// ============================================================================

#[test]
fn test_json_report_structure() {
    let data = ReportData::from_outcomes(&outcomes(), false);
    let json = generate_json_report(&data).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let report = &value["report"];
    assert_eq!(report["metadata"]["generator"], "LegalScout");
    assert_eq!(report["metadata"]["format"], "json");
    assert_eq!(report["session"]["id"], data.session_id.as_str());
    assert_eq!(report["session"]["targets"][1], "https://globex.test/");
    assert_eq!(report["summary"]["legal_docs_found"], 2);
    assert_eq!(report["seeds"].as_array().unwrap().len(), 2);
}

#[test]
fn test_json_report_carries_full_results() {
    let data = ReportData::from_outcomes(&outcomes(), false);
    let json = generate_json_report(&data).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let first = &value["report"]["seeds"][0]["results"][0];
    assert_eq!(first["url"], "https://acme.test/privacy");
    assert_eq!(first["markdown"], "# Privacy Policy\n\nbody text");
    assert_eq!(first["raw_text"], "Privacy Policy body text");
    assert_eq!(first["is_legal"], true);
    assert_eq!(first["legal_score"], 9.0);
    assert_eq!(value["report"]["seeds"][0]["stats"]["crawled_urls"], 2);
}

// ============================================================================
// CSV Report Tests
// ============================================================================

#[test]
fn test_csv_report_rows() {
    let data = ReportData::from_outcomes(&outcomes(), false);
    let csv_text = generate_csv_report(&data).unwrap();

    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "seed");
    assert_eq!(&headers[1], "url");

    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 4);
    assert_eq!(&rows[0][1], "https://acme.test/privacy");
    assert_eq!(&rows[0][5], "true");
    assert_eq!(&rows[0][6], "9.00");
    assert_eq!(&rows[0][9], "120");
    assert_eq!(&rows[1][7], "Acme | Home");
    assert_eq!(&rows[2][11], "HTTP 404");
}

#[test]
fn test_csv_report_quotes_commas() {
    let mut outcome = outcomes().remove(1);
    outcome.results[0].title = "Terms, Conditions and \"Rules\"".to_string();
    let data = ReportData::from_outcomes(&[outcome], false);
    let csv_text = generate_csv_report(&data).unwrap();

    let mut reader = csv::Reader::from_reader(csv_text.as_bytes());
    let row = reader.records().next().unwrap().unwrap();
    assert_eq!(&row[7], "Terms, Conditions and \"Rules\"");
}

// ============================================================================
// Markdown Report Tests
// ============================================================================

#[test]
fn test_markdown_report_tables() {
    let data = ReportData::from_outcomes(&outcomes(), false);
    let md = generate_markdown_report(&data);

    assert!(md.starts_with("# LegalScout Crawl Report"));
    assert!(md.contains("## https://acme.test/"));
    assert!(md.contains("| Score | Legal | Status | Title | URL |"));
    assert!(md.contains("| 9.00 | yes | 200 | Privacy Policy | https://acme.test/privacy |"));
    assert!(md.contains("Acme \\| Home"));
}

#[test]
fn test_generate_report_dispatches_on_format() {
    let data = ReportData::from_outcomes(&outcomes(), false);

    let json = generate_report(&data, ReportFormat::Json).unwrap();
    assert!(serde_json::from_str::<serde_json::Value>(&json).is_ok());

    let md = generate_report(&data, ReportFormat::Markdown).unwrap();
    assert!(md.starts_with("# LegalScout"));
}

// ============================================================================
// Save and Helpers
// ============================================================================

#[test]
fn test_save_report() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let path = dir.path().join("report.json");

    let data = ReportData::from_outcomes(&outcomes(), false);
    let json = generate_json_report(&data)?;
    save_report(&json, &path)?;

    assert_eq!(fs::read_to_string(&path)?, json);
    Ok(())
}

#[test]
fn test_save_report_missing_directory() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("missing").join("report.txt");
    assert!(save_report("x", &path).is_err());
}

#[test]
fn test_wrap_text() {
    let wrapped = wrap_text("one two three four five six", 12, "  ");
    assert_eq!(wrapped, "  one two\n  three four\n  five six\n");
}

#[test]
fn test_wrap_text_long_word() {
    let wrapped = wrap_text("supercalifragilistic ok", 10, "");
    assert_eq!(wrapped, "supercalifragilistic\nok\n");
}
