// Report generation from crawl outcomes

use chrono::{DateTime, Utc};
use legalscout_scanner::{CrawlOutcome, CrawlResult, StatsSnapshot};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
    Csv,
    Markdown,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            "csv" => Some(ReportFormat::Csv),
            "markdown" | "md" => Some(ReportFormat::Markdown),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "json",
            ReportFormat::Csv => "csv",
            ReportFormat::Markdown => "md",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReportData {
    pub session_id: String,
    pub generated_at: DateTime<Utc>,
    pub legal_only: bool,
    pub totals: ReportTotals,
    pub seeds: Vec<SeedReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportTotals {
    pub seeds: usize,
    pub total_urls: usize,
    pub crawled_urls: usize,
    pub failed_urls: usize,
    pub legal_docs_found: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub seed: String,
    pub stats: StatsSnapshot,
    /// Sorted by `legal_score`, highest first.
    pub results: Vec<CrawlResult>,
}

impl ReportData {
    /// Build report data for one run. With `legal_only`, each seed keeps only
    /// successful pages judged legal; stats still describe the whole crawl.
    pub fn from_outcomes(outcomes: &[CrawlOutcome], legal_only: bool) -> Self {
        let mut totals = ReportTotals {
            seeds: outcomes.len(),
            ..ReportTotals::default()
        };

        let seeds = outcomes
            .iter()
            .map(|outcome| {
                totals.total_urls += outcome.stats.total_urls;
                totals.crawled_urls += outcome.stats.crawled_urls;
                totals.failed_urls += outcome.stats.failed_urls;
                totals.legal_docs_found += outcome.stats.legal_docs_found;

                let results = if legal_only {
                    outcome.legal_documents().cloned().collect()
                } else {
                    outcome.results.clone()
                };

                SeedReport {
                    seed: outcome.seed.clone(),
                    stats: outcome.stats.clone(),
                    results,
                }
            })
            .collect();

        Self {
            session_id: Uuid::new_v4().to_string(),
            generated_at: Utc::now(),
            legal_only,
            totals,
            seeds,
        }
    }

    fn legal_documents(&self) -> impl Iterator<Item = (&str, &CrawlResult)> {
        self.seeds.iter().flat_map(|seed| {
            seed.results
                .iter()
                .filter(|r| r.success && r.is_legal)
                .map(move |r| (seed.seed.as_str(), r))
        })
    }
}

pub fn generate_report(data: &ReportData, format: ReportFormat) -> Result<String, String> {
    match format {
        ReportFormat::Text => Ok(generate_text_report(data)),
        ReportFormat::Json => generate_json_report(data).map_err(|e| e.to_string()),
        ReportFormat::Csv => generate_csv_report(data).map_err(|e| e.to_string()),
        ReportFormat::Markdown => Ok(generate_markdown_report(data)),
    }
}

const HEAVY_RULE: &str =
    "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";
const LIGHT_RULE: &str =
    "────────────────────────────────────────────────────────────────────────────────";

fn section(report: &mut String, title: &str) {
    report.push_str(HEAVY_RULE);
    report.push('\n');
    report.push_str(title);
    report.push('\n');
    report.push_str(HEAVY_RULE);
    report.push_str("\n\n");
}

pub fn generate_text_report(data: &ReportData) -> String {
    let mut report = String::new();

    report.push_str(HEAVY_RULE);
    report.push('\n');
    report.push_str("                        LEGALSCOUT CRAWL REPORT\n");
    report.push_str(HEAVY_RULE);
    report.push_str("\n\n");

    report.push_str(&format!("Session ID:   {}\n", data.session_id));
    report.push_str(&format!(
        "Generated:    {}\n",
        data.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push_str(&format!("Targets:      {}\n", format_targets(data)));
    report.push_str(&format!("Pages Found:  {}\n", data.totals.total_urls));
    report.push('\n');

    section(&mut report, "SUMMARY");
    report.push_str(&format!("  Pages crawled:    {}\n", data.totals.crawled_urls));
    report.push_str(&format!("  Pages failed:     {}\n", data.totals.failed_urls));
    report.push_str(&format!("  Legal documents:  {}\n", data.totals.legal_docs_found));
    report.push('\n');

    for seed in &data.seeds {
        report.push_str(&format!(
            "  {}  {} crawled, {} failed, {} legal, {:.1}s\n",
            seed.seed,
            seed.stats.crawled_urls,
            seed.stats.failed_urls,
            seed.stats.legal_docs_found,
            seed.stats.elapsed_seconds
        ));
    }
    report.push('\n');

    let documents: Vec<_> = data.legal_documents().collect();
    if !documents.is_empty() {
        section(&mut report, "LEGAL DOCUMENTS");

        for (idx, (_, doc)) in documents.iter().enumerate() {
            report.push_str(&format!("[{}] {}\n", idx + 1, doc.title));
            report.push_str(&format!("URL:          {}\n", doc.url));
            report.push_str(&format!("Score:        {:.2} / 10\n", doc.legal_score));
            report.push_str(&format!("Depth:        {}\n", doc.depth));
            if let Some(ref content_type) = doc.content_type {
                report.push_str(&format!("Type:         {}\n", content_type));
            }
            if !doc.matched_indicators.is_empty() {
                report.push_str("\nIndicators:\n");
                report.push_str(&wrap_text(&doc.matched_indicators.join(", "), 80, "  "));
            }
            report.push('\n');
            report.push_str(LIGHT_RULE);
            report.push_str("\n\n");
        }
    }

    if !data.legal_only {
        let failures: Vec<&CrawlResult> = data
            .seeds
            .iter()
            .flat_map(|s| s.results.iter())
            .filter(|r| !r.success)
            .collect();
        if !failures.is_empty() {
            section(&mut report, "FAILED PAGES");
            for result in failures {
                report.push_str(&format!(
                    "  {}  {}\n",
                    result.url,
                    result.error.as_deref().unwrap_or("unknown error")
                ));
            }
            report.push('\n');
        }
    }

    report.push_str(HEAVY_RULE);
    report.push('\n');
    report.push_str("                          End of Report\n");
    report.push_str(HEAVY_RULE);
    report.push('\n');
    report.push_str("\nGenerated by LegalScout\n\n");

    report
}

pub fn generate_json_report(data: &ReportData) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "LegalScout",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": data.generated_at.to_rfc3339(),
                "format": "json",
                "legal_only": data.legal_only,
            },
            "session": {
                "id": data.session_id,
                "targets": data.seeds.iter().map(|s| s.seed.as_str()).collect::<Vec<_>>(),
            },
            "summary": data.totals,
            "seeds": data.seeds,
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn generate_csv_report(data: &ReportData) -> Result<String, csv::Error> {
    let mut wtr = csv::WriterBuilder::new().from_writer(Vec::new());

    wtr.write_record([
        "seed",
        "url",
        "depth",
        "http_status",
        "success",
        "is_legal",
        "legal_score",
        "title",
        "content_type",
        "response_ms",
        "matched_indicators",
        "error",
    ])?;

    for seed in &data.seeds {
        for result in &seed.results {
            wtr.write_record([
                seed.seed.clone(),
                result.url.clone(),
                result.depth.to_string(),
                result.http_status.to_string(),
                result.success.to_string(),
                result.is_legal.to_string(),
                format!("{:.2}", result.legal_score),
                result.title.clone(),
                result.content_type.clone().unwrap_or_default(),
                result.response_time.as_millis().to_string(),
                result.matched_indicators.join("; "),
                result.error.clone().unwrap_or_default(),
            ])?;
        }
    }

    let bytes = wtr.into_inner().map_err(|e| csv::Error::from(e.into_error()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

pub fn generate_markdown_report(data: &ReportData) -> String {
    let mut report = String::new();

    report.push_str("# LegalScout Crawl Report\n\n");
    report.push_str(&format!("- **Session:** `{}`\n", data.session_id));
    report.push_str(&format!(
        "- **Generated:** {}\n",
        data.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push_str(&format!("- **Targets:** {}\n", format_targets(data)));
    report.push_str(&format!(
        "- **Pages:** {} crawled, {} failed\n",
        data.totals.crawled_urls, data.totals.failed_urls
    ));
    report.push_str(&format!(
        "- **Legal documents:** {}\n\n",
        data.totals.legal_docs_found
    ));

    for seed in &data.seeds {
        report.push_str(&format!("## {}\n\n", seed.seed));

        if seed.results.is_empty() {
            report.push_str("_No pages._\n\n");
            continue;
        }

        report.push_str("| Score | Legal | Status | Title | URL |\n");
        report.push_str("|------:|:-----:|-------:|-------|-----|\n");
        for result in &seed.results {
            report.push_str(&format!(
                "| {:.2} | {} | {} | {} | {} |\n",
                result.legal_score,
                if result.is_legal { "yes" } else { "" },
                if result.http_status == 0 {
                    "-".to_string()
                } else {
                    result.http_status.to_string()
                },
                escape_markdown_cell(&result.title),
                result.url
            ));
        }
        report.push('\n');
    }

    report
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}

fn format_targets(data: &ReportData) -> String {
    match data.seeds.as_slice() {
        [] => "none".to_string(),
        [only] => only.seed.clone(),
        many => format!("{} URLs", many.len()),
    }
}

fn escape_markdown_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

pub fn wrap_text(text: &str, width: usize, indent: &str) -> String {
    let mut result = String::new();
    let mut current_line = String::new();
    let available = width.saturating_sub(indent.len()).max(1);

    for word in text.split_whitespace() {
        if !current_line.is_empty() && current_line.len() + word.len() + 1 > available {
            result.push_str(indent);
            result.push_str(&current_line);
            result.push('\n');
            current_line.clear();
        }

        if !current_line.is_empty() {
            current_line.push(' ');
        }
        current_line.push_str(word);
    }

    if !current_line.is_empty() {
        result.push_str(indent);
        result.push_str(&current_line);
        result.push('\n');
    }

    result
}
