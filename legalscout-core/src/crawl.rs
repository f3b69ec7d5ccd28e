use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use legalscout_scanner::{CrawlConfig, CrawlOutcome, CrawlResult, Crawler};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use url::Url;

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub urls: Vec<String>,
    pub config: CrawlConfig,
    pub show_progress_bars: bool,
}

/// Callback for reporting crawl progress
pub type CrawlProgressCallback = Arc<dyn Fn(String) + Send + Sync>;

/// Callback for reporting individual crawl results as they come in
pub type CrawlResultCallback = Arc<dyn Fn(CrawlResult) + Send + Sync>;

/// Extract the path component from a URL
pub fn extract_url_path(url: &str) -> String {
    Url::parse(url)
        .ok()
        .map(|u| {
            let path = u.path().to_string();
            if path.is_empty() || path == "/" {
                "/".to_string()
            } else {
                path
            }
        })
        .unwrap_or_else(|| url.to_string())
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Starting crawl...");
    pb
}

/// Crawl every seed with its own crawler session.
///
/// A seed that cannot be crawled at all (bad URL, outside the allowed
/// domains) is reported through `progress_callback` and skipped. Only an
/// unusable configuration fails the whole run.
pub async fn execute_crawl(
    options: CrawlOptions,
    progress_callback: Option<CrawlProgressCallback>,
    result_callback: Option<CrawlResultCallback>,
) -> legalscout_scanner::Result<Vec<CrawlOutcome>> {
    let CrawlOptions {
        urls,
        config,
        show_progress_bars,
    } = options;

    config.validate()?;

    let progress_bar = show_progress_bars.then(|| Arc::new(spinner()));
    let processed_count = Arc::new(AtomicUsize::new(0));

    let report = |msg: String| {
        if let Some(ref callback) = progress_callback {
            match progress_bar {
                Some(ref pb) => pb.suspend(|| callback(msg)),
                None => callback(msg),
            }
        }
    };

    let mut outcomes = Vec::with_capacity(urls.len());
    for (idx, url_str) in urls.iter().enumerate() {
        if urls.len() > 1 {
            report(format!(
                "Crawling host {}/{}: {}",
                idx + 1,
                urls.len(),
                url_str
            ));
        }

        let mut crawler = Crawler::new(config.clone())?;

        if let Some(ref pb) = progress_bar {
            let pb = pb.clone();
            let count = processed_count.clone();
            let max_pages = config.max_pages;
            crawler = crawler.with_progress_callback(Arc::new(move |attempted, url| {
                count.fetch_add(1, Ordering::Relaxed);
                pb.set_message(format!(
                    "[{}/{}] {}",
                    attempted,
                    max_pages,
                    extract_url_path(&url)
                ));
            }));
        }

        if let Some(ref cb) = result_callback {
            let cb = cb.clone();
            crawler = crawler.with_result_callback(Arc::new(move |result: &CrawlResult| {
                cb(result.clone());
            }));
        }

        match crawler.crawl(url_str).await {
            Ok(outcome) => {
                report(format!(
                    "{} {}: {} pages, {} legal documents",
                    "✓".green(),
                    outcome.seed,
                    outcome.stats.crawled_urls + outcome.stats.failed_urls,
                    outcome.stats.legal_docs_found
                ));
                outcomes.push(outcome);
            }
            Err(e) => {
                report(format!("{} Failed to crawl {}: {}", "✗".red(), url_str, e));
            }
        }
    }

    if let Some(ref pb) = progress_bar {
        let total = processed_count.load(Ordering::Relaxed);
        pb.finish_with_message(format!("Crawl complete! {} URLs processed", total));
    }

    Ok(outcomes)
}

fn colored_status(status: u16) -> String {
    let text = if status == 0 {
        "---".to_string()
    } else {
        status.to_string()
    };
    match status {
        200..=299 => text.green().to_string(),
        300..=399 => text.cyan().to_string(),
        400..=499 => text.yellow().to_string(),
        500..=599 => text.red().to_string(),
        _ => text.dimmed().to_string(),
    }
}

/// Terminal summary of one or more crawls: legal documents first, then
/// every other page grouped by seed.
pub fn generate_crawl_report(outcomes: &[CrawlOutcome]) -> String {
    let divider = "━".repeat(60);
    let mut report = String::new();

    let crawled: usize = outcomes.iter().map(|o| o.stats.crawled_urls).sum();
    let failed: usize = outcomes.iter().map(|o| o.stats.failed_urls).sum();
    let legal: usize = outcomes.iter().map(|o| o.stats.legal_docs_found).sum();

    report.push_str(&format!("{}\n\n", divider));
    report.push_str(&format!("{}\n", "Summary:".bold()));
    report.push_str(&format!("  Seeds crawled:    {}\n", outcomes.len()));
    report.push_str(&format!("  Pages fetched:    {}\n", crawled));
    report.push_str(&format!("  Pages failed:     {}\n", failed));
    report.push_str(&format!(
        "  Legal documents:  {}\n",
        legal.to_string().bright_green().bold()
    ));
    report.push_str(&format!("\n{}\n\n", divider));

    for outcome in outcomes {
        report.push_str(&format!("## {}\n", outcome.seed.bright_white().bold()));
        report.push_str(&format!(
            "  {} pages in {:.1}s ({:.2} pages/s)\n\n",
            outcome.results.len(),
            outcome.stats.elapsed_seconds,
            outcome.stats.pages_per_second
        ));

        let documents: Vec<&CrawlResult> = outcome.legal_documents().collect();
        if !documents.is_empty() {
            report.push_str(&format!("  {}\n", "Legal documents:".green().bold()));
            for doc in documents {
                report.push_str(&format!(
                    "  {} {:>5.2}  {}  {}\n",
                    "★".bright_yellow(),
                    doc.legal_score,
                    extract_url_path(&doc.url),
                    doc.title.dimmed()
                ));
            }
            report.push('\n');
        }

        let others: Vec<&CrawlResult> = outcome
            .results
            .iter()
            .filter(|r| !(r.success && r.is_legal))
            .collect();
        if !others.is_empty() {
            report.push_str(&format!("  {}\n", "Other pages:".bold()));
            for result in others {
                let mut line = format!(
                    "  {} {}",
                    colored_status(result.http_status),
                    extract_url_path(&result.url)
                );
                if let Some(ref error) = result.error
                    && result.http_status == 0
                {
                    line.push_str(&format!("  {}", error.bright_black()));
                } else if let Some(ref content_type) = result.content_type
                    && !content_type.contains("text/html")
                {
                    line.push_str(&format!("  {}", content_type.bright_black()));
                }
                report.push_str(&line);
                report.push('\n');
            }
            report.push('\n');
        }
    }

    report
}
