use anyhow::{Context, Result, anyhow, bail};
use clap::ArgMatches;
use colored::Colorize;
use legalscout_core::crawl::{CrawlOptions, execute_crawl, generate_crawl_report};
use legalscout_core::report::{ReportData, ReportFormat, generate_report, save_report};
use legalscout_scanner::normalize::{origin_of, request_target};
use legalscout_scanner::robots::RobotsRules;
use legalscout_scanner::{CrawlConfig, CrawlOutcome, CrawlStrategy, Crawler, score_url};
use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{Level, warn};
use url::Url;

// Helper functions for crawl handler

/// Load URLs from either a file or a single URL argument
pub fn load_urls_from_source(url: Option<&Url>, hosts_file: Option<&PathBuf>) -> Result<Vec<String>> {
    if let Some(hosts_file_path) = hosts_file {
        load_urls_from_file(hosts_file_path)
    } else if let Some(url) = url {
        Ok(vec![url.as_str().to_string()])
    } else {
        bail!("Either --url or --hosts-file must be provided")
    }
}

/// Load and parse URLs from a file. Blank lines and `#` comments are skipped.
pub fn load_urls_from_file(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read hosts file {}", path.display()))?;

    let urls: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(parse_url_line)
        .collect();

    if urls.is_empty() {
        bail!("No valid URLs found in {}", path.display());
    }

    Ok(urls)
}

/// Parse a single line as a URL, trying to add http:// if needed
pub fn parse_url_line(line: &str) -> Option<String> {
    // "example.com:8080" parses with a scheme of "example.com", so only
    // web schemes count as already complete.
    if let Ok(url) = Url::parse(line)
        && matches!(url.scheme(), "http" | "https")
    {
        return Some(line.to_string());
    }

    let with_scheme = format!("http://{}", line);
    if let Ok(url) = Url::parse(&with_scheme)
        && url.host_str().is_some()
    {
        return Some(with_scheme);
    }

    warn!("Skipping invalid URL '{}'", line);
    None
}

/// Read crawl settings from a JSON file. Missing keys keep their defaults.
pub fn load_config(path: Option<&str>) -> Result<CrawlConfig> {
    let Some(path) = path else {
        return Ok(CrawlConfig::default());
    };

    let expanded = shellexpand::tilde(path);
    let path = Path::new(expanded.as_ref());
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;

    serde_json::from_str(&content)
        .with_context(|| format!("Invalid config file {}", path.display()))
}

/// Layer command-line flags over the config file (or the defaults).
pub fn config_from_matches(args: &ArgMatches) -> Result<CrawlConfig> {
    let mut config = load_config(args.get_one::<String>("config").map(String::as_str))?;

    if let Some(depth) = args.get_one::<usize>("max-depth") {
        config.max_depth = *depth;
    }
    if let Some(pages) = args.get_one::<usize>("max-pages") {
        config.max_pages = *pages;
    }
    if let Some(concurrency) = args.get_one::<usize>("concurrency") {
        config.max_concurrent = *concurrency;
    }
    if let Some(delay) = args.get_one::<f64>("delay") {
        config.delay_between_requests = *delay;
    }
    if let Some(timeout) = args.get_one::<u64>("timeout") {
        config.timeout_seconds = *timeout;
    }
    if let Some(domains) = args.get_many::<String>("allowed-domain") {
        config.allowed_domains = Some(domains.cloned().collect());
    }
    if let Some(user_agent) = args.get_one::<String>("user-agent") {
        config.user_agent = user_agent.clone();
    }
    if let Some(strategy) = args.get_one::<String>("strategy") {
        config.strategy = strategy.parse::<CrawlStrategy>()?;
    }
    if args.get_flag("ignore-robots") {
        config.respect_robots_txt = false;
    }
    if args.get_flag("follow-external") {
        config.follow_external_links = true;
    }
    if args.get_flag("no-guess") {
        config.guess_legal_paths = false;
    }

    config.validate()?;
    Ok(config)
}

/// Install the stderr log subscriber; `-v` raises the level, `-q` keeps only errors.
pub fn init_tracing(verbosity: u8, quiet: bool) {
    let level = match (quiet, verbosity) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, 2) => Level::DEBUG,
        _ => Level::TRACE,
    };

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

fn print_divider() {
    eprintln!("{}", "═".repeat(60).bright_blue().bold());
}

fn print_crawl_config(urls: &[String], config: &CrawlConfig) {
    print_divider();
    eprintln!("  Crawling {} host(s)", urls.len().to_string().bright_white().bold());
    eprintln!("  Strategy:     {}", config.strategy);
    eprintln!("  Max depth:    {}", config.max_depth);
    eprintln!("  Max pages:    {}", config.max_pages);
    eprintln!("  Concurrency:  {}", config.max_concurrent);
    eprintln!("  Delay:        {:.2}s", config.delay_between_requests);
    eprintln!(
        "  robots.txt:   {}",
        if config.respect_robots_txt {
            "respected".green()
        } else {
            "ignored".yellow()
        }
    );
    let scope = match (&config.allowed_domains, config.follow_external_links) {
        (Some(domains), _) => domains.join(", "),
        (None, true) => "any host".to_string(),
        (None, false) => "seed host only".to_string(),
    };
    eprintln!("  Scope:        {}", scope);
    print_divider();
}

fn filter_legal(outcomes: &[CrawlOutcome]) -> Vec<CrawlOutcome> {
    outcomes
        .iter()
        .map(|outcome| CrawlOutcome {
            seed: outcome.seed.clone(),
            results: outcome.legal_documents().cloned().collect(),
            stats: outcome.stats.clone(),
        })
        .collect()
}

pub async fn handle_crawl(sub_matches: &ArgMatches, quiet: bool) -> Result<()> {
    let url = sub_matches.get_one::<Url>("url");
    let hosts_file = sub_matches.get_one::<PathBuf>("hosts-file");
    let output = sub_matches.get_one::<PathBuf>("output");
    let legal_only = sub_matches.get_flag("legal-only");
    let format_name = sub_matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("text");
    let format = ReportFormat::from_str(format_name)
        .ok_or_else(|| anyhow!("Unknown report format '{}'", format_name))?;

    let urls = load_urls_from_source(url, hosts_file)?;
    let config = config_from_matches(sub_matches)?;

    if !quiet {
        print_crawl_config(&urls, &config);
    }

    let options = CrawlOptions {
        urls,
        config,
        show_progress_bars: !quiet && std::io::stderr().is_terminal(),
    };

    let progress_callback = (!quiet).then(|| {
        Arc::new(|msg: String| {
            eprintln!("{}", msg);
        }) as legalscout_core::crawl::CrawlProgressCallback
    });

    let outcomes = execute_crawl(options, progress_callback, None).await?;
    if outcomes.is_empty() {
        bail!("No seed could be crawled");
    }

    if let Some(path) = output {
        let data = ReportData::from_outcomes(&outcomes, legal_only);
        let report = generate_report(&data, format).map_err(|e| anyhow!(e))?;
        save_report(&report, path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        eprintln!(
            "{} Report saved to {}",
            "✓".green().bold(),
            path.display().to_string().bright_white()
        );
        return Ok(());
    }

    match format {
        ReportFormat::Text => {
            let shown = if legal_only {
                filter_legal(&outcomes)
            } else {
                outcomes
            };
            print!("{}", generate_crawl_report(&shown));
        }
        _ => {
            let data = ReportData::from_outcomes(&outcomes, legal_only);
            let report = generate_report(&data, format).map_err(|e| anyhow!(e))?;
            print!("{}", report);
        }
    }

    Ok(())
}

pub async fn handle_robots(sub_matches: &ArgMatches) -> Result<()> {
    let url = sub_matches
        .get_one::<Url>("URL")
        .ok_or_else(|| anyhow!("A URL is required"))?;

    let mut config = CrawlConfig::default();
    if let Some(user_agent) = sub_matches.get_one::<String>("user-agent") {
        config.user_agent = user_agent.clone();
    }
    if let Some(timeout) = sub_matches.get_one::<u64>("timeout") {
        config.robots_timeout_seconds = *timeout;
    }

    let origin = origin_of(url.as_str()).ok_or_else(|| anyhow!("Invalid URL: {}", url))?;
    let target = request_target(url.as_str());

    let crawler = Crawler::new(config)?;
    let robots = crawler.robots();
    let verdict = robots.can_fetch(&origin, &target).await;
    let rules = robots.rules_for(&origin).await;
    let user_agent = &crawler.config().user_agent;

    print_divider();
    println!("  {} {}", "URL:".bold(), url);
    println!("  {} {}", "User-agent:".bold(), user_agent);
    match rules.as_ref() {
        RobotsRules::AllowAll => println!("  {} none (allow all)", "Rules:".bold()),
        RobotsRules::Groups(groups) => {
            let matched = rules
                .group_for(user_agent)
                .map(|(name, _)| name.to_string())
                .unwrap_or_else(|| "none".to_string());
            println!(
                "  {} {} group(s), matched '{}'",
                "Rules:".bold(),
                groups.len(),
                matched
            );
        }
    }
    if let Some(delay) = robots.crawl_delay(&origin).await {
        println!("  {} {:.2}s", "Crawl-delay:".bold(), delay.as_secs_f64());
    }
    println!(
        "  {} {} ({})",
        "Verdict:".bold(),
        if verdict.allowed {
            "allowed".green().bold()
        } else {
            "disallowed".red().bold()
        },
        verdict.reason
    );
    print_divider();

    Ok(())
}

pub fn handle_score(sub_matches: &ArgMatches) -> Result<()> {
    let urls: Vec<&Url> = sub_matches
        .get_many::<Url>("URLS")
        .map(|values| values.collect())
        .unwrap_or_default();

    for url in urls {
        let score = score_url(url.as_str());
        let rendered = format!("{:>6.2}", score);
        let rendered = if score > 0.0 {
            rendered.green().bold()
        } else {
            rendered.dimmed()
        };
        println!("{}  {}", rendered, url);
    }

    Ok(())
}
