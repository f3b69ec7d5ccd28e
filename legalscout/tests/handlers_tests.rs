use legalscout::commands::command_argument_builder;
use legalscout::*;
use legalscout_scanner::{CrawlConfig, CrawlStrategy};
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;
use url::Url;

#[test]
fn test_parse_url_line_with_scheme() {
    let result = parse_url_line("https://example.com");
    assert_eq!(result, Some("https://example.com".to_string()));
}

#[test]
fn test_parse_url_line_without_scheme() {
    let result = parse_url_line("example.com");
    assert_eq!(result, Some("http://example.com".to_string()));
}

#[test]
fn test_parse_url_line_host_and_port() {
    let result = parse_url_line("example.com:8080/legal");
    assert_eq!(result, Some("http://example.com:8080/legal".to_string()));
}

#[test]
fn test_parse_url_line_invalid() {
    let result = parse_url_line("not a valid url!!!");
    assert_eq!(result, None);
}

#[test]
fn test_extract_url_path() {
    assert_eq!(
        extract_url_path("https://example.com/legal/privacy"),
        "/legal/privacy"
    );
    assert_eq!(extract_url_path("https://example.com/"), "/");
    assert_eq!(extract_url_path("https://example.com"), "/");
}

#[test]
fn test_load_urls_from_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "https://example.com")?;
    writeln!(temp_file, "acme.test")?;
    writeln!(temp_file)?; // Empty line
    writeln!(temp_file, "# staging hosts")?;
    writeln!(temp_file, "  https://globex.test/legal  ")?;

    let path = PathBuf::from(temp_file.path());
    let urls = load_urls_from_file(&path)?;

    assert_eq!(urls.len(), 3);
    assert_eq!(urls[0], "https://example.com");
    assert_eq!(urls[1], "http://acme.test");
    assert_eq!(urls[2], "https://globex.test/legal");

    Ok(())
}

#[test]
fn test_load_urls_from_file_empty() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file).unwrap();
    writeln!(temp_file, "   ").unwrap();

    let path = PathBuf::from(temp_file.path());
    let err = load_urls_from_file(&path).unwrap_err();
    assert!(err.to_string().contains("No valid URLs found"));
}

#[test]
fn test_load_urls_from_file_missing() {
    let path = PathBuf::from("/nonexistent/hosts.txt");
    let err = load_urls_from_file(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to read hosts file"));
}

#[test]
fn test_load_urls_from_source_prefers_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, "https://from-file.test")?;
    let path = PathBuf::from(temp_file.path());
    let url = Url::parse("https://from-flag.test")?;

    let urls = load_urls_from_source(Some(&url), Some(&path))?;
    assert_eq!(urls, vec!["https://from-file.test".to_string()]);

    let urls = load_urls_from_source(Some(&url), None)?;
    assert_eq!(urls, vec!["https://from-flag.test/".to_string()]);
    Ok(())
}

#[test]
fn test_load_urls_from_source_requires_input() {
    let err = load_urls_from_source(None, None).unwrap_err();
    assert!(err.to_string().contains("--url or --hosts-file"));
}

#[test]
fn test_load_config_defaults_without_path() -> Result<(), Box<dyn std::error::Error>> {
    assert_eq!(load_config(None)?, CrawlConfig::default());
    Ok(())
}

#[test]
fn test_load_config_partial_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(
        temp_file,
        r#"{{"max_pages": 12, "strategy": "best_first", "allowed_domains": ["acme.test"]}}"#
    )?;

    let config = load_config(temp_file.path().to_str())?;
    assert_eq!(config.max_pages, 12);
    assert_eq!(config.strategy, CrawlStrategy::BestFirst);
    assert_eq!(config.allowed_domains, Some(vec!["acme.test".to_string()]));
    assert_eq!(config.max_depth, CrawlConfig::default().max_depth);
    Ok(())
}

#[test]
fn test_load_config_invalid_json() {
    let mut temp_file = NamedTempFile::new().unwrap();
    writeln!(temp_file, "max_pages = 12").unwrap();

    let err = load_config(temp_file.path().to_str()).unwrap_err();
    assert!(err.to_string().contains("Invalid config file"));
}

#[test]
fn test_config_from_matches_flags_override_file() -> Result<(), Box<dyn std::error::Error>> {
    let mut temp_file = NamedTempFile::new()?;
    writeln!(temp_file, r#"{{"max_pages": 12, "max_depth": 1}}"#)?;
    let config_path = temp_file.path().to_str().unwrap_or_default().to_string();

    let matches = command_argument_builder().try_get_matches_from([
        "legalscout",
        "crawl",
        "-u",
        "https://acme.test",
        "--config",
        &config_path,
        "--max-pages",
        "30",
        "-s",
        "dfs",
        "--delay",
        "0.25",
        "--allowed-domain",
        "acme.test",
        "--allowed-domain",
        "acme-legal.test",
        "--ignore-robots",
        "--no-guess",
    ])?;
    let (_, sub) = matches.subcommand().unwrap();
    let config = config_from_matches(sub)?;

    assert_eq!(config.max_pages, 30);
    assert_eq!(config.max_depth, 1);
    assert_eq!(config.strategy, CrawlStrategy::Dfs);
    assert_eq!(config.delay_between_requests, 0.25);
    assert_eq!(
        config.allowed_domains,
        Some(vec!["acme.test".to_string(), "acme-legal.test".to_string()])
    );
    assert!(!config.respect_robots_txt);
    assert!(!config.guess_legal_paths);
    assert!(!config.follow_external_links);
    Ok(())
}

#[test]
fn test_config_from_matches_rejects_invalid_values() -> Result<(), Box<dyn std::error::Error>> {
    let matches = command_argument_builder().try_get_matches_from([
        "legalscout",
        "crawl",
        "-u",
        "https://acme.test",
        "--concurrency",
        "0",
    ])?;
    let (_, sub) = matches.subcommand().unwrap();

    assert!(config_from_matches(sub).is_err());
    Ok(())
}

#[test]
fn test_crawl_url_conflicts_with_hosts_file() {
    let result = command_argument_builder().try_get_matches_from([
        "legalscout",
        "crawl",
        "-u",
        "https://acme.test",
        "-H",
        "hosts.txt",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_crawl_rejects_unknown_format() {
    let result = command_argument_builder().try_get_matches_from([
        "legalscout",
        "crawl",
        "-u",
        "https://acme.test",
        "-f",
        "pdf",
    ]);
    assert!(result.is_err());
}

#[test]
fn test_global_flags_after_subcommand() -> Result<(), Box<dyn std::error::Error>> {
    let matches = command_argument_builder().try_get_matches_from([
        "legalscout",
        "score",
        "https://acme.test/privacy",
        "-q",
        "-vv",
    ])?;

    assert!(matches.get_flag("quiet"));
    assert_eq!(matches.get_count("verbose"), 2);
    Ok(())
}
