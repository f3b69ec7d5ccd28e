pub mod commands;
pub mod handlers;

pub use handlers::{config_from_matches, load_config, load_urls_from_file, load_urls_from_source, parse_url_line};
pub use legalscout_core::crawl::{CrawlOptions, CrawlProgressCallback, execute_crawl, extract_url_path, generate_crawl_report};
